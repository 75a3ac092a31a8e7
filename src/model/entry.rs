//! Directory entries and their attribute values.

use super::attribute::AttributeDescription;

/// One attribute's values on an entry.
///
/// `raw` and `normalized` are parallel sequences of equal length: `raw[i]`
/// is the value as it was stored/submitted, `normalized[i]` is the same
/// value after the attribute type's EQUALITY rule's normalization step.
/// Matching rules compare against `normalized`; a few special-cased
/// descriptors (`hasSubordinates`) compare against `raw` directly since
/// they are never textual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInstance {
    pub desc: AttributeDescription,
    pub raw: Vec<Vec<u8>>,
    pub normalized: Vec<Vec<u8>>,
}

impl AttributeInstance {
    /// Builds an instance where normalization is the identity (raw ==
    /// normalized), the common case for test fixtures and for syntaxes
    /// with no case-folding.
    pub fn new(desc: impl Into<AttributeDescription>, values: Vec<Vec<u8>>) -> Self {
        let desc = desc.into();
        let normalized = values.clone();
        Self {
            desc,
            raw: values,
            normalized,
        }
    }

    /// Builds an instance from UTF-8 values, convenient for tests.
    pub fn from_strs(desc: impl Into<AttributeDescription>, values: &[&str]) -> Self {
        Self::new(
            desc,
            values.iter().map(|v| v.as_bytes().to_vec()).collect(),
        )
    }

    pub fn with_normalized(
        desc: impl Into<AttributeDescription>,
        raw: Vec<Vec<u8>>,
        normalized: Vec<Vec<u8>>,
    ) -> Self {
        debug_assert_eq!(raw.len(), normalized.len());
        Self {
            desc: desc.into(),
            raw,
            normalized,
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// A directory entry: a DN plus an unordered bag of attribute instances.
///
/// `dn_normalized` is the entry's DN after normalization (what the
/// original calls `e_nname`), used for `entryDN` equality and for the
/// `dnAttrs` walk; `dn_raw` is kept for completeness but the evaluator
/// itself only ever reads `dn_normalized`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub dn_raw: String,
    pub dn_normalized: String,
    pub attributes: Vec<AttributeInstance>,
}

impl Entry {
    pub fn new(dn: impl Into<String>, attributes: Vec<AttributeInstance>) -> Self {
        let dn = dn.into();
        let dn_normalized = dn.to_ascii_lowercase();
        Self {
            dn_raw: dn,
            dn_normalized,
            attributes,
        }
    }

    /// All attribute instances whose description is `desc` or a subtype
    /// of it, per the schema registry's subtype relation. This is the
    /// Rust counterpart of the original's `attrs_find`/subtype-walking
    /// loops that appear throughout `test_ava_filter`/`test_presence_filter`.
    pub fn find<'a>(
        &'a self,
        schema: &'a dyn crate::schema::SchemaRegistry,
        desc: &'a AttributeDescription,
    ) -> impl Iterator<Item = &'a AttributeInstance> + 'a {
        self.attributes
            .iter()
            .filter(move |a| schema.is_subtype(&a.desc, desc))
    }

    pub fn get_exact(&self, desc: &AttributeDescription) -> Option<&AttributeInstance> {
        self.attributes.iter().find(|a| &a.desc == desc)
    }
}
