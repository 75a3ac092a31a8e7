//! Schema registry: attribute-type metadata and subtype resolution.

use std::collections::HashMap;

use crate::matching::{MatchingRule, SubstringRule};
use crate::model::{AttributeDescription, AttributeSyntax};

/// One attribute type's schema entry: its syntax, optional superior
/// type (for subtyping, e.g. `cn` IS-A `name`), and the matching rules
/// usable with it.
#[derive(Clone)]
pub struct AttributeType {
    pub desc: AttributeDescription,
    pub syntax: AttributeSyntax,
    pub superior: Option<AttributeDescription>,
    pub equality: Option<&'static dyn MatchingRule>,
    pub ordering: Option<&'static dyn MatchingRule>,
    pub substring: Option<&'static dyn SubstringRule>,
    pub approx: Option<&'static dyn MatchingRule>,
}

impl std::fmt::Debug for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeType")
            .field("desc", &self.desc)
            .field("syntax", &self.syntax)
            .field("superior", &self.superior)
            .finish()
    }
}

/// Resolves attribute-type metadata and the subtype relation.
///
/// This is the Rust trait counterpart of the "Schema Registry"
/// collaborator: a real deployment backs it with schema LDIF parsed at
/// startup (explicitly out of scope here); this crate ships one
/// in-memory implementation pre-seeded with the handful of attribute
/// types the end-to-end scenarios and unit tests exercise.
pub trait SchemaRegistry: Send + Sync {
    fn lookup(&self, desc: &AttributeDescription) -> Option<&AttributeType>;

    /// Whether `candidate` is `desc` itself or a (possibly indirect)
    /// subtype of it, walking `superior` chains. Reflexive: every
    /// attribute type is a subtype of itself.
    fn is_subtype(&self, candidate: &AttributeDescription, desc: &AttributeDescription) -> bool {
        if candidate == desc {
            return true;
        }
        let mut current = candidate.clone();
        loop {
            match self.lookup(&current).and_then(|at| at.superior.clone()) {
                Some(superior) if &superior == desc => return true,
                Some(superior) => current = superior,
                None => return false,
            }
        }
    }

    /// Resolves a matching rule named explicitly in an extensible-match
    /// filter item (`(attr:caseExactMatch:=value)`), independent of any
    /// particular attribute type.
    fn resolve_rule_by_name(&self, name: &str) -> Option<&dyn MatchingRule>;

    /// Whether `rule` may be applied to `desc`'s attribute type: the
    /// `mr_usable_with_at` collaborator contract (spec §6), used by the
    /// extensible-match evaluator's `desc`-absent scan to skip
    /// attributes the named rule was never defined over (e.g.
    /// `numericStringMatch` against a `DirectoryString` attribute).
    /// Unknown attribute types are conservatively unusable.
    fn mr_usable_with_at(&self, rule: &dyn MatchingRule, desc: &AttributeDescription) -> bool {
        match self.lookup(desc) {
            Some(at) => rule.applicable_syntaxes().contains(&at.syntax),
            None => false,
        }
    }
}

/// A simple, pre-seeded in-memory schema registry.
pub struct InMemorySchemaRegistry {
    types: HashMap<AttributeDescription, AttributeType>,
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    pub fn register(&mut self, at: AttributeType) -> &mut Self {
        self.types.insert(at.desc.clone(), at);
        self
    }

    /// Builds the registry preloaded with the well-known attribute types
    /// the specification's end-to-end scenarios rely on: `name` as a
    /// common superior of `cn`/`sn`/`ou`/`o`, plus `c`, `uid`, `mail`,
    /// `telephoneNumber`, `objectClass`, and the three well-known
    /// descriptors `entryDN`, `hasSubordinates`, `subschemaSubentry`.
    pub fn with_well_known() -> Self {
        use crate::matching::rules;

        let mut reg = Self::new();
        reg.register(AttributeType {
            desc: AttributeDescription::new("name"),
            syntax: AttributeSyntax::DirectoryString,
            superior: None,
            equality: Some(&rules::CASE_IGNORE),
            ordering: Some(&rules::CASE_IGNORE_ORDERING),
            substring: Some(&rules::CASE_IGNORE_SUBSTRINGS),
            approx: Some(&rules::APPROX),
        });
        for sub in ["cn", "sn", "ou", "o"] {
            reg.register(AttributeType {
                desc: AttributeDescription::new(sub),
                syntax: AttributeSyntax::DirectoryString,
                superior: Some(AttributeDescription::new("name")),
                equality: Some(&rules::CASE_IGNORE),
                ordering: Some(&rules::CASE_IGNORE_ORDERING),
                substring: Some(&rules::CASE_IGNORE_SUBSTRINGS),
                approx: Some(&rules::APPROX),
            });
        }
        reg.register(AttributeType {
            desc: AttributeDescription::new("c"),
            syntax: AttributeSyntax::DirectoryString,
            superior: None,
            equality: Some(&rules::CASE_IGNORE),
            ordering: Some(&rules::CASE_IGNORE_ORDERING),
            substring: Some(&rules::CASE_IGNORE_SUBSTRINGS),
            approx: None,
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("uid"),
            syntax: AttributeSyntax::Ia5String,
            superior: None,
            equality: Some(&rules::CASE_EXACT),
            ordering: Some(&rules::CASE_EXACT_ORDERING),
            substring: Some(&rules::CASE_EXACT_SUBSTRINGS),
            approx: None,
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("mail"),
            syntax: AttributeSyntax::Ia5String,
            superior: None,
            equality: Some(&rules::CASE_IGNORE),
            ordering: None,
            substring: Some(&rules::CASE_IGNORE_SUBSTRINGS),
            approx: None,
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("telephonenumber"),
            syntax: AttributeSyntax::DirectoryString,
            superior: None,
            equality: Some(&rules::CASE_IGNORE),
            ordering: None,
            substring: Some(&rules::CASE_IGNORE_SUBSTRINGS),
            approx: None,
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("objectclass"),
            syntax: AttributeSyntax::DirectoryString,
            superior: None,
            equality: Some(&rules::CASE_IGNORE),
            ordering: None,
            substring: None,
            approx: None,
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("entrydn"),
            syntax: AttributeSyntax::DistinguishedName,
            superior: None,
            equality: Some(&rules::DISTINGUISHED_NAME),
            ordering: None,
            substring: None,
            approx: Some(&rules::DISTINGUISHED_NAME),
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("hassubordinates"),
            syntax: AttributeSyntax::Boolean,
            superior: None,
            equality: Some(&rules::CASE_IGNORE),
            ordering: None,
            substring: None,
            approx: Some(&rules::CASE_IGNORE),
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("subschemasubentry"),
            syntax: AttributeSyntax::DistinguishedName,
            superior: None,
            equality: Some(&rules::DISTINGUISHED_NAME),
            ordering: None,
            substring: None,
            approx: None,
        });
        reg.register(AttributeType {
            desc: AttributeDescription::new("uidnumber"),
            syntax: AttributeSyntax::NumericString,
            superior: None,
            equality: Some(&rules::NUMERIC_STRING),
            ordering: Some(&rules::NUMERIC_STRING_ORDERING),
            substring: None,
            approx: None,
        });
        reg
    }
}

impl Default for InMemorySchemaRegistry {
    fn default() -> Self {
        Self::with_well_known()
    }
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn lookup(&self, desc: &AttributeDescription) -> Option<&AttributeType> {
        self.types.get(desc)
    }

    fn resolve_rule_by_name(&self, name: &str) -> Option<&dyn MatchingRule> {
        use crate::matching::rules;

        match name.to_ascii_lowercase().as_str() {
            "caseignorematch" => Some(&rules::CASE_IGNORE),
            "caseignoreorderingmatch" => Some(&rules::CASE_IGNORE_ORDERING),
            "caseexactmatch" => Some(&rules::CASE_EXACT),
            "caseexactorderingmatch" => Some(&rules::CASE_EXACT_ORDERING),
            "distinguishednamematch" => Some(&rules::DISTINGUISHED_NAME),
            "numericstringmatch" => Some(&rules::NUMERIC_STRING),
            "numericstringorderingmatch" => Some(&rules::NUMERIC_STRING_ORDERING),
            "approxmatch" => Some(&rules::APPROX),
            _ => None,
        }
    }
}
