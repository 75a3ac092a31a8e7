//! Extensible match (matching-rule assertion) filter items, including
//! the `dnAttrs` augmentation that also walks the entry's own RDNs.

use crate::access::AccessOperation;
use crate::dn::DistinguishedName;
use crate::errors::{LdapError, LdapResult};
use crate::filter::MatchingRuleAssertion;
use crate::matching::MatchingRule;
use crate::model::{AttributeDescription, AttributeInstance, Entry, TruthValue};
use crate::schema::SchemaRegistry;

use super::EvalContext;

fn resolve_rule<'a>(
    schema: &'a dyn SchemaRegistry,
    desc: &AttributeDescription,
    rule_name: Option<&str>,
) -> Option<&'a dyn MatchingRule> {
    match rule_name {
        Some(name) => schema.resolve_rule_by_name(name),
        None => schema.lookup(desc).and_then(|at| at.equality),
    }
}

/// Normalized values are only safe to compare under the attribute
/// type's own EQUALITY rule; a differently-named rule normalizes under
/// a different (or no) scheme, so extensible match falls back to raw
/// values whenever the asserted rule isn't that attribute's equality
/// rule.
fn values_for<'a>(schema: &dyn SchemaRegistry, desc: &AttributeDescription, rule: &dyn MatchingRule, attr: &'a AttributeInstance) -> &'a [Vec<u8>] {
    let is_equality_rule = schema
        .lookup(desc)
        .and_then(|at| at.equality)
        .is_some_and(|eq| eq.name() == rule.name());
    if is_equality_rule {
        &attr.normalized
    } else {
        &attr.raw
    }
}

fn bool_truth(b: bool) -> TruthValue {
    if b {
        TruthValue::True
    } else {
        TruthValue::False
    }
}

pub fn eval(ctx: &EvalContext, entry: &Entry, mra: &MatchingRuleAssertion) -> LdapResult<TruthValue> {
    if mra.desc.is_none() && mra.rule.is_none() {
        return Err(LdapError::ProtocolError(
            "matching rule assertion names neither an attribute nor a rule".to_string(),
        ));
    }

    match &mra.desc {
        Some(desc) => eval_desc_present(ctx, entry, desc, mra),
        None => eval_desc_absent(ctx, entry, mra),
    }
}

fn eval_desc_present(
    ctx: &EvalContext,
    entry: &Entry,
    desc: &AttributeDescription,
    mra: &MatchingRuleAssertion,
) -> LdapResult<TruthValue> {
    if !ctx.access.allows_value(AccessOperation::Search, entry, desc, &mra.value) {
        return Err(LdapError::InsufficientAccess);
    }

    if desc.as_str() == "entrydn" {
        let rule = resolve_rule(ctx.schema, desc, mra.rule.as_deref())
            .ok_or(LdapError::InappropriateMatching)?;
        return Ok(bool_truth(rule.matches(entry.dn_normalized.as_bytes(), &mra.value)));
    }

    let mut pending: Option<LdapError> = None;

    for attr in entry.find(ctx.schema, desc) {
        if attr.desc != *desc
            && !ctx.access.allows_value(AccessOperation::Search, entry, &attr.desc, &mra.value)
        {
            pending = Some(LdapError::InsufficientAccess);
            continue;
        }
        let Some(rule) = resolve_rule(ctx.schema, &attr.desc, mra.rule.as_deref()) else {
            pending = Some(LdapError::InappropriateMatching);
            continue;
        };
        for value in values_for(ctx.schema, &attr.desc, rule, attr) {
            if rule.matches(value, &mra.value) {
                return Ok(TruthValue::True);
            }
        }
    }

    if mra.dn_attrs {
        if let Some(result) = eval_dn_attrs(ctx, entry, Some(desc), mra)? {
            return Ok(result);
        }
    }

    match pending {
        Some(e) => Err(e),
        None => Ok(TruthValue::False),
    }
}

fn eval_desc_absent(ctx: &EvalContext, entry: &Entry, mra: &MatchingRuleAssertion) -> LdapResult<TruthValue> {
    let mut pending: Option<LdapError> = None;

    for attr in &entry.attributes {
        if ctx.schema.lookup(&attr.desc).is_none() {
            continue;
        }
        let Some(rule) = resolve_rule(ctx.schema, &attr.desc, mra.rule.as_deref()) else {
            continue;
        };
        if mra.rule.is_some() && !ctx.schema.mr_usable_with_at(rule, &attr.desc) {
            continue;
        }
        if !ctx.access.allows_value(AccessOperation::Search, entry, &attr.desc, &mra.value) {
            pending = Some(LdapError::InsufficientAccess);
            continue;
        }
        for value in values_for(ctx.schema, &attr.desc, rule, attr) {
            if rule.matches(value, &mra.value) {
                return Ok(TruthValue::True);
            }
        }
    }

    if mra.dn_attrs {
        if let Some(result) = eval_dn_attrs(ctx, entry, None, mra)? {
            return Ok(result);
        }
    }

    match pending {
        Some(e) => Err(e),
        None => Ok(TruthValue::False),
    }
}

/// Walks every AVA of every RDN in the entry's own DN, matching the
/// `dnAttrs` flag's "also consider the entry's name" semantics.
fn eval_dn_attrs(
    ctx: &EvalContext,
    entry: &Entry,
    desc: Option<&AttributeDescription>,
    mra: &MatchingRuleAssertion,
) -> LdapResult<Option<TruthValue>> {
    let dn = DistinguishedName::parse(&entry.dn_normalized)
        .map_err(|_| LdapError::InvalidSyntax(entry.dn_normalized.clone()))?;

    for ava in dn.all_avas() {
        let ava_desc = AttributeDescription::new(&ava.attr_type);

        if let Some(desc) = desc {
            if !ctx.schema.is_subtype(&ava_desc, desc) {
                continue;
            }
        } else if ctx.schema.lookup(&ava_desc).is_none() {
            continue;
        }

        let Some(rule) = resolve_rule(ctx.schema, &ava_desc, mra.rule.as_deref()) else {
            continue;
        };

        if desc.is_none() && mra.rule.is_some() && !ctx.schema.mr_usable_with_at(rule, &ava_desc) {
            continue;
        }

        if desc.is_none() && !ctx.access.allows_value(AccessOperation::Search, entry, &ava_desc, &mra.value) {
            continue;
        }

        if rule.matches(ava.attr_value.as_bytes(), &mra.value) {
            return Ok(Some(TruthValue::True));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AclAccessOracle;
    use crate::model::AttributeInstance;
    use crate::schema::InMemorySchemaRegistry;

    fn alice() -> Entry {
        Entry::new(
            "cn=Alice,ou=Engineering,dc=example,dc=com",
            vec![AttributeInstance::from_strs("cn", &["Alice"])],
        )
    }

    #[test]
    fn desc_present_matches_via_named_rule() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);

        let mra = MatchingRuleAssertion::new(
            Some(AttributeDescription::new("cn")),
            Some("caseIgnoreMatch".to_string()),
            b"alice".to_vec(),
        );
        assert_eq!(eval(&ctx, &alice(), &mra).unwrap(), TruthValue::True);
    }

    /// `numericStringMatch` isn't usable with `cn`'s `DirectoryString`
    /// syntax, so the `desc`-absent scan must skip it even though the
    /// byte comparison would otherwise have matched.
    #[test]
    fn desc_absent_skips_attribute_where_named_rule_is_not_usable() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);

        let mra = MatchingRuleAssertion::new(None, Some("numericStringMatch".to_string()), b"Alice".to_vec());
        assert_eq!(eval(&ctx, &alice(), &mra).unwrap(), TruthValue::False);
    }

    #[test]
    fn desc_absent_scans_every_attribute() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);

        let mra = MatchingRuleAssertion::new(None, None, b"alice".to_vec());
        assert_eq!(eval(&ctx, &alice(), &mra).unwrap(), TruthValue::True);
    }

    #[test]
    fn desc_present_entry_dn_compares_normalized_dn() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);

        let mra = MatchingRuleAssertion::new(
            Some(AttributeDescription::new("entryDN")),
            None,
            b"CN=ALICE,OU=ENGINEERING,DC=EXAMPLE,DC=COM".to_vec(),
        );
        assert_eq!(eval(&ctx, &alice(), &mra).unwrap(), TruthValue::True);

        let miss = MatchingRuleAssertion::new(Some(AttributeDescription::new("entryDN")), None, b"cn=bob,dc=example,dc=com".to_vec());
        assert_eq!(eval(&ctx, &alice(), &miss).unwrap(), TruthValue::False);
    }

    #[test]
    fn dn_attrs_walks_rdn_avas() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);

        let mra = MatchingRuleAssertion::new(Some(AttributeDescription::new("ou")), None, b"engineering".to_vec())
            .with_dn_attrs(true);
        assert_eq!(eval(&ctx, &alice(), &mra).unwrap(), TruthValue::True);
    }

    #[test]
    fn empty_assertion_is_protocol_error() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);
        let mra = MatchingRuleAssertion::new(None, None, b"x".to_vec());
        assert!(matches!(eval(&ctx, &alice(), &mra), Err(LdapError::ProtocolError(_))));
    }

    /// A rule other than the attribute's own equality rule must compare
    /// against raw values, not the ones normalized under equality.
    #[test]
    fn non_equality_rule_compares_raw_values() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);

        let entry = Entry::new(
            "uid=12345,dc=example,dc=com",
            vec![AttributeInstance::with_normalized(
                "cn",
                vec![b"1 234 5".to_vec()],
                vec![b"garbage-under-equality-normalization".to_vec()],
            )],
        );

        let mra = MatchingRuleAssertion::new(
            Some(AttributeDescription::new("cn")),
            Some("numericStringMatch".to_string()),
            b"12345".to_vec(),
        );
        assert_eq!(eval(&ctx, &entry, &mra).unwrap(), TruthValue::True);
    }

    /// Denies SEARCH on one fixed attribute description regardless of
    /// entry or value.
    struct DenyDescOracle {
        desc: &'static str,
    }

    impl crate::access::AccessOracle for DenyDescOracle {
        fn allows_attribute(&self, _op: AccessOperation, _entry: &Entry, desc: &AttributeDescription) -> bool {
            desc.as_str() != self.desc
        }

        fn allows_value(
            &self,
            _op: AccessOperation,
            _entry: &Entry,
            desc: &AttributeDescription,
            _value: &[u8],
        ) -> bool {
            desc.as_str() != self.desc
        }
    }

    #[test]
    fn denied_access_on_absent_attribute_is_insufficient_access_not_false() {
        let schema = InMemorySchemaRegistry::with_well_known();
        let access = DenyDescOracle { desc: "telephonenumber" };
        let ctx = EvalContext::new(&schema, &access);

        let mra = MatchingRuleAssertion::new(
            Some(AttributeDescription::new("telephoneNumber")),
            None,
            b"555-1234".to_vec(),
        );
        assert!(matches!(eval(&ctx, &alice(), &mra), Err(LdapError::InsufficientAccess)));
    }
}
