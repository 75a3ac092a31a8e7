//! AND/OR/NOT combinators and their three-valued "pending" semantics.

use crate::errors::LdapResult;
use crate::filter::Filter;
use crate::model::{Entry, TruthValue};

use super::{evaluate, EvalContext};

/// `(&(f1)(f2)...)`. Short-circuits on a dominating FALSE. Any other
/// non-TRUE result (UNDEFINED, or an access/matching error) is recorded
/// as the pending result and does *not* get overwritten by a later
/// TRUE — only a later FALSE (dominant) or another pending result can
/// change it. An empty list, or a list where every child was TRUE,
/// evaluates to TRUE.
pub fn eval_and(ctx: &EvalContext, entry: &Entry, children: &[Filter]) -> LdapResult<TruthValue> {
    let mut pending = TruthValue::True;
    for child in children {
        match evaluate(ctx, entry, child) {
            Ok(TruthValue::False) => return Ok(TruthValue::False),
            Ok(TruthValue::True) => {}
            Ok(TruthValue::Undefined) => pending = TruthValue::Undefined,
            Err(e) if e.is_undefined_like() => pending = TruthValue::Undefined,
            Err(e) => return Err(e),
        }
    }
    Ok(pending)
}

/// `(|(f1)(f2)...)`. Symmetric to [`eval_and`]: short-circuits on a
/// dominating TRUE, otherwise the last non-FALSE, non-TRUE result wins.
/// An empty list, or a list where every child was FALSE, evaluates to
/// FALSE.
pub fn eval_or(ctx: &EvalContext, entry: &Entry, children: &[Filter]) -> LdapResult<TruthValue> {
    let mut pending = TruthValue::False;
    for child in children {
        match evaluate(ctx, entry, child) {
            Ok(TruthValue::True) => return Ok(TruthValue::True),
            Ok(TruthValue::False) => {}
            Ok(TruthValue::Undefined) => pending = TruthValue::Undefined,
            Err(e) if e.is_undefined_like() => pending = TruthValue::Undefined,
            Err(e) => return Err(e),
        }
    }
    Ok(pending)
}

/// `(!(f))`. Flips TRUE/FALSE, passes UNDEFINED and errors through
/// unchanged.
pub fn eval_not(ctx: &EvalContext, entry: &Entry, child: &Filter) -> LdapResult<TruthValue> {
    evaluate(ctx, entry, child).map(TruthValue::negate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AclAccessOracle;
    use crate::model::AttributeDescription;
    use crate::schema::InMemorySchemaRegistry;

    fn ctx_and_entry() -> (InMemorySchemaRegistry, AclAccessOracle, Entry) {
        (
            InMemorySchemaRegistry::with_well_known(),
            AclAccessOracle::allow_all("uid=admin,dc=example,dc=com"),
            Entry::new("cn=alice,dc=example,dc=com", vec![]),
        )
    }

    #[test]
    fn and_of_empty_is_true() {
        let (schema, access, entry) = ctx_and_entry();
        let ctx = EvalContext::new(&schema, &access);
        assert_eq!(eval_and(&ctx, &entry, &[]).unwrap(), TruthValue::True);
    }

    #[test]
    fn or_of_empty_is_false() {
        let (schema, access, entry) = ctx_and_entry();
        let ctx = EvalContext::new(&schema, &access);
        assert_eq!(eval_or(&ctx, &entry, &[]).unwrap(), TruthValue::False);
    }

    #[test]
    fn and_short_circuits_on_false() {
        let (schema, access, entry) = ctx_and_entry();
        let ctx = EvalContext::new(&schema, &access);
        let children = vec![
            Filter::Computed(TruthValue::Undefined),
            Filter::Computed(TruthValue::False),
            Filter::Present(AttributeDescription::new("cn")),
        ];
        assert_eq!(eval_and(&ctx, &entry, &children).unwrap(), TruthValue::False);
    }

    #[test]
    fn and_keeps_last_pending_when_no_false() {
        let (schema, access, entry) = ctx_and_entry();
        let ctx = EvalContext::new(&schema, &access);
        let children = vec![
            Filter::Computed(TruthValue::Undefined),
            Filter::Computed(TruthValue::True),
        ];
        assert_eq!(eval_and(&ctx, &entry, &children).unwrap(), TruthValue::Undefined);
    }

    #[test]
    fn or_short_circuits_on_true() {
        let (schema, access, entry) = ctx_and_entry();
        let ctx = EvalContext::new(&schema, &access);
        let children = vec![Filter::Computed(TruthValue::Undefined), Filter::Computed(TruthValue::True)];
        assert_eq!(eval_or(&ctx, &entry, &children).unwrap(), TruthValue::True);
    }

    #[test]
    fn not_flips_true_and_false_only() {
        let (schema, access, entry) = ctx_and_entry();
        let ctx = EvalContext::new(&schema, &access);
        assert_eq!(
            eval_not(&ctx, &entry, &Filter::Computed(TruthValue::True)).unwrap(),
            TruthValue::False
        );
        assert_eq!(
            eval_not(&ctx, &entry, &Filter::Computed(TruthValue::Undefined)).unwrap(),
            TruthValue::Undefined
        );
    }
}
