//! EQUALITY / GREATER-OR-EQUAL / LESS-OR-EQUAL / APPROX filter items.

use std::cmp::Ordering;

use crate::access::AccessOperation;
use crate::errors::{LdapError, LdapResult};
use crate::filter::AttributeAssertion;
use crate::matching::MatchingRule;
use crate::model::{Entry, TruthValue};
use crate::schema::AttributeType;

use super::EvalContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvaKind {
    Equality,
    GreaterOrEqual,
    LessOrEqual,
    Approx,
}

fn resolve_rule<'a>(kind: AvaKind, at: &'a AttributeType) -> Option<&'a dyn MatchingRule> {
    match kind {
        AvaKind::Equality => at.equality,
        AvaKind::GreaterOrEqual | AvaKind::LessOrEqual => at.ordering,
        AvaKind::Approx => at.approx.or(at.equality),
    }
}

fn hits(kind: AvaKind, cmp: Ordering) -> bool {
    match kind {
        AvaKind::Equality | AvaKind::Approx => cmp == Ordering::Equal,
        AvaKind::GreaterOrEqual => cmp != Ordering::Less,
        AvaKind::LessOrEqual => cmp != Ordering::Greater,
    }
}

pub fn eval(ctx: &EvalContext, entry: &Entry, kind: AvaKind, ava: &AttributeAssertion) -> LdapResult<TruthValue> {
    match ava.desc.as_str() {
        "hassubordinates" => eval_has_subordinates(ctx, entry, kind, ava),
        "entrydn" => eval_entry_dn(ctx, entry, kind, ava),
        _ => eval_general(ctx, entry, kind, ava),
    }
}

fn eval_has_subordinates(
    ctx: &EvalContext,
    entry: &Entry,
    kind: AvaKind,
    ava: &AttributeAssertion,
) -> LdapResult<TruthValue> {
    if !ctx.access.allows_value(AccessOperation::Search, entry, &ava.desc, &ava.value) {
        return Err(LdapError::InsufficientAccess);
    }
    if !matches!(kind, AvaKind::Equality | AvaKind::Approx) {
        return Err(LdapError::InappropriateMatching);
    }
    let has_subordinates = match ctx.backend.and_then(|b| b.has_subordinates(entry)) {
        Some(v) => v,
        None => return Ok(TruthValue::Undefined),
    };
    let canonical = if has_subordinates { b"TRUE".as_slice() } else { b"FALSE".as_slice() };
    Ok(bool_truth(ava.value.eq_ignore_ascii_case(canonical)))
}

fn eval_entry_dn(ctx: &EvalContext, entry: &Entry, kind: AvaKind, ava: &AttributeAssertion) -> LdapResult<TruthValue> {
    if !ctx.access.allows_value(AccessOperation::Search, entry, &ava.desc, &ava.value) {
        return Err(LdapError::InsufficientAccess);
    }
    if !matches!(kind, AvaKind::Equality | AvaKind::Approx) {
        return Err(LdapError::InappropriateMatching);
    }
    let rule = &crate::matching::rules::DISTINGUISHED_NAME;
    Ok(bool_truth(rule.matches(entry.dn_normalized.as_bytes(), &ava.value)))
}

fn eval_general(ctx: &EvalContext, entry: &Entry, kind: AvaKind, ava: &AttributeAssertion) -> LdapResult<TruthValue> {
    if !ctx.access.allows_value(AccessOperation::Search, entry, &ava.desc, &ava.value) {
        return Err(LdapError::InsufficientAccess);
    }

    let mut pending: Option<LdapError> = None;

    for attr in entry.find(ctx.schema, &ava.desc) {
        if attr.desc != ava.desc
            && !ctx.access.allows_value(AccessOperation::Search, entry, &attr.desc, &ava.value)
        {
            pending = Some(LdapError::InsufficientAccess);
            continue;
        }
        let Some(at) = ctx.schema.lookup(&attr.desc) else {
            pending = Some(LdapError::InappropriateMatching);
            continue;
        };
        let Some(rule) = resolve_rule(kind, at) else {
            pending = Some(LdapError::InappropriateMatching);
            continue;
        };
        for value in &attr.normalized {
            if hits(kind, rule.compare(value, &ava.value)) {
                return Ok(TruthValue::True);
            }
        }
    }

    match pending {
        Some(e) => Err(e),
        None => Ok(TruthValue::False),
    }
}

fn bool_truth(b: bool) -> TruthValue {
    if b {
        TruthValue::True
    } else {
        TruthValue::False
    }
}
