//! SUBSTRINGS filter items: `(attr=initial*any*final)`.

use crate::access::AccessOperation;
use crate::errors::{LdapError, LdapResult};
use crate::filter::SubstringAssertion;
use crate::model::{Entry, TruthValue};

use super::EvalContext;

pub fn eval(ctx: &EvalContext, entry: &Entry, assertion: &SubstringAssertion) -> LdapResult<TruthValue> {
    if !ctx.access.allows_attribute(AccessOperation::Search, entry, &assertion.desc) {
        return Err(LdapError::InsufficientAccess);
    }

    let mut pending: Option<LdapError> = None;

    for attr in entry.find(ctx.schema, &assertion.desc) {
        if !ctx.access.allows_attribute(AccessOperation::Search, entry, &attr.desc) {
            pending = Some(LdapError::InsufficientAccess);
            continue;
        }
        let Some(rule) = ctx.schema.lookup(&attr.desc).and_then(|at| at.substring) else {
            pending = Some(LdapError::InappropriateMatching);
            continue;
        };
        for value in &attr.normalized {
            if rule.matches(
                value,
                assertion.initial.as_deref(),
                &assertion.any,
                assertion.final_.as_deref(),
            ) {
                return Ok(TruthValue::True);
            }
        }
    }

    match pending {
        Some(e) => Err(e),
        None => Ok(TruthValue::False),
    }
}
