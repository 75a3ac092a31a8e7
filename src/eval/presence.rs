//! PRESENT filter items: `(attr=*)`.

use crate::access::AccessOperation;
use crate::errors::{LdapError, LdapResult};
use crate::model::{AttributeDescription, Entry, TruthValue};

use super::EvalContext;

pub fn eval(ctx: &EvalContext, entry: &Entry, desc: &AttributeDescription) -> LdapResult<TruthValue> {
    match desc.as_str() {
        "hassubordinates" => {
            if !ctx.access.allows_attribute(AccessOperation::Search, entry, desc) {
                return Err(LdapError::InsufficientAccess);
            }
            // Per design: a backend hook being installed at all means
            // subordinates are knowable, not that this entry has any.
            Ok(if ctx.backend.is_some() { TruthValue::True } else { TruthValue::False })
        }
        "entrydn" | "subschemasubentry" => {
            if !ctx.access.allows_attribute(AccessOperation::Search, entry, desc) {
                return Err(LdapError::InsufficientAccess);
            }
            // Both are well-known operational attributes every entry
            // carries; there is no schema-loading subsystem here to
            // say otherwise.
            Ok(TruthValue::True)
        }
        _ => {
            if !ctx.access.allows_attribute(AccessOperation::Search, entry, desc) {
                return Err(LdapError::InsufficientAccess);
            }

            let mut pending: Option<LdapError> = None;
            for attr in entry.find(ctx.schema, desc) {
                if ctx.access.allows_attribute(AccessOperation::Search, entry, &attr.desc) {
                    return Ok(TruthValue::True);
                }
                pending = Some(LdapError::InsufficientAccess);
            }
            match pending {
                Some(e) => Err(e),
                None => Ok(TruthValue::False),
            }
        }
    }
}
