//! The filter evaluator: dispatches a [`Filter`](crate::filter::Filter)
//! node to the leaf evaluator or combinator matching its kind.

mod ava;
mod combinators;
mod extensible;
mod presence;
mod substrings;

use tracing::trace;

use crate::access::AccessOracle;
use crate::backend::BackendHook;
use crate::errors::LdapResult;
use crate::filter::Filter;
use crate::model::{Entry, TruthValue};
use crate::schema::SchemaRegistry;

/// The collaborators an evaluation run needs: schema/matching-rule
/// lookups, the access-control oracle, and an optional backend hook for
/// descriptors the entry alone can't answer.
pub struct EvalContext<'a> {
    pub schema: &'a dyn SchemaRegistry,
    pub access: &'a dyn AccessOracle,
    pub backend: Option<&'a dyn BackendHook>,
}

impl<'a> EvalContext<'a> {
    pub fn new(schema: &'a dyn SchemaRegistry, access: &'a dyn AccessOracle) -> Self {
        Self {
            schema,
            access,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: &'a dyn BackendHook) -> Self {
        self.backend = Some(backend);
        self
    }
}

/// Evaluates `filter` against `entry`, returning TRUE/FALSE/UNDEFINED
/// per RFC 4511 §4.5.1, or an error for malformed filters and conditions
/// the combinators don't mask (see [`crate::errors::LdapError`]).
pub fn evaluate(ctx: &EvalContext, entry: &Entry, filter: &Filter) -> LdapResult<TruthValue> {
    trace!(?filter, dn = %entry.dn_normalized, "evaluating filter node");
    match filter {
        Filter::Computed(tv) => Ok(*tv),
        Filter::Equality(ava) => ava::eval(ctx, entry, ava::AvaKind::Equality, ava),
        Filter::GreaterOrEqual(ava) => ava::eval(ctx, entry, ava::AvaKind::GreaterOrEqual, ava),
        Filter::LessOrEqual(ava) => ava::eval(ctx, entry, ava::AvaKind::LessOrEqual, ava),
        Filter::Approx(ava) => ava::eval(ctx, entry, ava::AvaKind::Approx, ava),
        Filter::Present(desc) => presence::eval(ctx, entry, desc),
        Filter::Substrings(assertion) => substrings::eval(ctx, entry, assertion),
        Filter::And(children) => combinators::eval_and(ctx, entry, children),
        Filter::Or(children) => combinators::eval_or(ctx, entry, children),
        Filter::Not(child) => combinators::eval_not(ctx, entry, child),
        Filter::Extensible(mra) => extensible::eval(ctx, entry, mra),
    }
}

pub use ava::AvaKind;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AclAccessOracle;
    use crate::filter::AttributeAssertion;
    use crate::model::AttributeInstance;
    use crate::schema::InMemorySchemaRegistry;

    /// Installs a real subscriber so `evaluate`'s `trace!` call runs
    /// through an actual layer instead of the default no-op one.
    fn init_test_tracing() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn evaluate_dispatches_under_a_live_subscriber() {
        init_test_tracing();

        let schema = InMemorySchemaRegistry::with_well_known();
        let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        let ctx = EvalContext::new(&schema, &access);
        let entry = Entry::new(
            "cn=Alice,dc=example,dc=com",
            vec![AttributeInstance::from_strs("cn", &["Alice"])],
        );
        let filter = Filter::Equality(AttributeAssertion::new("cn", b"alice".to_vec()));

        assert_eq!(evaluate(&ctx, &entry, &filter).unwrap(), TruthValue::True);
    }
}
