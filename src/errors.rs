//! Error types for the filter evaluator.
//!
//! The taxonomy here is deliberately narrow: it is exactly the set of
//! `ldap_error` codes the specification says the evaluator actually
//! produces, not the full LDAP result-code space. `TRUE`/`FALSE`/`UNDEFINED`
//! are not errors at all — they're the `Ok` arm of [`LdapResult`].

use thiserror::Error;

/// Result type alias used throughout the evaluator.
pub type LdapResult<T> = std::result::Result<T, LdapError>;

/// Errors the filter evaluator can produce.
///
/// Every variant corresponds to one row of the error taxonomy table in
/// the specification. There is intentionally no catch-all `Internal`
/// variant: a collaborator that wants to report something else maps it
/// onto `Other`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LdapError {
    /// The subject is not permitted to SEARCH the attribute or value in
    /// question. Treated as UNDEFINED by the AND/OR combinators unless a
    /// dominating TRUE/FALSE is found elsewhere.
    #[error("insufficient access")]
    InsufficientAccess,

    /// The attribute type lacks the matching rule the filter operator
    /// requires (e.g. `(sn>=x)` on a type with no ORDERING rule). Treated
    /// as UNDEFINED by AND/OR, same as `InsufficientAccess`.
    #[error("inappropriate matching")]
    InappropriateMatching,

    /// A DN could not be parsed (only arises from `dnAttrs` walking).
    /// Surfaced immediately; never masked by AND/OR.
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),

    /// The filter tree contained a node kind the evaluator doesn't
    /// recognize, or a matching-rule assertion violated its own
    /// invariants (e.g. neither `desc` nor `rule` set). Surfaced
    /// immediately.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A collaborator (backend hook, value matcher) failed for a reason
    /// outside this taxonomy. Surfaced immediately.
    #[error("other: {0}")]
    Other(String),
}

impl LdapError {
    /// Whether this error behaves as UNDEFINED inside AND/OR combinators
    /// (masked by a dominating TRUE/FALSE) rather than surfacing
    /// immediately.
    pub fn is_undefined_like(&self) -> bool {
        matches!(
            self,
            LdapError::InsufficientAccess | LdapError::InappropriateMatching
        )
    }
}
