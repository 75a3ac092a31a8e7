//! Value matchers: the comparators the evaluator consults by name via
//! the schema registry (`caseIgnoreMatch`, `distinguishedNameMatch`, ...).

pub mod rules;

use std::cmp::Ordering;

use crate::model::AttributeSyntax;

/// A named comparator usable for EQUALITY, ORDERING, and APPROX filter
/// items. `compare` returns the strcmp-style ordering the spec's
/// `value_match` abstraction describes; equality is `compare(..) ==
/// Ordering::Equal`.
pub trait MatchingRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn compare(&self, stored: &[u8], asserted: &[u8]) -> Ordering;

    fn matches(&self, stored: &[u8], asserted: &[u8]) -> bool {
        self.compare(stored, asserted) == Ordering::Equal
    }

    /// The attribute syntaxes this rule is defined over, per RFC 4517's
    /// per-rule `SYNTAX` clause. Backs the Schema Registry's
    /// `mr_usable_with_at(rule, attr_type)` contract (spec §6): a named
    /// rule in an extensible-match filter item is only considered for
    /// an attribute whose syntax it was defined for.
    fn applicable_syntaxes(&self) -> &'static [AttributeSyntax];
}

/// A named comparator for SUBSTRINGS filter items.
pub trait SubstringRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// `initial`/`final_` are optional anchored fragments; `any` is an
    /// ordered list of fragments that must all appear, in order,
    /// somewhere between the anchors.
    fn matches(&self, stored: &[u8], initial: Option<&[u8]>, any: &[Vec<u8>], final_: Option<&[u8]>) -> bool;
}
