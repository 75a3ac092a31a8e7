//! # LDAP Search-Filter Evaluator
//!
//! Evaluates a parsed LDAPv3 search filter against a directory entry,
//! producing RFC 4511 §4.5.1's three-valued TRUE/FALSE/UNDEFINED result.
//!
//! This crate provides:
//! - The filter AST (`filter`) and core data model (`model`)
//! - A schema/matching-rule registry (`schema`, `matching`)
//! - Distinguished Name parsing (`dn`)
//! - An access-control oracle built on an object+attribute permission
//!   engine (`access`)
//! - The evaluator itself (`eval::evaluate`)
//!
//! ## Example
//!
//! ```rust
//! use ldap_filter_eval::access::AclAccessOracle;
//! use ldap_filter_eval::eval::{evaluate, EvalContext};
//! use ldap_filter_eval::filter::{AttributeAssertion, Filter};
//! use ldap_filter_eval::model::{AttributeInstance, Entry, TruthValue};
//! use ldap_filter_eval::schema::InMemorySchemaRegistry;
//!
//! let schema = InMemorySchemaRegistry::with_well_known();
//! let access = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
//! let ctx = EvalContext::new(&schema, &access);
//!
//! let entry = Entry::new(
//!     "cn=Alice,dc=example,dc=com",
//!     vec![AttributeInstance::from_strs("cn", &["Alice"])],
//! );
//! let filter = Filter::Equality(AttributeAssertion::new("cn", b"alice".to_vec()));
//!
//! assert_eq!(evaluate(&ctx, &entry, &filter).unwrap(), TruthValue::True);
//! ```

pub mod access;
pub mod backend;
pub mod dn;
pub mod errors;
pub mod eval;
pub mod filter;
pub mod matching;
pub mod model;
pub mod schema;

pub use errors::{LdapError, LdapResult};
pub use eval::{evaluate, EvalContext};
pub use model::TruthValue;

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
