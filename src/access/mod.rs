//! Access control: the object+attribute permission engine and the
//! `AccessOracle` collaborator the evaluator consults.

pub mod attributes;
pub mod bitmap;
pub mod compiler;
pub mod engine;
mod oracle;

pub use attributes::{AttributeFilter, ObjectAttributeAcl};
pub use bitmap::PermissionBitmap;
pub use compiler::{compile, AclRow, AttrRuleRow};
pub use engine::{AclVerdict, ScopedEntry, UserAcl};
pub use oracle::{AccessOperation, AccessOracle, AclAccessOracle};
