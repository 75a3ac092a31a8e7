//! The access-control oracle the evaluator consults before reading any
//! attribute value out of an entry.

use crate::model::{AttributeDescription, Entry};

use super::bitmap::PermissionBitmap;
use super::engine::UserAcl;

/// The operation an access check is being made for. This crate only
/// ever performs SEARCH checks (evaluating a filter), but the oracle
/// contract names the other LDAP operations too, the way a real ACL
/// engine's `access_allowed` does, since `AclAccessOracle` wraps one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessOperation {
    Search,
    Compare,
    Read,
}

/// Decides whether the requesting subject may read a particular
/// attribute (optionally, a particular value of it) on an entry.
///
/// This is the "Access Oracle" collaborator: the filter evaluator never
/// decides access policy itself, it only ever asks. One attribute may
/// be partially visible (e.g. some values of a multi-valued attribute
/// denied, others allowed) — `allows_value` lets a caller check a
/// specific asserted value when the filter item carries one.
#[cfg_attr(test, mockall::automock)]
pub trait AccessOracle: Send + Sync {
    /// Whether the subject may see attribute `desc` on `entry` at all.
    fn allows_attribute(&self, op: AccessOperation, entry: &Entry, desc: &AttributeDescription) -> bool;

    /// Whether the subject may see this specific stored `value` of
    /// `desc` on `entry`. Default: same as the attribute-level check,
    /// for oracles with no value-level granularity.
    fn allows_value(
        &self,
        op: AccessOperation,
        entry: &Entry,
        desc: &AttributeDescription,
        _value: &[u8],
    ) -> bool {
        self.allows_attribute(op, entry, desc)
    }
}

/// An `AccessOracle` backed by a precompiled per-subject ACL, generalizing
/// the object+attribute permission model used elsewhere in this crate.
///
/// `required` is the object-level permission bit(s) a SEARCH needs to
/// even look at an entry at all; `object_type` names the attribute-ACL
/// bucket (the evaluator has no notion of object classes, so callers
/// that don't distinguish object types can pass a single fixed bucket
/// name, e.g. `"entry"`).
pub struct AclAccessOracle {
    acl: UserAcl,
    required: PermissionBitmap,
    object_type: String,
}

impl AclAccessOracle {
    pub fn new(acl: UserAcl, required: PermissionBitmap, object_type: impl Into<String>) -> Self {
        Self {
            acl,
            required,
            object_type: object_type.into(),
        }
    }

    /// An oracle that permits everything — useful for tests and for
    /// callers that have already performed access control upstream.
    pub fn allow_all(user_dn: impl Into<String>) -> Self {
        Self::new(UserAcl::superuser(user_dn.into()), PermissionBitmap::EMPTY, "entry")
    }
}

impl AccessOracle for AclAccessOracle {
    fn allows_attribute(&self, _op: AccessOperation, entry: &Entry, desc: &AttributeDescription) -> bool {
        self.acl.check_attribute(
            &entry.dn_raw,
            self.required,
            &self.object_type,
            "read",
            desc.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::attributes::{AttributeFilter, ObjectAttributeAcl};
    use crate::model::AttributeInstance;
    use std::collections::HashMap;

    fn entry() -> Entry {
        Entry::new(
            "uid=alice,ou=users,dc=example,dc=com",
            vec![AttributeInstance::from_strs("sn", &["Smith"])],
        )
    }

    #[test]
    fn allow_all_permits_everything() {
        let oracle = AclAccessOracle::allow_all("uid=admin,dc=example,dc=com");
        assert!(oracle.allows_attribute(AccessOperation::Search, &entry(), &AttributeDescription::new("sn")));
    }

    #[test]
    fn denies_attribute_outside_whitelist() {
        let mut global = HashMap::new();
        global.insert(
            "entry".to_string(),
            ObjectAttributeAcl::new(AttributeFilter::with_allowed(["cn"]), AttributeFilter::deny_all()),
        );
        let acl = UserAcl::new(
            "uid=bob,dc=example,dc=com".to_string(),
            PermissionBitmap::from_bit(0),
            PermissionBitmap::EMPTY,
            global,
            Vec::new(),
        );
        let oracle = AclAccessOracle::new(acl, PermissionBitmap::from_bit(0), "entry");

        assert!(!oracle.allows_attribute(AccessOperation::Search, &entry(), &AttributeDescription::new("sn")));
        assert!(oracle.allows_attribute(AccessOperation::Search, &entry(), &AttributeDescription::new("cn")));
    }

    /// An oracle can permit an attribute in general while denying one
    /// specific value of it; `allows_value` is the only hook that can
    /// see that distinction, so it has to be a separate mock call, not
    /// just a thin wrapper around `allows_attribute`.
    #[test]
    fn mocked_oracle_distinguishes_value_from_attribute_grant() {
        let mut mock = MockAccessOracle::new();
        mock.expect_allows_attribute().returning(|_, _, _| true);
        mock.expect_allows_value()
            .withf(|_, _, _, value: &[u8]| value == b"restricted")
            .returning(|_, _, _, _| false);
        mock.expect_allows_value()
            .withf(|_, _, _, value: &[u8]| value != b"restricted")
            .returning(|_, _, _, _| true);

        let sn = AttributeDescription::new("sn");
        assert!(mock.allows_attribute(AccessOperation::Search, &entry(), &sn));
        assert!(!mock.allows_value(AccessOperation::Search, &entry(), &sn, b"restricted"));
        assert!(mock.allows_value(AccessOperation::Search, &entry(), &sn, b"Smith"));
    }
}
