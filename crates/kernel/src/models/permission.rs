//! Service permissions and the typed permission set.
//!
//! The data API stores permissions as a list of names. The console turns that
//! list into a [`PermissionSet`] so visibility rules can ask questions like
//! "is this child permission effective?" without string matching.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A named capability flag on a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Permission {
    Email,
    Sms,
    Letter,
    InternationalSms,
    InboundSms,
    PrecompiledLetter,
    UploadDocument,
    EmailAuth,
    EditFolderPermissions,
}

impl Permission {
    /// Every known permission, in display order.
    pub const ALL: [Permission; 9] = [
        Permission::Email,
        Permission::Sms,
        Permission::Letter,
        Permission::InternationalSms,
        Permission::InboundSms,
        Permission::PrecompiledLetter,
        Permission::UploadDocument,
        Permission::EmailAuth,
        Permission::EditFolderPermissions,
    ];

    /// Permissions a platform admin can switch through the generic
    /// set-permission endpoint.
    pub const PLATFORM_ADMIN_TOGGLES: [Permission; 5] = [
        Permission::UploadDocument,
        Permission::PrecompiledLetter,
        Permission::InboundSms,
        Permission::EmailAuth,
        Permission::EditFolderPermissions,
    ];

    /// Wire name used by the data API and in URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::Email => "email",
            Permission::Sms => "sms",
            Permission::Letter => "letter",
            Permission::InternationalSms => "international_sms",
            Permission::InboundSms => "inbound_sms",
            Permission::PrecompiledLetter => "precompiled_letter",
            Permission::UploadDocument => "upload_document",
            Permission::EmailAuth => "email_auth",
            Permission::EditFolderPermissions => "edit_folder_permissions",
        }
    }

    /// The broader permission this one depends on, if any.
    ///
    /// A child permission has no effect while its parent is off.
    pub const fn parent(self) -> Option<Permission> {
        match self {
            Permission::InboundSms => Some(Permission::Sms),
            Permission::PrecompiledLetter => Some(Permission::Letter),
            _ => None,
        }
    }

    /// Whether the generic set-permission endpoint accepts this permission.
    pub fn is_platform_admin_toggle(self) -> bool {
        Self::PLATFORM_ADMIN_TOGGLES.contains(&self)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown permission name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// The set of permissions enabled on a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Create an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw membership, ignoring parent relations.
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Whether the parent of `permission` is present. True for top-level
    /// permissions.
    pub fn parent_enabled(&self, permission: Permission) -> bool {
        permission
            .parent()
            .is_none_or(|parent| self.contains(parent))
    }

    /// Membership that also requires the parent permission to be present.
    pub fn is_effective(&self, permission: Permission) -> bool {
        self.parent_enabled(permission) && self.contains(permission)
    }

    /// Set membership of `permission` to `on`.
    ///
    /// Returns `true` if the set changed.
    pub fn set(&mut self, permission: Permission, on: bool) -> bool {
        if on {
            self.0.insert(permission)
        } else {
            self.0.remove(&permission)
        }
    }

    /// Iterate in display order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire names, as the data API expects them.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Permission::as_str).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Unknown names are skipped so a newer data API cannot break page rendering.
impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut set = PermissionSet::new();
        for name in names {
            match name.parse::<Permission>() {
                Ok(permission) => {
                    set.set(permission, true);
                }
                Err(_) if name.is_empty() => {}
                Err(e) => tracing::warn!(error = %e, "ignoring unknown service permission"),
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>(), Ok(permission));
        }
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "carrier_pigeon".parse::<Permission>().unwrap_err();
        assert_eq!(err, UnknownPermission("carrier_pigeon".to_string()));
    }

    #[test]
    fn test_child_parents() {
        assert_eq!(Permission::InboundSms.parent(), Some(Permission::Sms));
        assert_eq!(
            Permission::PrecompiledLetter.parent(),
            Some(Permission::Letter)
        );
        assert_eq!(Permission::UploadDocument.parent(), None);
        assert_eq!(Permission::Sms.parent(), None);
    }

    #[test]
    fn test_platform_admin_toggles() {
        assert!(Permission::UploadDocument.is_platform_admin_toggle());
        assert!(Permission::EditFolderPermissions.is_platform_admin_toggle());
        assert!(!Permission::Sms.is_platform_admin_toggle());
        assert!(!Permission::Letter.is_platform_admin_toggle());
    }

    #[test]
    fn test_child_not_effective_without_parent() {
        let set: PermissionSet = [Permission::PrecompiledLetter].into_iter().collect();
        assert!(set.contains(Permission::PrecompiledLetter));
        assert!(!set.is_effective(Permission::PrecompiledLetter));
        assert!(!set.parent_enabled(Permission::PrecompiledLetter));
        assert!(set.parent_enabled(Permission::Letter));

        let set: PermissionSet = [Permission::Letter, Permission::PrecompiledLetter]
            .into_iter()
            .collect();
        assert!(set.is_effective(Permission::PrecompiledLetter));
    }

    #[test]
    fn test_set_reports_change() {
        let mut set = PermissionSet::new();
        assert!(set.set(Permission::Sms, true));
        assert!(!set.set(Permission::Sms, true));
        assert!(set.set(Permission::Sms, false));
        assert!(!set.set(Permission::Sms, false));
        assert!(set.is_empty());
    }

    #[test]
    fn test_deserialize_skips_unknown_names() {
        let set: PermissionSet =
            serde_json::from_str(r#"["sms", "letter", "teleport", ""]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(Permission::Sms));
        assert!(set.contains(Permission::Letter));
    }

    #[test]
    fn test_serialize_as_names() {
        let set: PermissionSet = [Permission::UploadDocument, Permission::Email]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["email","upload_document"]"#);
    }
}
