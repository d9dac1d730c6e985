//! Console user as supplied by the data API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller role for settings mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    PlatformAdmin,
    Normal,
}

/// User record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email_address: String,
    #[serde(default)]
    pub platform_admin: bool,
    /// Services the user is a team member of.
    #[serde(default)]
    pub services: Vec<Uuid>,
}

impl User {
    pub fn role(&self) -> Role {
        if self.platform_admin {
            Role::PlatformAdmin
        } else {
            Role::Normal
        }
    }

    pub fn is_platform_admin(&self) -> bool {
        self.role() == Role::PlatformAdmin
    }

    /// Check if this user may view the given service.
    ///
    /// Platform admins can view every service; everyone else only the
    /// services they belong to.
    pub fn belongs_to_service(&self, service_id: Uuid) -> bool {
        self.is_platform_admin() || self.services.contains(&service_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(platform_admin: bool, services: Vec<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            email_address: "test@user.gov.uk".to_string(),
            platform_admin,
            services,
        }
    }

    #[test]
    fn test_role() {
        assert_eq!(user(true, vec![]).role(), Role::PlatformAdmin);
        assert_eq!(user(false, vec![]).role(), Role::Normal);
    }

    #[test]
    fn test_platform_admin_belongs_everywhere() {
        assert!(user(true, vec![]).belongs_to_service(Uuid::new_v4()));
    }

    #[test]
    fn test_team_member_belongs_to_own_service_only() {
        let service_id = Uuid::new_v4();
        let member = user(false, vec![service_id]);
        assert!(member.belongs_to_service(service_id));
        assert!(!member.belongs_to_service(Uuid::new_v4()));
    }
}
