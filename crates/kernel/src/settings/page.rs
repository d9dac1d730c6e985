//! Settings page model: which toggle rows and action buttons a caller sees.
//!
//! Everything here is a pure function of a [`Service`] snapshot and the
//! caller's [`Role`], so the rules are tested without HTTP or templates.

use serde::Serialize;

use super::urls;
use crate::models::{Permission, Role, Service};

/// One row of the settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleRow {
    pub label: &'static str,
    /// "On" or "Off".
    pub current_state_text: &'static str,
    /// Where the "Change" link points. `None` for callers who may not change it.
    pub action_url: Option<String>,
    pub visible: bool,
}

impl ToggleRow {
    /// Row text as a reader sees it, e.g. `Live Off Change`.
    pub fn text(&self) -> String {
        match self.action_url {
            Some(_) => format!("{} {} Change", self.label, self.current_state_text),
            None => format!("{} {}", self.label, self.current_state_text),
        }
    }
}

/// Archive / suspend / resume button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub label: &'static str,
    pub url: String,
}

/// Everything the settings template needs.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsPage {
    pub service: Service,
    pub rows: Vec<ToggleRow>,
    pub buttons: Vec<ActionButton>,
    pub can_change: bool,
}

impl SettingsPage {
    /// Build the page for `service` as seen by a caller with `role`.
    pub fn build(service: &Service, role: Role) -> Self {
        Self {
            service: service.clone(),
            rows: toggle_rows(service, role),
            buttons: action_buttons(service, role),
            can_change: role == Role::PlatformAdmin,
        }
    }

    /// Rows that are rendered, in order.
    pub fn visible_rows(&self) -> impl Iterator<Item = &ToggleRow> {
        self.rows.iter().filter(|row| row.visible)
    }

    /// Find a visible row by label.
    pub fn row(&self, label: &str) -> Option<&ToggleRow> {
        self.visible_rows().find(|row| row.label == label)
    }
}

/// Human-readable name of a permission toggle.
pub fn toggle_label(permission: Permission) -> &'static str {
    match permission {
        Permission::PrecompiledLetter => "Send precompiled letters",
        Permission::UploadDocument => "Uploading documents",
        Permission::InboundSms => "Receive inbound SMS",
        Permission::EmailAuth => "Email authentication",
        Permission::EditFolderPermissions => "Edit folder permissions",
        other => other.as_str(),
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "On" } else { "Off" }
}

/// Compute the ordered toggle rows.
///
/// Child permission rows are hidden while the parent permission is off.
/// Non-admin callers get the same rows with no action URLs.
pub fn toggle_rows(service: &Service, role: Role) -> Vec<ToggleRow> {
    let id = service.id;
    let permissions = &service.permissions;
    let inbound_on = permissions.is_effective(Permission::InboundSms);

    let rows = [
        ToggleRow {
            label: "Live",
            current_state_text: on_off(service.is_live()),
            action_url: Some(urls::switch_live(id)),
            visible: true,
        },
        ToggleRow {
            label: toggle_label(Permission::PrecompiledLetter),
            current_state_text: on_off(permissions.is_effective(Permission::PrecompiledLetter)),
            action_url: Some(urls::set_permission(id, Permission::PrecompiledLetter)),
            visible: permissions.parent_enabled(Permission::PrecompiledLetter),
        },
        ToggleRow {
            label: toggle_label(Permission::UploadDocument),
            current_state_text: on_off(permissions.contains(Permission::UploadDocument)),
            action_url: Some(urls::switch_upload_document(id)),
            visible: true,
        },
        ToggleRow {
            label: toggle_label(Permission::InboundSms),
            current_state_text: on_off(inbound_on),
            action_url: Some(if inbound_on {
                urls::set_permission(id, Permission::InboundSms)
            } else {
                urls::set_inbound_number(id)
            }),
            visible: permissions.parent_enabled(Permission::InboundSms),
        },
        ToggleRow {
            label: toggle_label(Permission::EmailAuth),
            current_state_text: on_off(permissions.contains(Permission::EmailAuth)),
            action_url: Some(urls::set_permission(id, Permission::EmailAuth)),
            visible: true,
        },
        ToggleRow {
            label: toggle_label(Permission::EditFolderPermissions),
            current_state_text: on_off(permissions.contains(Permission::EditFolderPermissions)),
            action_url: Some(urls::set_permission(id, Permission::EditFolderPermissions)),
            visible: true,
        },
    ];

    rows.into_iter()
        .map(|mut row| {
            if role != Role::PlatformAdmin {
                row.action_url = None;
            }
            row
        })
        .collect()
}

/// Compute the action buttons.
///
/// An active service can be archived or suspended; an inactive one can only
/// be resumed. Non-admin callers get no buttons.
pub fn action_buttons(service: &Service, role: Role) -> Vec<ActionButton> {
    if role != Role::PlatformAdmin {
        return Vec::new();
    }

    let id = service.id;
    if service.active {
        vec![
            ActionButton {
                label: "Archive service",
                url: urls::archive(id),
            },
            ActionButton {
                label: "Suspend service",
                url: urls::suspend(id),
            },
        ]
    } else {
        vec![ActionButton {
            label: "Resume service",
            url: urls::resume(id),
        }]
    }
}
