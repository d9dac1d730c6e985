//! URL builders for the service settings routes.

use uuid::Uuid;

use crate::models::Permission;

pub fn settings(service_id: Uuid) -> String {
    format!("/services/{service_id}/settings")
}

pub fn set_permission(service_id: Uuid, permission: Permission) -> String {
    format!("/services/{service_id}/permissions/{permission}")
}

pub fn switch_live(service_id: Uuid) -> String {
    format!("/services/{service_id}/switch-live")
}

pub fn switch_upload_document(service_id: Uuid) -> String {
    format!("/services/{service_id}/switch-upload-document")
}

pub fn set_inbound_number(service_id: Uuid) -> String {
    format!("/services/{service_id}/set-inbound-number")
}

pub fn archive(service_id: Uuid) -> String {
    format!("/services/{service_id}/archive")
}

pub fn suspend(service_id: Uuid) -> String {
    format!("/services/{service_id}/suspend")
}

pub fn resume(service_id: Uuid) -> String {
    format!("/services/{service_id}/resume")
}
