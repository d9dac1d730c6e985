//! Records supplied by the data API.

pub mod inbound_number;
pub mod permission;
pub mod service;
pub mod user;

pub use inbound_number::InboundNumber;
pub use permission::{Permission, PermissionSet, UnknownPermission};
pub use service::Service;
pub use user::{Role, User};
