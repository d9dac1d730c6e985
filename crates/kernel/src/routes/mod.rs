//! HTTP route handlers.

pub mod health;
pub mod helpers;
pub mod metrics;
pub mod service_settings;
