//! Notify admin console library
//!
//! Service settings rendering, the platform-admin permission mutator, and the
//! HTTP server around them. The `notify-admin` binary wires these together.

pub mod config;
pub mod csrf;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod provider;
pub mod routes;
pub mod server;
pub mod session;
pub mod settings;
pub mod state;
pub mod theme;

pub use config::Config;
pub use state::AppState;
