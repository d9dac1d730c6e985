//! Service settings: the page model and the platform-admin mutations.

pub mod mutator;
pub mod page;
pub mod urls;

pub use page::{ActionButton, SettingsPage, ToggleRow, toggle_label};
