//! User preferences and the configuration gateway
//!
//! The poll loop pulls the current [`Preferences`] through the
//! [`ConfigGateway`] trait at startup and again whenever the gateway
//! signals a change.

mod model;
mod store;

pub use model::{Preferences, PreferencesUpdate};
pub use store::{ConfigGateway, PreferenceStore};
