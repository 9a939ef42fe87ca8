#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the fedlogin application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod api;
pub mod error;
pub mod handlers;
pub mod login;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod utils;

// Test fixtures and mocks, shared with the integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use error::LoginError;
pub use login::{LoginOrchestrator, Outcome};
pub use models::{Account, Network, ProviderIdentity};
pub use oauth::ProviderRegistry;
pub use session::SessionManager;
pub use settings::LoginSettings;
