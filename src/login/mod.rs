//! Login flows
//!
//! - [`orchestrator`] - Routes provider requests and builds the canonical account
//! - [`finalizer`] - Exchanges an identity for a session ticket and picks the next page
//! - [`outcome`] - The single decision every flow ends with

pub mod finalizer;
pub mod orchestrator;
pub mod outcome;

pub use finalizer::{resolve_navigation, Navigation, SessionFinalizer};
pub use orchestrator::{LoginOrchestrator, LoginPage};
pub use outcome::Outcome;
