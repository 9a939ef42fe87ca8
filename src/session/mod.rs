//! Session Management Module
//!
//! # Modules
//!
//! - [`manager`] - Reads and writes the session and jar cookies
//! - [`jar`] - Client-held correlation store
//! - [`ticket`] - Session ticket issued by the ticketing service
//! - [`context`] - Per-request state mutated by the login flows
//! - [`cookie`] - Encrypted cookie construction

pub mod context;
pub mod cookie;
pub mod jar;
pub mod manager;
pub mod ticket;

// Re-export commonly used items for convenience
pub use context::{RequestContext, SessionUpdate};
pub use cookie::{CookieFactory, JAR_COOKIE, SESSION_COOKIE};
pub use jar::{CorrelationRecord, CorrelationStore, Jar};
pub use manager::{SessionError, SessionManager};
pub use ticket::{SessionTicket, TicketExt};
