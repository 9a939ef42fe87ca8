//! Testing utilities for the login flows
//!
//! - [`fixtures`] - Pre-built tickets, settings and session managers
//! - [`mock`] - Scripted [`AccountApi`](crate::api::AccountApi) implementation
//!
//! ## Usage
//!
//! ```ignore
//! use fedlogin::testing::{mock::MockAccountApi, TestFixtures};
//!
//! let manager = TestFixtures::session_manager();
//! let api = MockAccountApi::new().with_login_status(404);
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;

/// Common test constants
pub mod constants {
    /// Key the test session manager encrypts cookies with
    pub const TEST_SESSION_KEY: &[u8] = b"test_key_32_bytes_long_for_test_";

    /// User id carried by the fixture ticket
    pub const TEST_USER_ID: &str = "u-100";

    /// Accepted terms-of-service version on the fixture ticket
    pub const TEST_TOS_VERSION: u64 = 20_110_623;

    pub const TEST_IPHONE_USER_AGENT: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";

    pub const TEST_DESKTOP_USER_AGENT: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
}
