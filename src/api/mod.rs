//! Ticketing and account-linking API
//!
//! The session service exchanges a network identity for an rsvp and the rsvp
//! for a session ticket; the account service links and unlinks provider
//! identities. Both are reached through the [`AccountApi`] trait so flows can be
//! exercised against a mock.

pub mod client;

pub use client::HttpAccountApi;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::Network;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API request failed: {0}")]
    Transport(String),

    #[error("API client misconfigured: {0}")]
    Configuration(String),
}

/// Status and decoded body of an API call
///
/// Non-JSON bodies decode to `Value::Null`; callers decide per status.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub payload: Value,
}

impl ApiReply {
    #[must_use]
    pub fn new(status: u16, payload: Value) -> Self {
        Self { status, payload }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// String field of the payload
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(Value::as_str)
    }
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    /// `POST /oz/login {type, id}`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; HTTP error statuses are replies
    async fn login(&self, network: Network, id: &str) -> Result<ApiReply, ApiError>;

    /// `POST /oz/rsvp {rsvp}`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure
    async fn rsvp(&self, rsvp: &str) -> Result<ApiReply, ApiError>;

    /// `POST /user/{user}/link/{network} {id}`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure
    async fn link(&self, user: &str, network: Network, id: &str) -> Result<ApiReply, ApiError>;

    /// `DELETE /user/{user}/link/{network}`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure
    async fn unlink(&self, user: &str, network: Network) -> Result<ApiReply, ApiError>;
}
