//! Mock objects and fake implementations for testing

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Mutex, PoisonError};

use crate::api::{AccountApi, ApiError, ApiReply};
use crate::models::Network;

/// A call received by [`MockAccountApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Login { network: Network, id: String },
    Rsvp { rsvp: String },
    Link { user: String, network: Network, id: String },
    Unlink { user: String, network: Network },
}

/// Scripted account API
///
/// Each endpoint answers with its configured reply, or with a transport error
/// when none is set. Link and unlink default to `200 {}`.
pub struct MockAccountApi {
    login: Option<ApiReply>,
    rsvp: Option<ApiReply>,
    link: Option<ApiReply>,
    unlink: Option<ApiReply>,
    calls: Mutex<Vec<ApiCall>>,
}

impl Default for MockAccountApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAccountApi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            login: None,
            rsvp: None,
            link: Some(ApiReply::new(200, json!({}))),
            unlink: Some(ApiReply::new(200, json!({}))),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Registered user: login yields `rsvp-1`, rsvp yields `ticket`
    #[must_use]
    pub fn registered(ext: Value, ticket: Value) -> Self {
        Self::new()
            .with_login(ApiReply::new(200, json!({ "rsvp": "rsvp-1", "ext": ext })))
            .with_rsvp(ApiReply::new(200, ticket))
    }

    #[must_use]
    pub fn with_login(mut self, reply: ApiReply) -> Self {
        self.login = Some(reply);
        self
    }

    #[must_use]
    pub fn with_login_status(self, status: u16) -> Self {
        self.with_login(ApiReply::new(status, json!({})))
    }

    #[must_use]
    pub fn with_rsvp(mut self, reply: ApiReply) -> Self {
        self.rsvp = Some(reply);
        self
    }

    #[must_use]
    pub fn with_link(mut self, reply: ApiReply) -> Self {
        self.link = Some(reply);
        self
    }

    #[must_use]
    pub fn with_unlink(mut self, reply: ApiReply) -> Self {
        self.unlink = Some(reply);
        self
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn answer(&self, call: ApiCall, reply: Option<&ApiReply>) -> Result<ApiReply, ApiError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        reply
            .cloned()
            .ok_or_else(|| ApiError::Transport("connection refused".to_string()))
    }
}

#[async_trait]
impl AccountApi for MockAccountApi {
    async fn login(&self, network: Network, id: &str) -> Result<ApiReply, ApiError> {
        self.answer(
            ApiCall::Login {
                network,
                id: id.to_string(),
            },
            self.login.as_ref(),
        )
    }

    async fn rsvp(&self, rsvp: &str) -> Result<ApiReply, ApiError> {
        self.answer(
            ApiCall::Rsvp {
                rsvp: rsvp.to_string(),
            },
            self.rsvp.as_ref(),
        )
    }

    async fn link(&self, user: &str, network: Network, id: &str) -> Result<ApiReply, ApiError> {
        self.answer(
            ApiCall::Link {
                user: user.to_string(),
                network,
                id: id.to_string(),
            },
            self.link.as_ref(),
        )
    }

    async fn unlink(&self, user: &str, network: Network) -> Result<ApiReply, ApiError> {
        self.answer(
            ApiCall::Unlink {
                user: user.to_string(),
                network,
            },
            self.unlink.as_ref(),
        )
    }
}
