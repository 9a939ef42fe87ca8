use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::SessionError;

/// Session credential issued by the ticketing service
///
/// The web tier never interprets `key` or `algorithm`; it only checks they are
/// present and carries them in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTicket {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction: Option<String>,
    #[serde(default)]
    pub ext: TicketExt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketExt {
    /// Terms-of-service version the user has accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tos: Option<u64>,
}

impl SessionTicket {
    /// Parse and structurally validate a ticket returned by the rsvp exchange
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTicket` if the payload is not an object or
    /// any of `id`, `key`, `algorithm`, `user` is missing or empty
    pub fn from_payload(payload: &Value) -> Result<Self, SessionError> {
        let ticket: Self = serde_json::from_value(payload.clone())
            .map_err(|e| SessionError::InvalidTicket(e.to_string()))?;

        let missing: Vec<&str> = [
            ("id", &ticket.id),
            ("key", &ticket.key),
            ("algorithm", &ticket.algorithm),
            ("user", &ticket.user),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(SessionError::InvalidTicket(format!(
                "missing fields: {}",
                missing.join(", ")
            )));
        }

        Ok(ticket)
    }

    /// Whether the session is limited pending terms-of-service acceptance
    #[must_use]
    pub fn requires_tos(&self) -> bool {
        self.restriction.as_deref() == Some("tos")
    }

    /// Whether the ticket's expiry (milliseconds since epoch) has passed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp
            .is_some_and(|exp| exp <= chrono::Utc::now().timestamp_millis())
    }
}
