//! Session Manager - Stateless Encrypted Session Handling
//!
//! The `SessionManager` is the single place that reads and writes the two
//! cookies the login flows depend on:
//!
//! - the **session cookie**, holding the ticket issued by the ticketing service
//! - the **jar cookie**, holding correlation records and one-shot values
//!
//! Flows never touch cookies directly. They mutate a [`RequestContext`] and the
//! manager turns the result back into `Set-Cookie` headers.

use crate::session::context::{RequestContext, SessionUpdate};
use crate::session::cookie::{CookieFactory, JAR_COOKIE, SESSION_COOKIE};
use crate::session::jar::Jar;
use crate::session::ticket::SessionTicket;
use crate::settings::LoginSettings;
use crate::utils::crypto::derive_encryption_key;
use crate::utils::user_agent::extract_user_agent;
use actix_web::{cookie::Cookie, HttpRequest};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session ticket: {0}")]
    InvalidTicket(String),

    #[error("Cookie encryption failed: {0}")]
    Cookie(#[from] anyhow::Error),
}

/// Session Manager for stateless encrypted session handling
#[derive(Clone)]
pub struct SessionManager {
    cookie_factory: CookieFactory,
}

// =============================================================================
// Construction
// =============================================================================

impl SessionManager {
    #[must_use]
    pub fn new(
        key: &[u8],
        cookie_secure: bool,
        session_duration_hours: u64,
        jar_duration_minutes: u64,
    ) -> Self {
        let encryption_key = derive_encryption_key(key);
        Self {
            cookie_factory: CookieFactory::new(
                encryption_key,
                cookie_secure,
                session_duration_hours,
                jar_duration_minutes,
            ),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &LoginSettings) -> Self {
        Self::new(
            settings.session.session_secret.as_bytes(),
            settings.cookies.secure,
            settings.session.session_duration_hours,
            settings.session.jar_duration_minutes,
        )
    }
}

// =============================================================================
// Extraction
// =============================================================================

impl SessionManager {
    /// Build the per-request context from cookies and headers
    ///
    /// An undecryptable jar is treated as empty; an undecryptable or expired
    /// session cookie as no session.
    #[must_use]
    pub fn context_from_request(&self, req: &HttpRequest) -> RequestContext {
        let jar = self
            .cookie_factory
            .read_cookie::<BTreeMap<String, Value>>(req, JAR_COOKIE)
            .map(Jar::from_entries)
            .unwrap_or_default();

        let session = self
            .cookie_factory
            .read_cookie::<SessionTicket>(req, SESSION_COOKIE)
            .filter(|ticket| {
                if ticket.is_expired() {
                    log::debug!("Ignoring expired session ticket {}", ticket.id);
                    false
                } else {
                    true
                }
            });

        RequestContext::new(jar, session, extract_user_agent(req))
    }
}

// =============================================================================
// Session updates
// =============================================================================

impl SessionManager {
    /// Apply a ticket returned by the ticketing service to the session
    ///
    /// Returns the session restriction (e.g. `tos`), if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTicket` if the ticket is structurally invalid;
    /// the context is left untouched in that case
    pub fn set_session(
        &self,
        ctx: &mut RequestContext,
        payload: &Value,
    ) -> Result<Option<String>, SessionError> {
        let ticket = SessionTicket::from_payload(payload)?;
        let restriction = ticket.restriction.clone();
        log::debug!(
            "Session set for user {} (restriction: {:?})",
            ticket.user,
            restriction
        );
        ctx.replace_session(ticket);
        Ok(restriction)
    }

    pub fn clear_session(&self, ctx: &mut RequestContext) {
        ctx.drop_session();
    }

    /// Cookies to emit for the changes recorded in the context
    ///
    /// The jar is written only when modified and expired once it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if cookie encryption fails
    pub fn response_cookies(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<Cookie<'static>>, SessionError> {
        let mut cookies = Vec::new();

        if ctx.jar.is_modified() {
            if ctx.jar.is_empty() {
                cookies.push(self.cookie_factory.create_expired_cookie(JAR_COOKIE));
            } else {
                cookies.push(self.cookie_factory.create_jar_cookie(ctx.jar.entries())?);
            }
        }

        match ctx.session_update() {
            SessionUpdate::Unchanged => {}
            SessionUpdate::Set(ticket) => {
                cookies.push(self.cookie_factory.create_session_cookie(ticket)?);
            }
            SessionUpdate::Cleared => {
                cookies.push(self.cookie_factory.create_expired_cookie(SESSION_COOKIE));
            }
        }

        Ok(cookies)
    }

    #[must_use]
    pub fn cookie_factory(&self) -> &CookieFactory {
        &self.cookie_factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::jar::{CorrelationRecord, CorrelationStore};
    use crate::models::Network;
    use crate::testing::TestFixtures;
    use actix_web::test::TestRequest;
    use serde_json::json;

    #[test]
    fn test_context_from_empty_request() {
        let manager = TestFixtures::session_manager();
        let req = TestRequest::default().to_http_request();

        let ctx = manager.context_from_request(&req);
        assert!(ctx.jar.is_empty());
        assert!(!ctx.is_authenticated());
        assert!(manager.response_cookies(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_jar_survives_round_trip() {
        let manager = TestFixtures::session_manager();
        let mut ctx = RequestContext::default();
        ctx.jar.put(
            Network::Facebook,
            CorrelationRecord::OAuth2 {
                state: "s1".into(),
            },
        );

        let cookies = manager.response_cookies(&ctx).unwrap();
        assert_eq!(cookies.len(), 1);

        let req = TestRequest::default()
            .cookie(cookies[0].clone())
            .to_http_request();
        let restored = manager.context_from_request(&req);
        assert_eq!(
            CorrelationStore::get(&restored.jar, Network::Facebook),
            Some(CorrelationRecord::OAuth2 {
                state: "s1".into()
            })
        );
        assert!(!restored.jar.is_modified());
    }

    #[test]
    fn test_tampered_jar_is_empty() {
        let manager = TestFixtures::session_manager();
        let req = TestRequest::default()
            .cookie(Cookie::new(JAR_COOKIE, "not-a-sealed-value"))
            .to_http_request();
        assert!(manager.context_from_request(&req).jar.is_empty());
    }

    #[test]
    fn test_emptied_jar_is_expired() {
        let manager = TestFixtures::session_manager();
        let mut ctx = RequestContext::default();
        ctx.jar.set_message("hi");
        ctx.jar.take_message();

        let cookies = manager.response_cookies(&ctx).unwrap();
        assert_eq!(cookies[0].name(), JAR_COOKIE);
        assert!(cookies[0].max_age().unwrap().whole_seconds() < 0);
    }

    #[test]
    fn test_set_session_returns_restriction() {
        let manager = TestFixtures::session_manager();
        let mut ctx = RequestContext::default();

        let restriction = manager
            .set_session(&mut ctx, &TestFixtures::ticket_payload(Some("tos")))
            .unwrap();
        assert_eq!(restriction.as_deref(), Some("tos"));
        assert!(ctx.is_authenticated());

        let cookies = manager.response_cookies(&ctx).unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name(), SESSION_COOKIE);

        let req = TestRequest::default()
            .cookie(cookies[0].clone())
            .to_http_request();
        let restored = manager.context_from_request(&req);
        assert_eq!(restored.user_id(), Some("u-100"));
    }

    #[test]
    fn test_invalid_ticket_leaves_context_untouched() {
        let manager = TestFixtures::session_manager();
        let mut ctx = RequestContext::default();

        let result = manager.set_session(&mut ctx, &json!({ "id": "only-id" }));
        assert!(matches!(result, Err(SessionError::InvalidTicket(_))));
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.session_update(), &SessionUpdate::Unchanged);
    }

    #[test]
    fn test_clear_session_expires_cookie() {
        let manager = TestFixtures::session_manager();
        let mut ctx = RequestContext::default();
        manager.clear_session(&mut ctx);

        let cookies = manager.response_cookies(&ctx).unwrap();
        assert_eq!(cookies[0].name(), SESSION_COOKIE);
        assert!(cookies[0].max_age().unwrap().whole_seconds() < 0);
    }
}
