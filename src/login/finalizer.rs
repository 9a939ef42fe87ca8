//! Session Finalizer
//!
//! Exchanges a network identity (or a bare email token) for a session ticket in
//! two steps against the ticketing service, `login` then `rsvp`, applies the
//! ticket to the session cookie and decides where the user goes next.

use std::sync::Arc;

use crate::api::AccountApi;
use crate::error::LoginError;
use crate::login::outcome::Outcome;
use crate::models::{Account, Network};
use crate::session::{RequestContext, SessionManager};
use crate::utils::logging::LoggingHelper;

pub const REMINDER_MESSAGE: &str =
    "You made it in! Now link your account to Facebook, Twitter, or Yahoo! to make sign-in easier next time.";
pub const VERIFIED_MESSAGE: &str = "Email address verified";

const UNEXPECTED_API_RESPONSE: &str = "Unexpected API response";
const INVALID_TICKET: &str = "Invalid response parameters from API server";

/// Where to send a freshly signed-in user, and what to tell them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub location: String,
    pub message: Option<&'static str>,
}

/// Compute the post-login navigation
///
/// An `action` hint from the ticketing service overrides the destination. A
/// `tos` restriction sends the user to the terms page unless the destination
/// is already inside `/account`.
#[must_use]
pub fn resolve_navigation(
    action: Option<&str>,
    restriction: Option<&str>,
    destination: Option<String>,
) -> Navigation {
    let mut destination = destination.filter(|d| !d.is_empty());
    let mut message = None;

    match action {
        Some("reminder") => {
            message = Some(REMINDER_MESSAGE);
            destination = Some("/account/linked".to_string());
        }
        Some("verify") => {
            message = Some(VERIFIED_MESSAGE);
            destination = Some("/account/emails".to_string());
        }
        _ => {}
    }

    let inside_account = destination
        .as_deref()
        .is_some_and(|d| d.starts_with("/account"));

    let location = if restriction == Some("tos") && !inside_account {
        match destination {
            Some(d) => format!("/tos?next={}", urlencoding::encode(&d)),
            None => "/tos".to_string(),
        }
    } else {
        destination.unwrap_or_else(|| "/".to_string())
    };

    Navigation { location, message }
}

#[derive(Clone)]
pub struct SessionFinalizer {
    api: Arc<dyn AccountApi>,
    sessions: SessionManager,
}

impl SessionFinalizer {
    #[must_use]
    pub fn new(api: Arc<dyn AccountApi>, sessions: SessionManager) -> Self {
        Self { api, sessions }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Sign in `external_id` on `network`
    ///
    /// `pending` is the profile stashed for the signup form when the identity
    /// is not registered yet.
    pub async fn complete_login(
        &self,
        ctx: &mut RequestContext,
        network: Network,
        external_id: &str,
        destination: Option<String>,
        pending: Option<Account>,
    ) -> Outcome {
        let login = match self.api.login(network, external_id).await {
            Ok(reply) => reply,
            Err(e) => {
                return Outcome::failure(
                    "login",
                    LoginError::internal_with(UNEXPECTED_API_RESPONSE, e),
                )
            }
        };
        LoggingHelper::log_login_result(network, login.status);

        if !login.is_ok() {
            self.sessions.clear_session(ctx);

            if network == Network::Email {
                if let Some(message) = login.field("message") {
                    ctx.jar.set_message(message);
                }
                return Outcome::redirect("/");
            }

            if let Some(account) = pending {
                ctx.jar.set_signup(&account);
                return Outcome::redirect("/signup/register");
            }

            return Outcome::redirect("/");
        }

        let rsvp = login.field("rsvp").unwrap_or_default();
        let ticket = match self.api.rsvp(rsvp).await {
            Ok(reply) => reply,
            Err(e) => {
                return Outcome::failure(
                    "rsvp",
                    LoginError::internal_with(UNEXPECTED_API_RESPONSE, e),
                )
            }
        };
        if !ticket.is_ok() {
            return Outcome::redirect("/");
        }

        let restriction = match self.sessions.set_session(ctx, &ticket.payload) {
            Ok(restriction) => restriction,
            Err(e) => {
                return Outcome::failure("session", LoginError::internal_with(INVALID_TICKET, e))
            }
        };
        if let Some(user) = ctx.user_id() {
            LoggingHelper::log_session_created(user, network);
        }

        let action = login
            .payload
            .pointer("/ext/action/type")
            .and_then(serde_json::Value::as_str);
        let navigation = resolve_navigation(action, restriction.as_deref(), destination);
        if let Some(message) = navigation.message {
            ctx.jar.set_message(message);
        }

        Outcome::redirect(navigation.location)
    }
}
