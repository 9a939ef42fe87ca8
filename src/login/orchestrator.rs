//! Login Orchestrator
//!
//! Decides, per request, whether a provider request starts a new flow or
//! completes one, and whether a completed flow signs the user in or links a
//! provider to the signed-in account.

use std::sync::Arc;

use crate::api::AccountApi;
use crate::error::LoginError;
use crate::login::finalizer::SessionFinalizer;
use crate::login::outcome::Outcome;
use crate::models::{Account, Network, ProviderIdentity};
use crate::oauth::{CallbackParams, ProviderRegistry};
use crate::session::{RequestContext, SessionManager};
use crate::settings::LoginSettings;
use crate::utils::logging::LoggingHelper;
use crate::utils::redirect_validator::validate_local_destination;

const UNKNOWN_NETWORK: &str = "Unknown third party network authentication";
const LINKED_VIEW: &str = "/account/linked";

/// What the login page should do for the current visitor
#[derive(Debug)]
pub enum LoginPage {
    /// Render the sign-in page
    SignIn {
        next: Option<String>,
        networks: Vec<Network>,
        message: Option<String>,
    },
    /// Already signed in; go on
    Continue(Outcome),
}

#[derive(Clone)]
pub struct LoginOrchestrator {
    registry: ProviderRegistry,
    finalizer: SessionFinalizer,
    api: Arc<dyn AccountApi>,
    home_view: String,
    minimum_tos: u64,
}

impl LoginOrchestrator {
    #[must_use]
    pub fn new(
        registry: ProviderRegistry,
        api: Arc<dyn AccountApi>,
        sessions: SessionManager,
        settings: &LoginSettings,
    ) -> Self {
        Self {
            registry,
            finalizer: SessionFinalizer::new(Arc::clone(&api), sessions),
            api,
            home_view: settings.application.home_view.clone(),
            minimum_tos: u64::from(settings.tos.minimum_version),
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        self.finalizer.sessions()
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Entry point for `/auth/{network}`
    ///
    /// Stores a safe `x_next` destination, then runs the provider's callback leg
    /// when the query carries its markers or the start leg otherwise.
    pub async fn begin_or_callback(
        &self,
        ctx: &mut RequestContext,
        network: &str,
        query: &CallbackParams,
    ) -> Outcome {
        if let Some(next) = query.get("x_next") {
            if !ctx.jar.set_destination(next) {
                log::warn!("Ignoring non-local x_next destination: {next}");
            }
        }

        let Some(network) = Network::third_party(network) else {
            return Outcome::failure("auth", LoginError::internal_with(UNKNOWN_NETWORK, network));
        };
        let Some(adapter) = self.registry.get(network) else {
            return Outcome::failure(
                "auth",
                LoginError::internal_with(UNKNOWN_NETWORK, format!("{network} is not configured")),
            );
        };

        if !adapter.is_callback(query) {
            return match adapter.start(&mut ctx.jar, ctx.user_agent.as_deref()).await {
                Ok(url) => Outcome::redirect_with_notice(
                    url,
                    format!(
                        "You are being redirected to {} to sign-in...",
                        network.display_name()
                    ),
                ),
                Err(e) => Outcome::failure("auth start", e.into()),
            };
        }

        let linking = ctx.is_authenticated();
        match adapter.callback(&mut ctx.jar, query, linking).await {
            Ok(identity) => self.finalize(ctx, identity).await,
            Err(e) => Outcome::failure("auth callback", e.into()),
        }
    }

    /// Link the identity to the signed-in account, or sign in with it
    pub async fn finalize(&self, ctx: &mut RequestContext, identity: ProviderIdentity) -> Outcome {
        if let Some(user) = ctx.user_id().map(ToString::to_string) {
            match self
                .api
                .link(&user, identity.network(), identity.external_id())
                .await
            {
                Ok(reply) if reply.is_ok() => {
                    LoggingHelper::log_link_change(&user, identity.network(), true);
                }
                Ok(reply) => log::warn!(
                    "Linking {} for user {user} answered with status {}",
                    identity.network(),
                    reply.status
                ),
                Err(e) => log::warn!("Linking {} for user {user} failed: {e}", identity.network()),
            }
            return Outcome::redirect(LINKED_VIEW);
        }

        let destination = ctx.jar.take_destination();
        let account = Account::from(&identity);
        self.finalizer
            .complete_login(
                ctx,
                identity.network(),
                identity.external_id(),
                destination,
                Some(account),
            )
            .await
    }

    /// Remove a provider link from the signed-in account
    pub async fn unlink(&self, ctx: &RequestContext, network: &str) -> Outcome {
        let Some(user) = ctx.user_id() else {
            return Outcome::redirect("/login");
        };
        let Some(network) = Network::third_party(network) else {
            return Outcome::redirect(LINKED_VIEW);
        };

        match self.api.unlink(user, network).await {
            Ok(reply) if reply.is_ok() => LoggingHelper::log_link_change(user, network, false),
            Ok(reply) => log::warn!(
                "Unlinking {network} for user {user} answered with status {}",
                reply.status
            ),
            Err(e) => log::warn!("Unlinking {network} for user {user} failed: {e}"),
        }
        Outcome::redirect(LINKED_VIEW)
    }

    /// Sign in with a one-time email token
    pub async fn email_token_login(&self, ctx: &mut RequestContext, token: &str) -> Outcome {
        if token.is_empty() {
            return Outcome::failure(
                "email login",
                LoginError::BadRequest("Missing email token".to_string()),
            );
        }
        self.finalizer
            .complete_login(ctx, Network::Email, token, None, None)
            .await
    }

    /// Decide between rendering the sign-in page and moving a signed-in user on
    pub fn login_page(&self, ctx: &mut RequestContext, next: Option<&str>) -> LoginPage {
        let next = validate_local_destination(next);

        let Some(ticket) = &ctx.session else {
            return LoginPage::SignIn {
                next,
                networks: self.registry.networks(),
                message: ctx.jar.take_message(),
            };
        };

        let tos_current = !ticket.requires_tos()
            && ticket.ext.tos.is_some_and(|tos| tos >= self.minimum_tos);

        let location = if tos_current {
            next.unwrap_or_else(|| self.home_view.clone())
        } else {
            match next {
                Some(next) => format!("/tos?next={}", urlencoding::encode(&next)),
                None => "/tos".to_string(),
            }
        };
        LoginPage::Continue(Outcome::redirect(location))
    }

    /// Drop the session and go home
    pub fn logout(&self, ctx: &mut RequestContext) -> Outcome {
        self.sessions().clear_session(ctx);
        Outcome::redirect("/")
    }
}
