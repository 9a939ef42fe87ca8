// Centralized logging utilities for the login flows
use log::{debug, error, info, warn};

use crate::error::LoginError;
use crate::models::Network;

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log provider initialization start
    pub fn log_provider_initialization() {
        info!("🔧 Initializing identity providers from configuration...");
    }

    /// Log that a provider is disabled
    pub fn log_provider_disabled(network: Network) {
        info!("⏭️  Provider {network} is disabled, skipping");
    }

    /// Log that a provider is configured
    pub fn log_provider_configured(network: Network) {
        info!("✅ {} configured ({network})", network.display_name());
    }

    /// Log that a provider is not configured
    pub fn log_provider_not_configured(network: Network) {
        info!(
            "❌ {} not configured - missing client credentials",
            network.display_name()
        );
    }

    /// Log summary of configured providers
    pub fn log_providers_summary(networks: &[Network]) {
        let names: Vec<&str> = networks.iter().map(|network| network.as_str()).collect();
        info!("🎯 Configured identity providers: {names:?}");
    }

    /// Log the redirect to a provider's authorization page
    pub fn log_authorization_redirect(network: Network, url: &str) {
        debug!("🔍 Redirecting to {network} authorization: {url}");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start(network: Network) {
        info!("🔄 Exchanging authorization code for tokens with {network}");
    }

    /// Log a failed login, link or unlink step
    ///
    /// Operator detail from internal errors is only ever written here.
    pub fn log_flow_error(operation: &str, err: &LoginError) {
        match err.log_detail() {
            Some(detail) => error!("{operation} failed: {err} ({detail})"),
            None if err.is_internal() => error!("{operation} failed: {err}"),
            None => warn!("{operation} rejected: {err}"),
        }
    }

    /// Log the outcome of the account API login call
    pub fn log_login_result(network: Network, status: u16) {
        if status == 200 {
            info!("Account login succeeded via {network}");
        } else {
            info!("Account login via {network} answered with status {status}");
        }
    }

    /// Log session creation success
    pub fn log_session_created(user: &str, network: Network) {
        info!("Successfully built session for user: {user} (network: {network})");
    }

    /// Log account link changes
    pub fn log_link_change(user: &str, network: Network, linked: bool) {
        let action = if linked { "linked to" } else { "unlinked from" };
        info!("User {user} {action} {network}");
    }
}
