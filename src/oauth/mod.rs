//! Third-party identity provider adapters
//!
//! Each provider implements [`ProviderAdapter`]: a start leg that records a
//! correlation value and returns the provider's authorization URL, and a
//! callback leg that validates the callback against that value and yields a
//! [`ProviderIdentity`]. OAuth 1.0a and OAuth 2.0 each have one generic adapter
//! parameterised by a per-network dialect.

pub mod facebook;
pub mod oauth1;
pub mod oauth2;
pub mod twitter;
pub mod yahoo;

pub use oauth1::{OAuth1Adapter, OAuth1Dialect};
pub use oauth2::{OAuth2Adapter, OAuth2Dialect};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::error::LoginError;
use crate::models::{Network, ProviderIdentity};
use crate::session::CorrelationStore;
use crate::settings::{LoginSettings, ProviderSettings};
use crate::utils::logging::LoggingHelper;

/// Query parameters of a start or callback request
pub type CallbackParams = HashMap<String, String>;

/// Failures of a provider leg
///
/// Every variant terminates the flow as an internal error; the `detail` fields
/// go to the operator log only.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Failed to obtain a {provider} request token")]
    RequestToken {
        provider: &'static str,
        detail: String,
    },

    #[error("Missing verifier parameter in {provider} authorization response")]
    MissingVerifier { provider: &'static str },

    #[error("Missing {provider} request token cookie")]
    MissingRequestToken { provider: &'static str },

    #[error("{provider} authorized request token mismatch")]
    RequestTokenMismatch { provider: &'static str },

    #[error("Failed to obtain a {provider} access token")]
    AccessToken {
        provider: &'static str,
        detail: String,
    },

    #[error("Invalid {provider} access token response")]
    InvalidAccessToken {
        provider: &'static str,
        detail: String,
    },

    #[error("Missing {provider} state cookie")]
    MissingState { provider: &'static str },

    #[error("{provider} incorrect state parameter")]
    StateMismatch { provider: &'static str },

    #[error("{provider} authorization denied")]
    AuthorizationDenied {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} returned OAuth error on token request")]
    TokenRequest {
        provider: &'static str,
        detail: String,
    },

    #[error("Invalid {provider} profile response")]
    InvalidProfile {
        provider: &'static str,
        detail: String,
    },

    #[error("Failed signing {provider} request")]
    Signing {
        provider: &'static str,
        detail: String,
    },
}

impl OAuthError {
    /// Operator-only context for the failure
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::RequestToken { detail, .. }
            | Self::AccessToken { detail, .. }
            | Self::InvalidAccessToken { detail, .. }
            | Self::TokenRequest { detail, .. }
            | Self::InvalidProfile { detail, .. }
            | Self::Signing { detail, .. } => Some(detail),
            Self::AuthorizationDenied { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<OAuthError> for LoginError {
    fn from(err: OAuthError) -> Self {
        match err.detail() {
            Some(detail) => LoginError::internal_with(err.to_string(), detail),
            None => LoginError::internal(err.to_string()),
        }
    }
}

/// Resolved per-provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_uri: String,
    pub endpoints: ProviderEndpoints,
}

/// Provider URLs; OAuth 2.0 providers leave `request_token` empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub request_token: String,
    pub authorization: String,
    pub token: String,
    pub userinfo: String,
}

impl ProviderEndpoints {
    /// Apply the URL overrides from settings
    #[must_use]
    pub fn with_overrides(mut self, settings: &ProviderSettings) -> Self {
        if let Some(url) = &settings.request_token_endpoint {
            self.request_token.clone_from(url);
        }
        if let Some(url) = &settings.authorization_endpoint {
            self.authorization.clone_from(url);
        }
        if let Some(url) = &settings.token_endpoint {
            self.token.clone_from(url);
        }
        if let Some(url) = &settings.userinfo_endpoint {
            self.userinfo.clone_from(url);
        }
        self
    }
}

impl ProviderConfig {
    /// Resolve credentials and endpoints; `None` if disabled or lacking credentials
    #[must_use]
    pub fn resolve(
        settings: &ProviderSettings,
        callback_uri: String,
        defaults: ProviderEndpoints,
    ) -> Option<Self> {
        if !settings.enabled {
            return None;
        }
        Some(Self {
            client_id: settings.get_client_id()?,
            client_secret: settings.get_client_secret()?,
            callback_uri,
            endpoints: defaults.with_overrides(settings),
        })
    }
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn network(&self) -> Network;

    /// Whether the query carries this protocol's callback markers
    fn is_callback(&self, params: &CallbackParams) -> bool;

    /// First leg: record correlation state and return the authorization URL
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be reached or rejects the request
    async fn start(
        &self,
        store: &mut dyn CorrelationStore,
        user_agent: Option<&str>,
    ) -> Result<String, OAuthError>;

    /// Callback leg: validate against the stored record and resolve the identity
    ///
    /// The record is invalidated before any token exchange. When `linking` is set
    /// the identity is only needed for its id, so profile enrichment is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error on any validation, exchange or mandatory-field failure
    async fn callback(
        &self,
        store: &mut dyn CorrelationStore,
        params: &CallbackParams,
        linking: bool,
    ) -> Result<ProviderIdentity, OAuthError>;
}

/// Configured adapters keyed by network
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<Network, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.network(), adapter);
    }

    #[must_use]
    pub fn get(&self, network: Network) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&network).cloned()
    }

    /// Configured networks in display order
    #[must_use]
    pub fn networks(&self) -> Vec<Network> {
        Network::THIRD_PARTY
            .into_iter()
            .filter(|network| self.adapters.contains_key(network))
            .collect()
    }

    /// Build adapters for every enabled provider with credentials
    #[must_use]
    pub fn from_settings(settings: &LoginSettings, client: &reqwest::Client) -> Self {
        LoggingHelper::log_provider_initialization();
        let mut registry = Self::new();

        for network in Network::THIRD_PARTY {
            let Some(provider_settings) = settings.providers.get(network) else {
                continue;
            };
            if !provider_settings.enabled {
                LoggingHelper::log_provider_disabled(network);
                continue;
            }

            let callback_uri = settings.callback_uri(network);
            let adapter: Option<Arc<dyn ProviderAdapter>> = match network {
                Network::Twitter => ProviderConfig::resolve(
                    provider_settings,
                    callback_uri,
                    twitter::Twitter::default_endpoints(),
                )
                .map(|config| {
                    Arc::new(OAuth1Adapter::<twitter::Twitter>::new(client.clone(), config)) as Arc<dyn ProviderAdapter>
                }),
                Network::Yahoo => ProviderConfig::resolve(
                    provider_settings,
                    callback_uri,
                    yahoo::Yahoo::default_endpoints(),
                )
                .map(|config| {
                    Arc::new(OAuth1Adapter::<yahoo::Yahoo>::new(client.clone(), config)) as Arc<dyn ProviderAdapter>
                }),
                Network::Facebook => ProviderConfig::resolve(
                    provider_settings,
                    callback_uri,
                    facebook::Facebook::default_endpoints(),
                )
                .map(|config| {
                    Arc::new(OAuth2Adapter::<facebook::Facebook>::new(client.clone(), config))
                        as Arc<dyn ProviderAdapter>
                }),
                Network::Email => None,
            };

            match adapter {
                Some(adapter) => {
                    LoggingHelper::log_provider_configured(network);
                    registry.register(adapter);
                }
                None => LoggingHelper::log_provider_not_configured(network),
            }
        }

        LoggingHelper::log_providers_summary(&registry.networks());
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            OAuthError::MissingRequestToken {
                provider: "Twitter"
            }
            .to_string(),
            "Missing Twitter request token cookie"
        );
        assert_eq!(
            OAuthError::StateMismatch {
                provider: "Facebook"
            }
            .to_string(),
            "Facebook incorrect state parameter"
        );
    }

    #[test]
    fn test_into_login_error_keeps_detail_private() {
        let err: LoginError = OAuthError::RequestToken {
            provider: "Yahoo!",
            detail: "connection refused".to_string(),
        }
        .into();

        assert!(err.is_internal());
        assert_eq!(
            err.public_message(),
            Some("Failed to obtain a Yahoo! request token")
        );
        assert_eq!(err.log_detail(), Some("connection refused"));
    }

    #[test]
    fn test_endpoint_overrides() {
        let settings = ProviderSettings {
            token_endpoint: Some("http://127.0.0.1/token".to_string()),
            ..Default::default()
        };
        let endpoints = facebook::Facebook::default_endpoints().with_overrides(&settings);
        assert_eq!(endpoints.token, "http://127.0.0.1/token");
        assert_eq!(
            endpoints.authorization,
            "https://graph.facebook.com/oauth/authorize"
        );
    }

    #[test]
    fn test_unconfigured_provider_not_resolved() {
        let settings = ProviderSettings {
            enabled: true,
            client_id: Some("id".to_string()),
            ..Default::default()
        };
        assert!(ProviderConfig::resolve(
            &settings,
            "http://localhost/auth/facebook".to_string(),
            facebook::Facebook::default_endpoints()
        )
        .is_none());
    }

    #[test]
    fn test_registry_from_settings_skips_missing_credentials() {
        let mut settings = LoginSettings::default();
        for provider in [
            &mut settings.providers.twitter,
            &mut settings.providers.yahoo,
            &mut settings.providers.facebook,
        ] {
            provider.client_id_env = None;
            provider.client_secret_env = None;
        }
        settings.providers.facebook.client_id = Some("fb".to_string());
        settings.providers.facebook.client_secret = Some("fb-secret".to_string());

        let registry = ProviderRegistry::from_settings(&settings, &reqwest::Client::new());
        assert_eq!(registry.networks(), vec![Network::Facebook]);
        assert!(registry.get(Network::Twitter).is_none());
    }
}
