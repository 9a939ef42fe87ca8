//! OAuth 2.0 authorization-code flow with anti-forgery state

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use url::Url;

use crate::models::{Network, ProviderIdentity};
use crate::oauth::oauth1::parse_form;
use crate::oauth::{CallbackParams, OAuthError, ProviderAdapter, ProviderConfig, ProviderEndpoints};
use crate::session::{CorrelationRecord, CorrelationStore};
use crate::utils::crypto::generate_random_string;
use crate::utils::logging::LoggingHelper;

/// Network-specific details of an OAuth 2.0 provider
pub trait OAuth2Dialect: Send + Sync + 'static {
    const NETWORK: Network;

    /// Provider name used in errors
    const LABEL: &'static str;

    const STATE_LENGTH: usize = 22;

    /// Query parameter carrying the access token on the profile request
    const PROFILE_TOKEN_PARAM: &'static str = "access_token";

    fn default_endpoints() -> ProviderEndpoints;

    /// Authorization parameters beyond `client_id`, `response_type`,
    /// `redirect_uri` and `state`
    fn authorization_params(user_agent: Option<&str>) -> Vec<(&'static str, String)>;

    /// Build the identity from the profile document
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if a mandatory field is missing
    fn identity_from_profile(profile: &Value) -> Result<ProviderIdentity, String>;
}

/// Decode a token endpoint body as a JSON object, falling back to form encoding
///
/// Some providers answer the token request with `access_token=...&expires=...`
/// regardless of the documented JSON format.
#[must_use]
pub fn parse_token_response(body: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => parse_form(body)
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    }
}

pub struct OAuth2Adapter<D: OAuth2Dialect> {
    client: Client,
    config: ProviderConfig,
    dialect: PhantomData<fn() -> D>,
}

impl<D: OAuth2Dialect> OAuth2Adapter<D> {
    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self {
            client,
            config,
            dialect: PhantomData,
        }
    }

    /// Authorization URL for a given state
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization endpoint is not a URL
    pub fn authorization_url(
        &self,
        state: &str,
        user_agent: Option<&str>,
    ) -> Result<Url, url::ParseError> {
        let mut params: Vec<(&str, String)> = vec![
            ("client_id", self.config.client_id.clone()),
            ("response_type", "code".to_string()),
            ("redirect_uri", self.config.callback_uri.clone()),
            ("state", state.to_string()),
        ];
        params.extend(D::authorization_params(user_agent));
        Url::parse_with_params(&self.config.endpoints.authorization, &params)
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let failure = |detail: String| OAuthError::TokenRequest {
            provider: D::LABEL,
            detail,
        };

        LoggingHelper::log_token_exchange_start(D::NETWORK);
        let response = self
            .client
            .post(&self.config.endpoints.token)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.callback_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| failure(e.to_string()))?;
        let data = parse_token_response(&body);

        if status.as_u16() != 200 {
            return Err(failure(format!("HTTP {status}: {}", Value::Object(data))));
        }

        data.get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| OAuthError::InvalidAccessToken {
                provider: D::LABEL,
                detail: "missing access_token".to_string(),
            })
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<ProviderIdentity, OAuthError> {
        let invalid = |detail: String| OAuthError::InvalidProfile {
            provider: D::LABEL,
            detail,
        };

        let response = self
            .client
            .get(&self.config.endpoints.userinfo)
            .query(&[(D::PROFILE_TOKEN_PARAM, access_token)])
            .send()
            .await
            .map_err(|e| invalid(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| invalid(e.to_string()))?;
        if status.as_u16() != 200 {
            return Err(invalid(format!("HTTP {status}: {body}")));
        }

        let profile: Value = serde_json::from_str(&body).map_err(|e| invalid(e.to_string()))?;
        D::identity_from_profile(&profile).map_err(invalid)
    }
}

#[async_trait]
impl<D: OAuth2Dialect> ProviderAdapter for OAuth2Adapter<D> {
    fn network(&self) -> Network {
        D::NETWORK
    }

    fn is_callback(&self, params: &CallbackParams) -> bool {
        params.contains_key("code") || params.contains_key("error")
    }

    async fn start(
        &self,
        store: &mut dyn CorrelationStore,
        user_agent: Option<&str>,
    ) -> Result<String, OAuthError> {
        let state = generate_random_string(D::STATE_LENGTH);
        let url = self
            .authorization_url(&state, user_agent)
            .map_err(|e| OAuthError::TokenRequest {
                provider: D::LABEL,
                detail: format!("invalid authorization endpoint: {e}"),
            })?;

        store.put(D::NETWORK, CorrelationRecord::OAuth2 { state });
        LoggingHelper::log_authorization_redirect(D::NETWORK, url.as_str());
        Ok(url.into())
    }

    async fn callback(
        &self,
        store: &mut dyn CorrelationStore,
        params: &CallbackParams,
        _linking: bool,
    ) -> Result<ProviderIdentity, OAuthError> {
        let Some(CorrelationRecord::OAuth2 { state }) = store.get(D::NETWORK) else {
            return Err(OAuthError::MissingState { provider: D::LABEL });
        };
        if state.is_empty() {
            return Err(OAuthError::MissingState { provider: D::LABEL });
        }

        // Checked before the error branch so a forged callback cannot drop the record
        if params.get("state") != Some(&state) {
            return Err(OAuthError::StateMismatch { provider: D::LABEL });
        }

        store.invalidate(D::NETWORK);

        if let Some(error) = params.get("error") {
            let reason = params
                .get("error_description")
                .or_else(|| params.get("error_reason"))
                .unwrap_or(error);
            return Err(OAuthError::AuthorizationDenied {
                provider: D::LABEL,
                reason: reason.clone(),
            });
        }

        let code = params.get("code").map_or("", String::as_str);
        let access_token = self.exchange_code(code).await?;
        self.fetch_identity(&access_token).await
    }
}
