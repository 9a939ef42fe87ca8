//! OAuth 1.0a three-legged flow
//!
//! [`OAuth1Signer`] builds HMAC-SHA1 `Authorization: OAuth` headers (RFC 5849
//! §3.4). [`OAuth1Adapter`] runs the request-token / authorize / access-token
//! dance for any provider described by an [`OAuth1Dialect`].

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use url::Url;

use crate::models::{Network, ProviderIdentity};
use crate::oauth::{CallbackParams, OAuthError, ProviderAdapter, ProviderConfig, ProviderEndpoints};
use crate::session::{CorrelationRecord, CorrelationStore};
use crate::utils::crypto::{generate_random_string, hmac_sha1_base64};
use crate::utils::logging::LoggingHelper;

const NONCE_LENGTH: usize = 32;

/// RFC 3986 percent-encoding (unreserved characters pass through)
#[must_use]
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Signature base string: `METHOD&enc(base_url)&enc(sorted params)`
#[must_use]
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&normalized)
    )
}

/// HMAC-SHA1 signature keyed by `enc(consumer_secret)&enc(token_secret)`
///
/// # Errors
///
/// Returns an error if the HMAC cannot be computed
pub fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> anyhow::Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    hmac_sha1_base64(key.as_bytes(), base_string.as_bytes())
}

/// Split a request URL into its signature base URI and query parameters
///
/// # Errors
///
/// Returns an error if the URL does not parse
pub fn normalize_url(url: &str) -> anyhow::Result<(String, Vec<(String, String)>)> {
    let parsed = Url::parse(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("URL has no host: {url}"))?;
    let base = match parsed.port() {
        Some(port) => format!("{}://{host}:{port}{}", parsed.scheme(), parsed.path()),
        None => format!("{}://{host}{}", parsed.scheme(), parsed.path()),
    };
    let query = parsed.query_pairs().into_owned().collect();
    Ok((base, query))
}

/// Token credentials (request or access token pair)
#[derive(Debug, Clone, Copy)]
pub struct TokenPair<'a> {
    pub token: &'a str,
    pub secret: &'a str,
}

#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    consumer_key: String,
    consumer_secret: String,
}

impl OAuth1Signer {
    #[must_use]
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Build the `Authorization` header for a request with a fresh nonce and timestamp
    ///
    /// `protocol_params` carries leg-specific `oauth_*` values such as
    /// `oauth_callback` or `oauth_verifier`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or signing fails
    pub fn authorization_header(
        &self,
        method: &Method,
        url: &str,
        token: Option<TokenPair<'_>>,
        protocol_params: &[(&str, &str)],
    ) -> anyhow::Result<String> {
        self.authorization_header_with(
            method,
            url,
            token,
            protocol_params,
            &generate_random_string(NONCE_LENGTH),
            chrono::Utc::now().timestamp(),
        )
    }

    /// Deterministic variant of [`Self::authorization_header`]
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or signing fails
    pub fn authorization_header_with(
        &self,
        method: &Method,
        url: &str,
        token: Option<TokenPair<'_>>,
        protocol_params: &[(&str, &str)],
        nonce: &str,
        timestamp: i64,
    ) -> anyhow::Result<String> {
        let (base_url, query) = normalize_url(url)?;

        let mut oauth_params: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.consumer_key.clone()),
            ("oauth_nonce".into(), nonce.to_string()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), timestamp.to_string()),
            ("oauth_version".into(), "1.0".into()),
        ];
        if let Some(token) = token {
            oauth_params.push(("oauth_token".into(), token.token.to_string()));
        }
        oauth_params.extend(
            protocol_params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );

        let mut signed_params = oauth_params.clone();
        signed_params.extend(query);

        let base_string = signature_base_string(method.as_str(), &base_url, &signed_params);
        let signature = sign(
            &base_string,
            &self.consumer_secret,
            token.map_or("", |t| t.secret),
        )?;
        oauth_params.push(("oauth_signature".into(), signature));
        oauth_params.sort();

        let fields = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {fields}"))
    }
}

/// Decode an `application/x-www-form-urlencoded` body
#[must_use]
pub fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

/// Network-specific details of an OAuth 1.0a provider
pub trait OAuth1Dialect: Send + Sync + 'static {
    const NETWORK: Network;

    /// Provider name used in validation and exchange errors
    const LABEL: &'static str;

    /// Access-token response field holding the provider's user id
    const ID_PARAM: &'static str;

    /// Access-token response field holding the username, if the provider sends one
    const USERNAME_PARAM: Option<&'static str> = None;

    fn default_endpoints() -> ProviderEndpoints;

    /// Protected resource to read the display name from
    fn profile_url(endpoints: &ProviderEndpoints, external_id: &str) -> String;

    fn display_name_from_profile(profile: &Value) -> Option<String>;
}

pub struct OAuth1Adapter<D: OAuth1Dialect> {
    client: Client,
    config: ProviderConfig,
    signer: OAuth1Signer,
    dialect: PhantomData<fn() -> D>,
}

impl<D: OAuth1Dialect> OAuth1Adapter<D> {
    #[must_use]
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        let signer = OAuth1Signer::new(&config.client_id, &config.client_secret);
        Self {
            client,
            config,
            signer,
            dialect: PhantomData,
        }
    }

    fn signing_error(err: &anyhow::Error) -> OAuthError {
        OAuthError::Signing {
            provider: D::LABEL,
            detail: err.to_string(),
        }
    }

    fn header(
        &self,
        method: &Method,
        url: &str,
        token: Option<TokenPair<'_>>,
        protocol_params: &[(&str, &str)],
    ) -> Result<String, OAuthError> {
        self.signer
            .authorization_header(method, url, token, protocol_params)
            .map_err(|e| Self::signing_error(&e))
    }

    /// Send a signed request, returning status and body text
    async fn send_signed(
        &self,
        method: Method,
        url: &str,
        header: String,
    ) -> Result<(u16, String), reqwest::Error> {
        let response = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, header)
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.text().await?))
    }

    async fn request_token(&self) -> Result<(String, String), OAuthError> {
        let url = &self.config.endpoints.request_token;
        let header = self.header(
            &Method::POST,
            url,
            None,
            &[("oauth_callback", &self.config.callback_uri)],
        )?;

        let failure = |detail: String| OAuthError::RequestToken {
            provider: D::NETWORK.display_name(),
            detail,
        };

        let (status, body) = self
            .send_signed(Method::POST, url, header)
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(failure(format!("HTTP {status}: {body}")));
        }

        let mut params = parse_form(&body);
        match (
            params.remove("oauth_token").filter(|t| !t.is_empty()),
            params.remove("oauth_token_secret"),
        ) {
            (Some(token), Some(secret)) => Ok((token, secret)),
            _ => Err(failure(format!("incomplete request token response: {body}"))),
        }
    }

    async fn access_token(
        &self,
        request: TokenPair<'_>,
        verifier: &str,
    ) -> Result<HashMap<String, String>, OAuthError> {
        let failure = |detail: String| OAuthError::AccessToken {
            provider: D::LABEL,
            detail,
        };

        let url = &self.config.endpoints.token;
        let header = self.header(
            &Method::POST,
            url,
            Some(request),
            &[("oauth_verifier", verifier)],
        )?;

        let (status, body) = self
            .send_signed(Method::POST, url, header)
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(failure(format!("HTTP {status}: {body}")));
        }

        Ok(parse_form(&body))
    }

    /// Best-effort profile read; every failure yields `None`
    async fn fetch_display_name(&self, external_id: &str, access: TokenPair<'_>) -> Option<String> {
        let url = D::profile_url(&self.config.endpoints, external_id);
        let header = self.header(&Method::GET, &url, Some(access), &[]).ok()?;
        match self.send_signed(Method::GET, &url, header).await {
            Ok((200, body)) => serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|profile| D::display_name_from_profile(&profile)),
            Ok((status, _)) => {
                log::debug!("{} profile request returned {status}", D::LABEL);
                None
            }
            Err(e) => {
                log::debug!("{} profile request failed: {e}", D::LABEL);
                None
            }
        }
    }
}

#[async_trait]
impl<D: OAuth1Dialect> ProviderAdapter for OAuth1Adapter<D> {
    fn network(&self) -> Network {
        D::NETWORK
    }

    fn is_callback(&self, params: &CallbackParams) -> bool {
        ["oauth_token", "oauth_verifier", "denied"]
            .iter()
            .any(|key| params.contains_key(*key))
    }

    async fn start(
        &self,
        store: &mut dyn CorrelationStore,
        _user_agent: Option<&str>,
    ) -> Result<String, OAuthError> {
        let (token, secret) = self.request_token().await?;

        let authorize_url = Url::parse_with_params(
            &self.config.endpoints.authorization,
            &[("oauth_token", token.as_str())],
        )
        .map_err(|e| OAuthError::RequestToken {
            provider: D::NETWORK.display_name(),
            detail: format!("invalid authorization endpoint: {e}"),
        })?;

        store.put(D::NETWORK, CorrelationRecord::OAuth1 { token, secret });
        LoggingHelper::log_authorization_redirect(D::NETWORK, authorize_url.as_str());
        Ok(authorize_url.into())
    }

    async fn callback(
        &self,
        store: &mut dyn CorrelationStore,
        params: &CallbackParams,
        linking: bool,
    ) -> Result<ProviderIdentity, OAuthError> {
        // The user declined; only the pending request token may cancel its own record
        if let Some(denied) = params.get("denied") {
            let Some(CorrelationRecord::OAuth1 { token, .. }) = store.get(D::NETWORK) else {
                return Err(OAuthError::MissingRequestToken { provider: D::LABEL });
            };
            if *denied != token {
                return Err(OAuthError::RequestTokenMismatch { provider: D::LABEL });
            }
            store.invalidate(D::NETWORK);
            return Err(OAuthError::AuthorizationDenied {
                provider: D::LABEL,
                reason: "request token denied".to_string(),
            });
        }

        let verifier = params
            .get("oauth_verifier")
            .filter(|v| !v.is_empty())
            .ok_or(OAuthError::MissingVerifier { provider: D::LABEL })?;

        let Some(CorrelationRecord::OAuth1 { token, secret }) = store.get(D::NETWORK) else {
            return Err(OAuthError::MissingRequestToken { provider: D::LABEL });
        };

        if params.get("oauth_token") != Some(&token) {
            return Err(OAuthError::RequestTokenMismatch { provider: D::LABEL });
        }

        store.invalidate(D::NETWORK);

        let request = TokenPair {
            token: &token,
            secret: &secret,
        };
        let mut access = self.access_token(request, verifier).await?;

        let invalid = |detail: String| OAuthError::InvalidAccessToken {
            provider: D::LABEL,
            detail,
        };

        let external_id = access
            .remove(D::ID_PARAM)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid(format!("missing {}", D::ID_PARAM)))?;
        let access_token = access.remove("oauth_token").unwrap_or_default();
        let access_secret = access.remove("oauth_token_secret").unwrap_or_default();

        let mut identity = ProviderIdentity::new(D::NETWORK, external_id.as_str())
            .map_err(invalid)?
            .with_username(D::USERNAME_PARAM.and_then(|field| access.remove(field)));

        if !linking {
            let display_name = self
                .fetch_display_name(
                    &external_id,
                    TokenPair {
                        token: &access_token,
                        secret: &access_secret,
                    },
                )
                .await;
            identity = identity.with_display_name(display_name);
        }

        Ok(identity)
    }
}
