use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};

use crate::api::{AccountApi, ApiError, ApiReply};
use crate::models::Network;
use crate::settings::ApiSettings;

/// `AccountApi` over HTTP, authenticated with the web tier's client credentials
#[derive(Clone)]
pub struct HttpAccountApi {
    client: Client,
    base_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl HttpAccountApi {
    #[must_use]
    pub fn new(client: Client, settings: &ApiSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client_id: settings.get_client_id(),
            client_secret: settings.get_client_secret(),
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiReply, ApiError> {
        let url = format!("{}{path}", self.base_url);
        log::debug!("API call: {method} {url}");

        let mut request = self.client.request(method, &url);
        if let Some(client_id) = &self.client_id {
            request = request.basic_auth(client_id, self.client_secret.as_ref());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let payload = serde_json::from_str(&text).unwrap_or(Value::Null);

        log::debug!("API reply: {status} from {path}");
        Ok(ApiReply::new(status, payload))
    }
}

#[async_trait]
impl AccountApi for HttpAccountApi {
    async fn login(&self, network: Network, id: &str) -> Result<ApiReply, ApiError> {
        self.call(
            Method::POST,
            "/oz/login",
            Some(json!({ "type": network.as_str(), "id": id })),
        )
        .await
    }

    async fn rsvp(&self, rsvp: &str) -> Result<ApiReply, ApiError> {
        self.call(Method::POST, "/oz/rsvp", Some(json!({ "rsvp": rsvp })))
            .await
    }

    async fn link(&self, user: &str, network: Network, id: &str) -> Result<ApiReply, ApiError> {
        if user.is_empty() {
            return Err(ApiError::Configuration("empty user id".to_string()));
        }
        let path = format!("/user/{}/link/{network}", urlencoding::encode(user));
        self.call(Method::POST, &path, Some(json!({ "id": id })))
            .await
    }

    async fn unlink(&self, user: &str, network: Network) -> Result<ApiReply, ApiError> {
        if user.is_empty() {
            return Err(ApiError::Configuration("empty user id".to_string()));
        }
        let path = format!("/user/{}/link/{network}", urlencoding::encode(user));
        self.call(Method::DELETE, &path, None).await
    }
}
