//! Test fixtures providing pre-built test objects

use actix_web::cookie::Cookie;
use actix_web::{test, HttpRequest};
use serde_json::{json, Value};

use crate::models::Network;
use crate::session::{SessionManager, SessionTicket, TicketExt};
use crate::settings::{LoginSettings, ProviderSettings};

use super::constants::{TEST_SESSION_KEY, TEST_TOS_VERSION, TEST_USER_ID};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// A valid, unrestricted ticket for [`TEST_USER_ID`]
    #[must_use]
    pub fn session_ticket() -> SessionTicket {
        SessionTicket {
            id: "ticket-1".to_string(),
            key: "ticket-key".to_string(),
            algorithm: "sha256".to_string(),
            user: TEST_USER_ID.to_string(),
            exp: None,
            restriction: None,
            ext: TicketExt {
                tos: Some(TEST_TOS_VERSION),
            },
        }
    }

    /// Ticket body as returned by `POST /oz/rsvp`
    #[must_use]
    pub fn ticket_payload(restriction: Option<&str>) -> Value {
        let mut payload = json!({
            "id": "ticket-1",
            "key": "ticket-key",
            "algorithm": "sha256",
            "user": TEST_USER_ID,
            "ext": { "tos": TEST_TOS_VERSION }
        });
        if let Some(restriction) = restriction {
            payload["restriction"] = json!(restriction);
        }
        payload
    }

    /// Session manager sharing its key with [`Self::settings`]
    #[must_use]
    pub fn session_manager() -> SessionManager {
        SessionManager::new(TEST_SESSION_KEY, false, 24, 15)
    }

    /// Settings with insecure cookies and no configured provider
    #[must_use]
    pub fn settings() -> LoginSettings {
        let mut settings = LoginSettings::default();
        settings.session.session_secret = String::from_utf8_lossy(TEST_SESSION_KEY).into_owned();
        settings.session.session_duration_hours = 24;
        settings.cookies.secure = false;
        for network in Network::THIRD_PARTY {
            *Self::provider_mut(&mut settings, network) = ProviderSettings {
                enabled: false,
                ..Default::default()
            };
        }
        settings
    }

    /// Settings with every provider and the API pointed at `server_uri`
    ///
    /// Endpoint paths mirror the production ones so mocks can match on them.
    #[must_use]
    pub fn settings_for_server(server_uri: &str) -> LoginSettings {
        let mut settings = Self::settings();
        settings.api.base_url = server_uri.to_string();
        settings.api.client_id = Some("web".to_string());
        settings.api.client_secret = Some("web-secret".to_string());
        settings.api.client_id_env = None;
        settings.api.client_secret_env = None;

        let paths = [
            (
                Network::Twitter,
                "/oauth/request_token",
                "/oauth/authenticate",
                "/oauth/access_token",
                "/1.1/account/verify_credentials.json",
            ),
            (
                Network::Yahoo,
                "/oauth/v2/get_request_token",
                "/oauth/v2/request_auth",
                "/oauth/v2/get_token",
                "/v1/user",
            ),
            (
                Network::Facebook,
                "",
                "/oauth/authorize",
                "/oauth/access_token",
                "/me",
            ),
        ];
        for (network, request_token, authorization, token, userinfo) in paths {
            *Self::provider_mut(&mut settings, network) = ProviderSettings {
                enabled: true,
                client_id: Some(format!("{network}-id")),
                client_secret: Some(format!("{network}-secret")),
                client_id_env: None,
                client_secret_env: None,
                request_token_endpoint: (!request_token.is_empty())
                    .then(|| format!("{server_uri}{request_token}")),
                authorization_endpoint: Some(format!("{server_uri}{authorization}")),
                token_endpoint: Some(format!("{server_uri}{token}")),
                userinfo_endpoint: Some(format!("{server_uri}{userinfo}")),
            };
        }
        settings
    }

    /// An HTTP request carrying the given cookies
    #[must_use]
    pub fn request_with_cookies(cookies: &[Cookie<'static>]) -> HttpRequest {
        cookies
            .iter()
            .fold(test::TestRequest::default(), |req, cookie| {
                req.cookie(cookie.clone())
            })
            .to_http_request()
    }

    fn provider_mut(settings: &mut LoginSettings, network: Network) -> &mut ProviderSettings {
        match network {
            Network::Twitter => &mut settings.providers.twitter,
            Network::Yahoo => &mut settings.providers.yahoo,
            Network::Facebook | Network::Email => &mut settings.providers.facebook,
        }
    }
}
