use serde_json::Value;

use crate::models::Network;
use crate::oauth::{OAuth1Dialect, ProviderEndpoints};

pub struct Yahoo;

impl OAuth1Dialect for Yahoo {
    const NETWORK: Network = Network::Yahoo;
    const LABEL: &'static str = "Yahoo";
    const ID_PARAM: &'static str = "xoauth_yahoo_guid";

    fn default_endpoints() -> ProviderEndpoints {
        ProviderEndpoints {
            request_token: "https://api.login.yahoo.com/oauth/v2/get_request_token".to_string(),
            authorization: "https://api.login.yahoo.com/oauth/v2/request_auth".to_string(),
            token: "https://api.login.yahoo.com/oauth/v2/get_token".to_string(),
            userinfo: "https://social.yahooapis.com/v1/user".to_string(),
        }
    }

    /// `{userinfo}/{guid}/profile?format=json`
    fn profile_url(endpoints: &ProviderEndpoints, external_id: &str) -> String {
        format!(
            "{}/{}/profile?format=json",
            endpoints.userinfo.trim_end_matches('/'),
            urlencoding::encode(external_id)
        )
    }

    fn display_name_from_profile(profile: &Value) -> Option<String> {
        profile
            .pointer("/profile/nickname")
            .and_then(Value::as_str)
            .filter(|nickname| !nickname.is_empty())
            .map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::{OAuth1Adapter, ProviderAdapter, ProviderConfig};
    use crate::session::{CorrelationRecord, CorrelationStore, Jar};
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> OAuth1Adapter<Yahoo> {
        let uri = server.uri();
        OAuth1Adapter::new(
            reqwest::Client::new(),
            ProviderConfig {
                client_id: "ck".to_string(),
                client_secret: "cs".to_string(),
                callback_uri: "http://localhost:8000/auth/yahoo".to_string(),
                endpoints: ProviderEndpoints {
                    request_token: format!("{uri}/oauth/v2/get_request_token"),
                    authorization: format!("{uri}/oauth/v2/request_auth"),
                    token: format!("{uri}/oauth/v2/get_token"),
                    userinfo: format!("{uri}/v1/user"),
                },
            },
        )
    }

    #[test]
    fn test_profile_url() {
        let endpoints = Yahoo::default_endpoints();
        assert_eq!(
            Yahoo::profile_url(&endpoints, "GUID1"),
            "https://social.yahooapis.com/v1/user/GUID1/profile?format=json"
        );
    }

    #[test]
    fn test_nickname_extraction() {
        assert_eq!(
            Yahoo::display_name_from_profile(&json!({ "profile": { "nickname": "Yo" } })),
            Some("Yo".to_string())
        );
        assert_eq!(
            Yahoo::display_name_from_profile(&json!({ "profile": {} })),
            None
        );
    }

    #[actix_web::test]
    async fn test_start_failure_uses_display_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/get_request_token"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut jar = Jar::new();
        let err = adapter(&server).start(&mut jar, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to obtain a Yahoo! request token");
    }

    #[actix_web::test]
    async fn test_callback_with_nickname() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/get_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "oauth_token=acc&oauth_token_secret=s&xoauth_yahoo_guid=GUID1",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/user/GUID1/profile"))
            .and(query_param("format", "json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "profile": { "nickname": "Yo" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut jar = Jar::new();
        jar.put(
            Network::Yahoo,
            CorrelationRecord::OAuth1 {
                token: "rt".into(),
                secret: "rs".into(),
            },
        );
        let params = HashMap::from([
            ("oauth_token".to_string(), "rt".to_string()),
            ("oauth_verifier".to_string(), "v".to_string()),
        ]);

        let identity = adapter(&server)
            .callback(&mut jar, &params, false)
            .await
            .unwrap();
        assert_eq!(identity.network(), Network::Yahoo);
        assert_eq!(identity.external_id(), "GUID1");
        assert_eq!(identity.display_name(), Some("Yo"));
        assert_eq!(identity.username(), None);
    }

    #[actix_web::test]
    async fn test_missing_guid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/v2/get_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("oauth_token=acc&oauth_token_secret=s"),
            )
            .mount(&server)
            .await;

        let mut jar = Jar::new();
        jar.put(
            Network::Yahoo,
            CorrelationRecord::OAuth1 {
                token: "rt".into(),
                secret: "rs".into(),
            },
        );
        let params = HashMap::from([
            ("oauth_token".to_string(), "rt".to_string()),
            ("oauth_verifier".to_string(), "v".to_string()),
        ]);

        let err = adapter(&server)
            .callback(&mut jar, &params, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid Yahoo access token response");
    }
}
