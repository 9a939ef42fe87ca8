use serde_json::Value;

use crate::models::Network;
use crate::oauth::{OAuth1Dialect, ProviderEndpoints};

pub struct Twitter;

impl OAuth1Dialect for Twitter {
    const NETWORK: Network = Network::Twitter;
    const LABEL: &'static str = "Twitter";
    const ID_PARAM: &'static str = "user_id";
    const USERNAME_PARAM: Option<&'static str> = Some("screen_name");

    fn default_endpoints() -> ProviderEndpoints {
        ProviderEndpoints {
            request_token: "https://api.twitter.com/oauth/request_token".to_string(),
            authorization: "https://api.twitter.com/oauth/authenticate".to_string(),
            token: "https://api.twitter.com/oauth/access_token".to_string(),
            userinfo: "https://api.twitter.com/1.1/account/verify_credentials.json".to_string(),
        }
    }

    fn profile_url(endpoints: &ProviderEndpoints, _external_id: &str) -> String {
        endpoints.userinfo.clone()
    }

    fn display_name_from_profile(profile: &Value) -> Option<String> {
        profile
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
    }
}
