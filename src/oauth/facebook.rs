use serde_json::Value;

use crate::models::{Network, ProviderIdentity};
use crate::oauth::{OAuth2Dialect, ProviderEndpoints};
use crate::utils::user_agent::prefers_touch_display;

/// Relay domain Facebook substitutes for users who hide their address
const PROXY_MAIL_DOMAIN: &str = "proxymail.facebook.com";

pub struct Facebook;

fn string_field(profile: &Value, field: &str) -> Option<String> {
    match profile.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl OAuth2Dialect for Facebook {
    const NETWORK: Network = Network::Facebook;
    const LABEL: &'static str = "Facebook";
    const PROFILE_TOKEN_PARAM: &'static str = "oauth_token";

    fn default_endpoints() -> ProviderEndpoints {
        ProviderEndpoints {
            request_token: String::new(),
            authorization: "https://graph.facebook.com/oauth/authorize".to_string(),
            token: "https://graph.facebook.com/oauth/access_token".to_string(),
            userinfo: "https://graph.facebook.com/me".to_string(),
        }
    }

    fn authorization_params(user_agent: Option<&str>) -> Vec<(&'static str, String)> {
        let display = if prefers_touch_display(user_agent) {
            "touch"
        } else {
            "page"
        };
        vec![
            ("scope", "email".to_string()),
            ("display", display.to_string()),
        ]
    }

    fn identity_from_profile(profile: &Value) -> Result<ProviderIdentity, String> {
        let id = string_field(profile, "id").ok_or_else(|| "missing id".to_string())?;
        let email = string_field(profile, "email").filter(|email| !email.ends_with(PROXY_MAIL_DOMAIN));

        Ok(ProviderIdentity::new(Network::Facebook, id)?
            .with_display_name(string_field(profile, "name"))
            .with_username(string_field(profile, "username"))
            .with_email(email))
    }
}
