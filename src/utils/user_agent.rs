// User agent extraction and platform detection utilities
use actix_web::HttpRequest;

/// Extract the raw `User-Agent` header value, if any
#[must_use]
pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(ToString::to_string)
}

/// Derive platform from User-Agent string
#[must_use]
pub fn derive_platform_from_user_agent(user_agent: &str) -> &'static str {
    let ua_lower = user_agent.to_lowercase();

    if ua_lower.contains("iphone") {
        "iPhone"
    } else if ua_lower.contains("ipad") {
        "iPad"
    } else if ua_lower.contains("android") {
        "Android"
    } else if ua_lower.contains("windows") {
        "Windows"
    } else if ua_lower.contains("macintosh") || ua_lower.contains("mac os") {
        "macOS"
    } else if ua_lower.contains("linux") {
        "Linux"
    } else {
        "Unknown"
    }
}

/// Whether the agent should get the provider's touch-optimised login dialog
#[must_use]
pub fn prefers_touch_display(user_agent: Option<&str>) -> bool {
    user_agent.is_some_and(|ua| derive_platform_from_user_agent(ua) == "iPhone")
}
