use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

// Control characters, encoded CR/LF/NUL/backslash and bidi/zero-width marks
static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\x00-\x1F\x7F]|%(?:00|0[ad]|5c)|\\|[\u{200E}\u{200F}\u{2060}-\u{2064}]")
        .unwrap()
});

const MAX_DESTINATION_LENGTH: usize = 2048;

/// Check whether a post-login destination is a same-origin relative path
///
/// Only paths starting with a single `/` qualify. Protocol-relative (`//host`)
/// and backslash variants are refused since browsers resolve them off-site.
#[must_use]
pub fn is_local_destination(destination: &str) -> bool {
    if !destination.starts_with('/') || destination.starts_with("//") {
        return false;
    }

    if destination.len() > MAX_DESTINATION_LENGTH {
        warn!(
            "Refusing excessively long destination: {} characters",
            destination.len()
        );
        return false;
    }

    if SUSPICIOUS_PATTERN.is_match(destination) {
        warn!("Refusing destination with suspicious characters");
        return false;
    }

    true
}

/// Return the destination when it passes [`is_local_destination`]
#[must_use]
pub fn validate_local_destination(destination: Option<&str>) -> Option<String> {
    let destination = destination?;
    if is_local_destination(destination) {
        debug!("Accepted post-login destination: {destination}");
        Some(destination.to_string())
    } else {
        debug!("Dropped non-local post-login destination");
        None
    }
}
