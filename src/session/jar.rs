//! Client-held correlation jar
//!
//! The jar is a small key/value map sealed into one encrypted cookie. It carries
//! the state that has to survive a provider redirect round trip: the OAuth
//! request token or anti-forgery state of an in-flight sign-in (one entry per
//! provider), the post-login destination, a pending signup profile and a
//! one-shot notice for the next page.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::{Account, Network};
use crate::utils::redirect_validator::is_local_destination;

const AUTH_KEY: &str = "auth";
const SIGNUP_KEY: &str = "signup";
const MESSAGE_KEY: &str = "message";

/// Per-provider record proving a callback belongs to a flow started here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrelationRecord {
    /// OAuth 1.0a request token pair
    OAuth1 { token: String, secret: String },
    /// OAuth 2.0 anti-forgery state
    OAuth2 { state: String },
}

/// Provider-scoped storage for correlation records
///
/// Records written for one provider are never visible under another. `get`
/// does not consume; callers `invalidate` once the callback has validated.
pub trait CorrelationStore: Send {
    fn put(&mut self, network: Network, record: CorrelationRecord);

    fn get(&self, network: Network) -> Option<CorrelationRecord>;

    fn invalidate(&mut self, network: Network);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct AuthEntry {
    next: String,
}

/// Decrypted jar contents plus a modification flag
#[derive(Debug, Clone, Default)]
pub struct Jar {
    entries: BTreeMap<String, Value>,
    modified: bool,
}

impl Jar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a jar from the entries found in its cookie
    #[must_use]
    pub fn from_entries(entries: BTreeMap<String, Value>) -> Self {
        Self {
            entries,
            modified: false,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
        self.modified = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Whether the cookie has to be re-emitted
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remember where to go after sign-in; non-local paths are ignored
    ///
    /// Returns whether the destination was stored.
    pub fn set_destination(&mut self, next: &str) -> bool {
        if !is_local_destination(next) {
            return false;
        }
        let mut entry = serde_json::Map::new();
        entry.insert("next".to_string(), Value::String(next.to_string()));
        self.set(AUTH_KEY, Value::Object(entry));
        true
    }

    /// Consume the stored post-login destination
    pub fn take_destination(&mut self) -> Option<String> {
        let entry = self.remove(AUTH_KEY)?;
        serde_json::from_value::<AuthEntry>(entry)
            .ok()
            .map(|auth| auth.next)
            .filter(|next| is_local_destination(next))
    }

    #[must_use]
    pub fn destination(&self) -> Option<String> {
        self.entry(AUTH_KEY)
            .and_then(|entry| serde_json::from_value::<AuthEntry>(entry.clone()).ok())
            .map(|auth| auth.next)
    }

    pub fn set_message(&mut self, message: &str) {
        self.set(MESSAGE_KEY, Value::String(message.to_string()));
    }

    /// Consume the one-shot notice
    pub fn take_message(&mut self) -> Option<String> {
        match self.remove(MESSAGE_KEY)? {
            Value::String(message) => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.entry(MESSAGE_KEY).and_then(Value::as_str)
    }

    /// Stash the profile of a not-yet-registered user for the signup form
    pub fn set_signup(&mut self, account: &Account) {
        if let Ok(value) = serde_json::to_value(account) {
            self.set(SIGNUP_KEY, value);
        }
    }

    #[must_use]
    pub fn signup(&self) -> Option<Account> {
        self.entry(SIGNUP_KEY)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl CorrelationStore for Jar {
    fn put(&mut self, network: Network, record: CorrelationRecord) {
        if let Ok(value) = serde_json::to_value(&record) {
            self.set(network.as_str(), value);
        }
    }

    fn get(&self, network: Network) -> Option<CorrelationRecord> {
        self.entries
            .get(network.as_str())
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    fn invalidate(&mut self, network: Network) {
        self.remove(network.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_are_provider_scoped() {
        let mut jar = Jar::new();
        jar.put(
            Network::Twitter,
            CorrelationRecord::OAuth1 {
                token: "t".into(),
                secret: "s".into(),
            },
        );

        assert!(CorrelationStore::get(&jar, Network::Yahoo).is_none());
        assert_eq!(
            CorrelationStore::get(&jar, Network::Twitter),
            Some(CorrelationRecord::OAuth1 {
                token: "t".into(),
                secret: "s".into()
            })
        );
    }

    #[test]
    fn test_record_layout() {
        let mut jar = Jar::new();
        jar.put(
            Network::Facebook,
            CorrelationRecord::OAuth2 {
                state: "abc".into(),
            },
        );
        assert_eq!(jar.entry("facebook"), Some(&json!({ "state": "abc" })));
    }

    #[test]
    fn test_get_does_not_consume_and_invalidate_does() {
        let mut jar = Jar::new();
        jar.put(
            Network::Facebook,
            CorrelationRecord::OAuth2 {
                state: "abc".into(),
            },
        );

        assert!(CorrelationStore::get(&jar, Network::Facebook).is_some());
        assert!(CorrelationStore::get(&jar, Network::Facebook).is_some());

        jar.invalidate(Network::Facebook);
        assert!(CorrelationStore::get(&jar, Network::Facebook).is_none());
    }

    #[test]
    fn test_destination_filtering() {
        let mut jar = Jar::new();
        assert!(!jar.set_destination("http://evil.example/x"));
        assert!(!jar.is_modified());
        assert!(jar.destination().is_none());

        assert!(jar.set_destination("/account/foo"));
        assert_eq!(jar.entry("auth"), Some(&json!({ "next": "/account/foo" })));
        assert_eq!(jar.take_destination().as_deref(), Some("/account/foo"));
        assert!(jar.take_destination().is_none());
    }

    #[test]
    fn test_tampered_destination_not_returned() {
        let mut jar = Jar::from_entries(
            [("auth".to_string(), json!({ "next": "//evil.example" }))]
                .into_iter()
                .collect(),
        );
        assert!(jar.take_destination().is_none());
    }

    #[test]
    fn test_modification_tracking() {
        let mut jar = Jar::from_entries(BTreeMap::new());
        assert!(!jar.is_modified());

        jar.remove("missing");
        assert!(!jar.is_modified());

        jar.set_message("hello");
        assert!(jar.is_modified());
        assert_eq!(jar.take_message().as_deref(), Some("hello"));
        assert!(jar.is_empty());
    }

    #[test]
    fn test_signup_stash() {
        let account = Account {
            network: Network::Twitter,
            id: "12".into(),
            name: "Jack".into(),
            username: "jack".into(),
            email: String::new(),
        };
        let mut jar = Jar::new();
        jar.set_signup(&account);
        assert_eq!(jar.signup(), Some(account));
        assert_eq!(jar.entry("signup").unwrap()["network"], "twitter");
    }
}
