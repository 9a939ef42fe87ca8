use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity networks known to the login flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Twitter,
    Facebook,
    Yahoo,
    Email,
}

impl Network {
    /// Networks that authenticate through a third-party provider and can be
    /// linked to or unlinked from an account
    pub const THIRD_PARTY: [Network; 3] = [Network::Twitter, Network::Facebook, Network::Yahoo];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Yahoo => "yahoo",
            Self::Email => "email",
        }
    }

    /// Human-readable provider name used in messages
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Twitter => "Twitter",
            Self::Facebook => "Facebook",
            Self::Yahoo => "Yahoo!",
            Self::Email => "Email",
        }
    }

    #[must_use]
    pub fn is_third_party(self) -> bool {
        Self::THIRD_PARTY.contains(&self)
    }

    /// Parse a network name accepting only third-party providers
    #[must_use]
    pub fn third_party(name: &str) -> Option<Self> {
        name.parse::<Self>().ok().filter(|network| network.is_third_party())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "twitter" => Ok(Self::Twitter),
            "facebook" => Ok(Self::Facebook),
            "yahoo" => Ok(Self::Yahoo),
            "email" => Ok(Self::Email),
            other => Err(format!("Unknown network: {other}")),
        }
    }
}

/// Identity asserted by a provider adapter (or supplied directly for email links)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    network: Network,
    external_id: String,
    display_name: Option<String>,
    username: Option<String>,
    email: Option<String>,
}

impl ProviderIdentity {
    /// Build an identity; `external_id` must be non-empty
    ///
    /// # Errors
    ///
    /// Returns an error if `external_id` is empty
    pub fn new(network: Network, external_id: impl Into<String>) -> Result<Self, String> {
        let external_id = external_id.into();
        if external_id.is_empty() {
            return Err(format!("Empty external id for {network} identity"));
        }
        Ok(Self {
            network,
            external_id,
            display_name: None,
            username: None,
            email: None,
        })
    }

    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name.filter(|n| !n.is_empty());
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.is_empty());
        self
    }

    #[must_use]
    pub fn network(&self) -> Network {
        self.network
    }

    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

/// Canonical account record handed to the session service and the signup flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub network: Network,
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

impl From<&ProviderIdentity> for Account {
    fn from(identity: &ProviderIdentity) -> Self {
        Self {
            network: identity.network,
            id: identity.external_id.clone(),
            name: identity.display_name.clone().unwrap_or_default(),
            username: identity.username.clone().unwrap_or_default(),
            email: identity.email.clone().unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
