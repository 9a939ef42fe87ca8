use crate::models::Network;
use crate::utils::crypto::generate_session_secret;
use serde::{Deserialize, Serialize};
use std::fs;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoginSettings {
    pub application: ApplicationSettings,
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
    pub tos: TosSettings,
    pub providers: ProvidersSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Public origin of this web tier, used to build provider callback URIs
    pub web_base_url: String,
    /// Where an authenticated user lands when no destination was requested
    pub home_view: String,
}

/// Ticketing and account-linking API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,
    /// Timeout applied to every outbound call, API and providers alike
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_secret: String,
    pub session_duration_hours: u64,
    /// Lifetime of the correlation jar cookie
    pub jar_duration_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TosSettings {
    /// Lowest accepted terms-of-service version before the user is sent to /tos
    pub minimum_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersSettings {
    pub twitter: ProviderSettings,
    pub facebook: ProviderSettings,
    pub yahoo: ProviderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderSettings {
    pub enabled: bool,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    // Endpoint overrides; each adapter carries the provider's production URLs
    pub request_token_endpoint: Option<String>,
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            web_base_url: "http://localhost:8000".to_string(),
            home_view: "/view/".to_string(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001".to_string(),
            client_id: None,
            client_secret: None,
            client_id_env: Some("API_CLIENT_ID".to_string()),
            client_secret_env: Some("API_CLIENT_SECRET".to_string()),
            timeout_seconds: 10,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Will be generated if empty
            session_duration_hours: 24 * 30,
            jar_duration_minutes: 15,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self { secure: true }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for TosSettings {
    fn default() -> Self {
        Self {
            minimum_version: 20_110_623,
        }
    }
}

impl Default for ProvidersSettings {
    fn default() -> Self {
        Self {
            twitter: ProviderSettings::for_network(Network::Twitter),
            facebook: ProviderSettings::for_network(Network::Facebook),
            yahoo: ProviderSettings::for_network(Network::Yahoo),
        }
    }
}

impl ProvidersSettings {
    /// Settings for a third-party network; `None` for networks without a provider
    #[must_use]
    pub fn get(&self, network: Network) -> Option<&ProviderSettings> {
        match network {
            Network::Twitter => Some(&self.twitter),
            Network::Facebook => Some(&self.facebook),
            Network::Yahoo => Some(&self.yahoo),
            Network::Email => None,
        }
    }
}

impl LoginSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - TOML parsing fails
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        Self::initialize_logging(&settings.logging)?;
        Ok(settings)
    }

    /// Initialize the `log` backend at the configured level
    fn initialize_logging(logging: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&logging.level);
        builder.try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `LOGIN_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("LOGIN_SECRETS_DIR") {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ LOGIN_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        let app = &mut settings.application;
        env_override("HOST", &mut app.host);
        env_override("PORT", &mut app.port);
        env_override("WEB_BASE_URL", &mut app.web_base_url);
        env_override("HOME_VIEW", &mut app.home_view);

        env_override("API_BASE_URL", &mut settings.api.base_url);
        env_override("API_TIMEOUT_SECONDS", &mut settings.api.timeout_seconds);
        env_override("COOKIE_SECURE", &mut settings.cookies.secure);
        env_override("TOS_MINIMUM_VERSION", &mut settings.tos.minimum_version);
        if !env_override("RUST_LOG", &mut settings.logging.level) {
            env_override("LOG_LEVEL", &mut settings.logging.level);
        }

        Self::apply_session_env_overrides(&mut settings.session);
    }

    /// Apply environment overrides for session settings
    ///
    /// An empty secret is replaced by a random one, which does not survive a
    /// restart.
    pub fn apply_session_env_overrides(session: &mut SessionSettings) {
        env_override("SESSION_DURATION_HOURS", &mut session.session_duration_hours);
        env_override("JAR_DURATION_MINUTES", &mut session.jar_duration_minutes);
        env_override("SESSION_SECRET", &mut session.session_secret);

        if session.session_secret.is_empty() {
            session.session_secret = generate_session_secret();
            eprintln!("⚠️  WARNING: Using auto-generated session secret");
            eprintln!("🔒 Set SESSION_SECRET or session_secret in Settings.toml for production");
            eprintln!("💡 Sessions and in-flight sign-ins will not survive a restart");
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Callback URI registered with a provider for this web tier
    #[must_use]
    pub fn callback_uri(&self, network: Network) -> String {
        format!(
            "{}/auth/{network}",
            self.application.web_base_url.trim_end_matches('/')
        )
    }
}

impl ProviderSettings {
    fn for_network(network: Network) -> Self {
        let prefix = network.as_str().to_uppercase();
        Self {
            enabled: true,
            client_id_env: Some(format!("{prefix}_CLIENT_ID")),
            client_secret_env: Some(format!("{prefix}_CLIENT_SECRET")),
            ..Default::default()
        }
    }

    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        resolve_env_or(self.client_id_env.as_deref(), self.client_id.as_ref())
    }

    /// Get the client secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        resolve_env_or(self.client_secret_env.as_deref(), self.client_secret.as_ref())
    }

    /// Whether the provider can be offered for sign-in
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.enabled && self.get_client_id().is_some() && self.get_client_secret().is_some()
    }
}

impl ApiSettings {
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        resolve_env_or(self.client_id_env.as_deref(), self.client_id.as_ref())
    }

    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        resolve_env_or(self.client_secret_env.as_deref(), self.client_secret.as_ref())
    }
}

/// Overwrite `target` with a non-empty, parseable environment value
///
/// Returns whether the override applied.
fn env_override<T: FromStr>(name: &str, target: &mut T) -> bool {
    match std::env::var(name).ok().filter(|value| !value.is_empty()) {
        Some(value) => match value.parse() {
            Ok(parsed) => {
                *target = parsed;
                true
            }
            Err(_) => {
                eprintln!("ℹ Ignoring unparseable {name}={value}");
                false
            }
        },
        None => false,
    }
}

fn resolve_env_or(env_var: Option<&str>, fallback: Option<&String>) -> Option<String> {
    env_var
        .and_then(|name| std::env::var(name).ok())
        .filter(|value| !value.is_empty())
        .or_else(|| fallback.cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clean_env_vars() {
        for var in [
            "SESSION_SECRET",
            "SESSION_DURATION_HOURS",
            "LOGIN_SECRETS_DIR",
            "WEB_BASE_URL",
            "API_BASE_URL",
            "COOKIE_SECURE",
            "TWITTER_CLIENT_ID",
            "TWITTER_CLIENT_SECRET",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = LoginSettings::default();
        assert_eq!(settings.session.session_secret, "");
        assert_eq!(settings.application.home_view, "/view/");
        assert!(settings.cookies.secure);
        assert_eq!(
            settings.providers.twitter.client_id_env.as_deref(),
            Some("TWITTER_CLIENT_ID")
        );
        assert_eq!(
            settings.providers.yahoo.client_secret_env.as_deref(),
            Some("YAHOO_CLIENT_SECRET")
        );
    }

    #[test]
    fn test_callback_uri() {
        let mut settings = LoginSettings::default();
        settings.application.web_base_url = "https://postmile.net/".to_string();
        assert_eq!(
            settings.callback_uri(Network::Facebook),
            "https://postmile.net/auth/facebook"
        );
    }

    #[test]
    #[serial]
    fn test_session_secret_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings {
            session_secret: "default-secret".to_string(),
            ..Default::default()
        };

        std::env::set_var("SESSION_SECRET", "env-override-secret");
        LoginSettings::apply_session_env_overrides(&mut session_settings);
        assert_eq!(session_settings.session_secret, "env-override-secret");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_secret_generated_when_empty() {
        clean_env_vars();

        let mut session_settings = SessionSettings::default();
        LoginSettings::apply_session_env_overrides(&mut session_settings);
        assert!(!session_settings.session_secret.is_empty());
    }

    #[test]
    #[serial]
    fn test_provider_credentials_env_first() {
        clean_env_vars();

        let mut provider = ProviderSettings::for_network(Network::Twitter);
        provider.client_id = Some("from-file".to_string());
        assert_eq!(provider.get_client_id().as_deref(), Some("from-file"));
        assert!(!provider.is_configured());

        std::env::set_var("TWITTER_CLIENT_ID", "from-env");
        std::env::set_var("TWITTER_CLIENT_SECRET", "secret");
        assert_eq!(provider.get_client_id().as_deref(), Some("from-env"));
        assert!(provider.is_configured());

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clean_env_vars();

        let mut settings = LoginSettings::default();
        std::env::set_var("WEB_BASE_URL", "https://login.example");
        std::env::set_var("API_BASE_URL", "https://api.example");
        std::env::set_var("COOKIE_SECURE", "false");
        std::env::set_var("SESSION_SECRET", "s3cret");

        LoginSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.application.web_base_url, "https://login.example");
        assert_eq!(settings.api.base_url, "https://api.example");
        assert!(!settings.cookies.secure);
        assert_eq!(settings.session.session_secret, "s3cret");

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_unparseable_env_value_is_ignored() {
        std::env::set_var("API_TIMEOUT_SECONDS", "soon");
        let mut timeout = 10u64;
        assert!(!env_override("API_TIMEOUT_SECONDS", &mut timeout));
        assert_eq!(timeout, 10);

        std::env::set_var("API_TIMEOUT_SECONDS", "3");
        assert!(env_override("API_TIMEOUT_SECONDS", &mut timeout));
        assert_eq!(timeout, 3);
        std::env::remove_var("API_TIMEOUT_SECONDS");
    }

    #[test]
    fn test_partial_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[application]
web_base_url = "https://postmile.net"

[tos]
minimum_version = 7

[providers.facebook]
client_id = "fb-id"
client_secret = "fb-secret"
token_endpoint = "http://127.0.0.1:9999/oauth/access_token"
"#
        )
        .unwrap();

        let settings = LoginSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.application.web_base_url, "https://postmile.net");
        assert_eq!(settings.application.port, 8000);
        assert_eq!(settings.tos.minimum_version, 7);
        assert_eq!(
            settings.providers.facebook.client_id.as_deref(),
            Some("fb-id")
        );
        assert_eq!(
            settings.providers.facebook.token_endpoint.as_deref(),
            Some("http://127.0.0.1:9999/oauth/access_token")
        );
        // Sections missing from the file fall back to their defaults
        assert!(settings.providers.twitter.enabled);
    }
}
