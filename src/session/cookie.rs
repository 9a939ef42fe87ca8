use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

use crate::session::ticket::SessionTicket;
use crate::utils::crypto::{decrypt_data, encrypt_data};

pub const SESSION_COOKIE: &str = "session";
pub const JAR_COOKIE: &str = "jar";

/// Encrypting cookie builder for the session ticket and the correlation jar
///
/// Both cookies are sealed with AES-256-GCM, so a client can carry them but
/// neither read nor alter them. Both are `SameSite=Lax`: they must come back
/// on the provider's top-level redirect to `/auth/{network}`.
#[derive(Clone)]
pub struct CookieFactory {
    encryption_key: [u8; 32],
    cookie_secure: bool,
    session_max_age: Duration,
    jar_max_age: Duration,
}

impl CookieFactory {
    #[must_use]
    pub fn new(
        encryption_key: [u8; 32],
        cookie_secure: bool,
        session_duration_hours: u64,
        jar_duration_minutes: u64,
    ) -> Self {
        Self {
            encryption_key,
            cookie_secure,
            session_max_age: Duration::hours(i64::try_from(session_duration_hours).unwrap_or(24)),
            jar_max_age: Duration::minutes(i64::try_from(jar_duration_minutes).unwrap_or(15)),
        }
    }

    fn sealed<T: Serialize>(
        &self,
        name: &'static str,
        data: &T,
        max_age: Duration,
    ) -> Result<Cookie<'static>> {
        let value = encrypt_data(data, &self.encryption_key)?;
        Ok(self.base(name, value, max_age))
    }

    fn base(&self, name: &str, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build(name.to_owned(), value)
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(max_age)
            .finish()
    }

    /// Encrypted session cookie holding the ticket
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_session_cookie(&self, ticket: &SessionTicket) -> Result<Cookie<'static>> {
        self.sealed(SESSION_COOKIE, ticket, self.session_max_age)
    }

    /// Short-lived correlation jar cookie
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails
    pub fn create_jar_cookie<T: Serialize>(&self, contents: &T) -> Result<Cookie<'static>> {
        let cookie = self.sealed(JAR_COOKIE, contents, self.jar_max_age)?;
        log::debug!("Writing jar cookie ({} bytes sealed)", cookie.value().len());
        Ok(cookie)
    }

    /// Empty, already-expired cookie that makes the browser drop `name`
    #[must_use]
    pub fn create_expired_cookie(&self, name: &str) -> Cookie<'static> {
        self.base(name, String::new(), Duration::seconds(-1))
    }

    /// Decrypt a cookie from the request
    ///
    /// Tampered, stale or foreign values are indistinguishable from absent ones.
    #[must_use]
    pub fn read_cookie<T: DeserializeOwned>(&self, req: &HttpRequest, name: &str) -> Option<T> {
        let cookie = req.cookie(name).filter(|cookie| !cookie.value().is_empty())?;
        decrypt_data::<T>(cookie.value(), &self.encryption_key)
            .map_err(|e| log::warn!("Discarding unreadable {name} cookie: {e}"))
            .ok()
    }
}
