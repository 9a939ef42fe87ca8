//! HTTP response construction
//!
//! One place for the shapes the login handlers emit: redirects carrying
//! cookies and an optional notice, HTML pages, plain text, JSON, and
//! `LoginError` payloads with the flow's cookies attached.

use actix_web::{cookie::Cookie, http::header, HttpResponse, HttpResponseBuilder, ResponseError};
use log::warn;

use crate::error::LoginError;

/// Unified response builder that handles all types of HTTP responses
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create a redirect response (302 Found) with optional cookies
    #[must_use]
    pub fn redirect(location: &str) -> RedirectBuilder {
        RedirectBuilder::new(location)
    }

    /// Create an OK response (200)
    #[must_use]
    pub fn ok() -> BodyResponseBuilder {
        BodyResponseBuilder::new(HttpResponse::Ok())
    }

    /// Render a `LoginError` and attach cookies to it
    #[must_use]
    pub fn error(err: &LoginError, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut response = err.error_response();
        for cookie in cookies {
            if let Err(e) = response.add_cookie(&cookie) {
                warn!("Failed to attach cookie {} to error response: {e}", cookie.name());
            }
        }
        response
    }
}

/// Builder for redirect responses
pub struct RedirectBuilder {
    location: String,
    cookies: Vec<Cookie<'static>>,
    notice: Option<String>,
}

impl RedirectBuilder {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            cookies: Vec::new(),
            notice: None,
        }
    }

    /// Add a cookie to the redirect response
    #[must_use]
    pub fn with_cookie(mut self, cookie: Cookie<'static>) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Add multiple cookies to the redirect response
    #[must_use]
    pub fn with_cookies(mut self, mut cookies: Vec<Cookie<'static>>) -> Self {
        self.cookies.append(&mut cookies);
        self
    }

    /// Informational text sent as the redirect body
    #[must_use]
    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }

    /// Build the final redirect response
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in self.cookies {
            builder.cookie(cookie);
        }
        builder.append_header((header::LOCATION, self.location));

        match self.notice {
            Some(notice) => builder
                .content_type("text/plain; charset=utf-8")
                .body(notice),
            None => builder.finish(),
        }
    }
}

/// Builder for responses with a body
pub struct BodyResponseBuilder {
    builder: HttpResponseBuilder,
}

impl BodyResponseBuilder {
    fn new(builder: HttpResponseBuilder) -> Self {
        Self { builder }
    }

    #[must_use]
    pub fn with_cookies(mut self, cookies: Vec<Cookie<'static>>) -> Self {
        for cookie in cookies {
            self.builder.cookie(cookie);
        }
        self
    }

    #[must_use]
    pub fn html(mut self, body: String) -> HttpResponse {
        self.builder.content_type("text/html; charset=utf-8").body(body)
    }

    #[must_use]
    pub fn text(mut self, body: String) -> HttpResponse {
        self.builder.content_type("text/plain; charset=utf-8").body(body)
    }

    /// Build the response with JSON content
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, data: &T) -> HttpResponse {
        self.builder.json(data)
    }
}
