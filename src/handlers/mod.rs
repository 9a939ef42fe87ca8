// HTTP request handlers for the login flows
pub mod auth;
pub mod health;
pub mod login;
pub mod page;


use actix_web::{web, HttpResponse};
use log::error;

use crate::error::LoginError;
use crate::login::Outcome;
use crate::session::{RequestContext, SessionManager};
use crate::utils::responses::ResponseBuilder;

// Re-export the main handler functions
pub use auth::{auth_network, email_token_login, unlink};
pub use health::health;
pub use login::{login, logout};

/// Register every route of the login service
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Login page and logout
        .route("/login", web::get().to(login))
        .route("/login", web::post().to(login))
        .route("/logout", web::get().to(logout))
        // Provider flows and account links
        .route("/auth/{network}", web::get().to(auth_network))
        .route("/unlink", web::post().to(unlink))
        .route("/login/email/{token}", web::get().to(email_token_login))
        // Health endpoint
        .route("/ping", web::get().to(health));
}

/// Render an outcome together with the cookie changes recorded in `ctx`
///
/// The jar is written on every outcome, errors included, so a consumed
/// correlation record stays consumed.
#[must_use]
pub fn respond(sessions: &SessionManager, ctx: &RequestContext, outcome: Outcome) -> HttpResponse {
    let cookies = match sessions.response_cookies(ctx) {
        Ok(cookies) => cookies,
        Err(e) => {
            error!("Failed to build session cookies: {e}");
            return ResponseBuilder::error(
                &LoginError::internal("Failed to write session cookies"),
                Vec::new(),
            );
        }
    };

    match outcome {
        Outcome::Redirect { location, notice } => ResponseBuilder::redirect(&location)
            .with_cookies(cookies)
            .with_notice(notice)
            .build(),
        Outcome::Error(err) => ResponseBuilder::error(&err, cookies),
        Outcome::Result(text) => ResponseBuilder::ok().with_cookies(cookies).text(text),
    }
}
