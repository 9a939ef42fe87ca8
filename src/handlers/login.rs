// Login page and logout
use actix_web::{web, HttpRequest, HttpResponse};
use log::error;
use serde::Deserialize;

use crate::error::LoginError;
use crate::login::{LoginOrchestrator, LoginPage};
use crate::utils::responses::ResponseBuilder;

use super::page::render_sign_in_page;
use super::respond;

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// `GET|POST /login`
pub async fn login(
    req: HttpRequest,
    query: web::Query<LoginQuery>,
    orchestrator: web::Data<LoginOrchestrator>,
) -> HttpResponse {
    let sessions = orchestrator.sessions();
    let mut ctx = sessions.context_from_request(&req);

    match orchestrator.login_page(&mut ctx, query.next.as_deref()) {
        LoginPage::Continue(outcome) => respond(sessions, &ctx, outcome),
        LoginPage::SignIn {
            next,
            networks,
            message,
        } => match sessions.response_cookies(&ctx) {
            Ok(cookies) => ResponseBuilder::ok().with_cookies(cookies).html(
                render_sign_in_page(&networks, next.as_deref(), message.as_deref()),
            ),
            Err(e) => {
                error!("Failed to build session cookies: {e}");
                ResponseBuilder::error(
                    &LoginError::internal("Failed to write session cookies"),
                    Vec::new(),
                )
            }
        },
    }
}

/// `GET /logout`
pub async fn logout(req: HttpRequest, orchestrator: web::Data<LoginOrchestrator>) -> HttpResponse {
    let sessions = orchestrator.sessions();
    let mut ctx = sessions.context_from_request(&req);

    let outcome = orchestrator.logout(&mut ctx);
    respond(sessions, &ctx, outcome)
}
