// Provider sign-in, account unlinking and email token login
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::collections::HashMap;

use crate::login::LoginOrchestrator;

use super::respond;

#[derive(Deserialize)]
pub struct UnlinkForm {
    #[serde(default)]
    pub network: String,
}

/// `GET /auth/{network}`: provider start leg or callback
pub async fn auth_network(
    req: HttpRequest,
    network: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
    orchestrator: web::Data<LoginOrchestrator>,
) -> HttpResponse {
    let sessions = orchestrator.sessions();
    let mut ctx = sessions.context_from_request(&req);

    let outcome = orchestrator
        .begin_or_callback(&mut ctx, &network, &query)
        .await;
    respond(sessions, &ctx, outcome)
}

/// `POST /unlink` with form field `network`
pub async fn unlink(
    req: HttpRequest,
    form: web::Form<UnlinkForm>,
    orchestrator: web::Data<LoginOrchestrator>,
) -> HttpResponse {
    let sessions = orchestrator.sessions();
    let ctx = sessions.context_from_request(&req);

    let outcome = orchestrator.unlink(&ctx, &form.network).await;
    respond(sessions, &ctx, outcome)
}

/// `GET /login/email/{token}`
pub async fn email_token_login(
    req: HttpRequest,
    token: web::Path<String>,
    orchestrator: web::Data<LoginOrchestrator>,
) -> HttpResponse {
    let sessions = orchestrator.sessions();
    let mut ctx = sessions.context_from_request(&req);

    let outcome = orchestrator.email_token_login(&mut ctx, &token).await;
    respond(sessions, &ctx, outcome)
}
