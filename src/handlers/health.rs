use actix_web::HttpResponse;

use crate::models::HealthResponse;
use crate::utils::responses::ResponseBuilder;

/// `GET /ping`
pub async fn health() -> HttpResponse {
    ResponseBuilder::ok().json(&HealthResponse {
        status: "ok".to_string(),
        message: "Federated login service is running".to_string(),
    })
}
