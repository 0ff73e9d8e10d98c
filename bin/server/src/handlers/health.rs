use actix_web::{get, HttpResponse, Result as ActixResult};
use common::HealthResponse;
use tracing::debug;

/// Liveness probe used by the client and the e2e runner
#[get("/health")]
pub async fn health() -> ActixResult<HttpResponse> {
    debug!("GET /health");
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    }))
}
