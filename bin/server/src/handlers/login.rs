use crate::handlers::error::{handle_server_error, unauthorized};
use crate::handlers::signup::normalize_email;
use crate::state::AppState;
use actix_web::{post, web, HttpResponse, Result as ActixResult};
use common::{LoginRequest, LoginResponse};
use crypto::verify_password;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials!";

/// Exchange email and password for an access token
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let req = body.into_inner();
    let email = normalize_email(&req.email);
    info!(email = ?email, "POST /login - Request received");

    let user = state
        .storage
        .find_user_by_email(&email)
        .await
        .map_err(|e| handle_server_error("Failed to look up user", e))?
        .ok_or_else(|| {
            warn!(email = ?email, "POST /login - Unknown email");
            unauthorized(INVALID_CREDENTIALS)
        })?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let matches = web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| handle_server_error("Password check task failed", e))?;
    if !matches {
        warn!(user_id = user.id, "POST /login - Wrong password");
        return Err(unauthorized(INVALID_CREDENTIALS));
    }

    let access_token = state
        .jwt
        .issue(&user)
        .map_err(|e| handle_server_error("Failed to issue access token", e))?;

    info!(user_id = user.id, "POST /login - Access token issued");
    Ok(HttpResponse::Ok().json(LoginResponse { access_token }))
}
