use actix_web::{error::InternalError, http::StatusCode, HttpResponse};
use common::MessageResponse;
use tracing::{error, warn};

/// Build an error that renders as `{"message": ...}` with the given status
fn json_error(status: StatusCode, message: &str) -> actix_web::Error {
    InternalError::from_response(
        message.to_string(),
        HttpResponse::build(status).json(MessageResponse::new(message)),
    )
    .into()
}

pub fn bad_request(message: &str) -> actix_web::Error {
    json_error(StatusCode::BAD_REQUEST, message)
}

pub fn unauthorized(message: &str) -> actix_web::Error {
    json_error(StatusCode::UNAUTHORIZED, message)
}

pub fn forbidden(message: &str) -> actix_web::Error {
    warn!("Forbidden: {}", message);
    json_error(StatusCode::FORBIDDEN, message)
}

pub fn not_found(message: &str) -> actix_web::Error {
    json_error(StatusCode::NOT_FOUND, message)
}

/// Helper function for server errors. Details go to the log, not the client
pub fn handle_server_error<E: std::fmt::Display>(msg: &str, e: E) -> actix_web::Error {
    error!("{}: {:#}", msg, e);
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// JSON body for malformed request payloads, used by the extractor configs
pub fn payload_error(err: impl std::fmt::Display) -> actix_web::Error {
    warn!("Rejected request payload: {}", err);
    bad_request(&err.to_string())
}
