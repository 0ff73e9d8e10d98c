use crate::auth::AuthenticatedUser;
use crate::handlers::error::{forbidden, handle_server_error, not_found};
use crate::state::AppState;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, web, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

const INVALID_URL: &str = "Invalid or expired URL!";

/// MIME type for the stored document kinds
fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Serve a document behind a signed download link
#[get("/download/{token}")]
pub async fn download(
    user: AuthenticatedUser,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let token = path.into_inner();

    // Order: token, then file, then role
    let file_id = state.download_tokens.verify(&token).map_err(|e| {
        warn!(user_id = user.user_id, "GET /download - {}", e);
        forbidden(INVALID_URL)
    })?;

    let file = state
        .storage
        .get_file(file_id)
        .await
        .map_err(|e| handle_server_error("Failed to load file", e))?
        .ok_or_else(|| not_found("File not found!"))?;

    if user.is_ops {
        return Err(forbidden("Ops user cannot download files!"));
    }

    let content = state
        .storage
        .read_file_content(file.id)
        .await
        .map_err(|e| handle_server_error("Failed to read file", e))?;

    // Spend the link only once the bytes are in hand
    let first_use = state
        .redeem_link(&state.download_tokens, &token)
        .await
        .map_err(|e| handle_server_error("Failed to record used link", e))?;
    if !first_use {
        return Err(forbidden(INVALID_URL));
    }

    info!(
        user_id = user.user_id,
        file_id = file.id,
        size = content.len(),
        "GET /download - Serving file"
    );

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&file.filename))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.filename)],
        })
        .body(content))
}
