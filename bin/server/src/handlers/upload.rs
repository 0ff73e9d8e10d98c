use crate::auth::AuthenticatedUser;
use crate::handlers::error::{bad_request, forbidden, handle_server_error};
use crate::handlers::upload_form::UploadForm;
use crate::state::AppState;
use actix_multipart::form::MultipartForm;
use actix_web::{post, web, HttpResponse, Result as ActixResult};
use common::{file_utils, UploadResponse};
use tracing::info;

/// Handle document upload (multipart/form-data)
#[post("/upload")]
pub async fn upload(
    user: AuthenticatedUser,
    form: MultipartForm<UploadForm>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    if !user.is_ops {
        return Err(forbidden("Only Ops users can upload files!"));
    }

    let filename = form
        .filename()
        .ok_or_else(|| bad_request("No file provided!"))?
        .to_string();

    // Structured logging with Debug escapes control characters in the name
    info!(
        filename = ?filename,
        user_id = user.user_id,
        "POST /upload - Request received"
    );

    // Rejects path traversal before the extension check
    file_utils::validate_upload_filename(&filename).map_err(|e| bad_request(e.message()))?;

    // Size is already capped by #[multipart(limit)] on UploadForm
    let content = tokio::fs::read(form.file.file.path())
        .await
        .map_err(|e| handle_server_error("Failed to read uploaded file", e))?;

    let record = state
        .storage
        .store_file(user.user_id, &filename, &content)
        .await
        .map_err(|e| handle_server_error("Failed to store file", e))?;

    info!(
        filename = ?filename,
        file_id = record.id,
        size = content.len(),
        "POST /upload - File uploaded"
    );

    Ok(HttpResponse::Created().json(UploadResponse {
        message: "File uploaded successfully!".to_string(),
        file_id: record.id,
    }))
}
