use crate::auth::AuthenticatedUser;
use crate::handlers::error::{forbidden, handle_server_error, not_found};
use crate::state::AppState;
use actix_web::{get, web, HttpResponse, Result as ActixResult};
use common::{DownloadLinkResponse, FileEntry};
use tracing::info;

/// List every uploaded document
#[get("/files")]
pub async fn list_files(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    if user.is_ops {
        return Err(forbidden("Ops user cannot list files!"));
    }

    let files: Vec<FileEntry> = state
        .storage
        .list_files()
        .await
        .map_err(|e| handle_server_error("Failed to list files", e))?
        .into_iter()
        .map(|f| FileEntry {
            id: f.id,
            filename: f.filename,
            uploaded_at: f.uploaded_at,
        })
        .collect();

    info!(user_id = user.user_id, count = files.len(), "GET /files");
    Ok(HttpResponse::Ok().json(files))
}

/// Issue a signed, expiring download link for one document
#[get("/files/{file_id}/download-link")]
pub async fn download_link(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let file_id = path.into_inner();
    if user.is_ops {
        return Err(forbidden("Ops user cannot download files!"));
    }

    let file = state
        .storage
        .get_file(file_id)
        .await
        .map_err(|e| handle_server_error("Failed to load file", e))?
        .ok_or_else(|| not_found("File not found!"))?;

    let token = state.download_tokens.issue(file.id);
    info!(
        user_id = user.user_id,
        file_id = file.id,
        "GET /files/{{id}}/download-link - Link issued"
    );

    Ok(HttpResponse::Ok().json(DownloadLinkResponse {
        download_url: state.download_link(&token),
        token,
        expires_in: state.download_tokens.max_age().as_secs(),
    }))
}
