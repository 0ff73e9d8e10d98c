use actix_multipart::form::{tempfile::TempFile, MultipartForm};

/// Multipart form for document upload
#[derive(MultipartForm)]
pub struct UploadForm {
    /// The document; its multipart filename is what gets stored
    #[multipart(limit = "25MB")]
    pub file: TempFile,
}

impl UploadForm {
    /// Filename the client sent, if any
    pub fn filename(&self) -> Option<&str> {
        self.file
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
