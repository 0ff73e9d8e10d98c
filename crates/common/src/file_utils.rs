use std::path::Path;

/// Office document extensions accepted for upload
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["pptx", "docx", "xlsx"];

/// Longest filename accepted, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// Error type for filename validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilenameValidationError {
    Empty,
    TooLong,
    ContainsNullByte,
    ContainsPathSeparator,
    IsSpecialDirectory,
    InvalidFileName,
    UnsupportedExtension,
}

impl FilenameValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            FilenameValidationError::Empty => "Filename cannot be empty",
            FilenameValidationError::TooLong => "Filename cannot exceed 255 bytes",
            FilenameValidationError::ContainsNullByte => "Filename cannot contain null bytes",
            FilenameValidationError::ContainsPathSeparator => {
                "Filename cannot contain path separators (/ or \\)"
            }
            FilenameValidationError::IsSpecialDirectory => "Filename cannot be '.' or '..'",
            FilenameValidationError::InvalidFileName => {
                "Invalid filename: must be a valid file name"
            }
            FilenameValidationError::UnsupportedExtension => {
                "Only pptx, docx, and xlsx files are allowed!"
            }
        }
    }
}

impl std::fmt::Display for FilenameValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for FilenameValidationError {}

/// Reject anything that is not a plain file name, so it can never escape the
/// directory it is stored in
pub fn validate_filename(filename: &str) -> Result<(), FilenameValidationError> {
    if filename.is_empty() {
        return Err(FilenameValidationError::Empty);
    }
    if filename.len() > MAX_FILENAME_LEN {
        return Err(FilenameValidationError::TooLong);
    }
    if filename.contains('\0') {
        return Err(FilenameValidationError::ContainsNullByte);
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(FilenameValidationError::ContainsPathSeparator);
    }
    if filename == "." || filename == ".." {
        return Err(FilenameValidationError::IsSpecialDirectory);
    }

    // file_name() must give back exactly what we were handed
    if Path::new(filename).file_name().and_then(|n| n.to_str()) != Some(filename) {
        return Err(FilenameValidationError::InvalidFileName);
    }

    Ok(())
}

/// True when the filename ends in one of the office extensions (case-insensitive)
pub fn has_allowed_extension(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Full check applied to an uploaded document's name
pub fn validate_upload_filename(filename: &str) -> Result<(), FilenameValidationError> {
    validate_filename(filename)?;
    if !has_allowed_extension(filename) {
        return Err(FilenameValidationError::UnsupportedExtension);
    }
    Ok(())
}
