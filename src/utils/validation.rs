use anyhow::{Result, anyhow};
use unicode_normalization::UnicodeNormalization;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Maximum length of a stored upload name
const MAX_FILENAME_LEN: usize = 255;

/// Device names Windows refuses as file names
const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "AUX", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3", "PRN", "NUL",
];

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Signup form as posted by the browser
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CredentialsForm {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

/// First human-readable message out of a `validator` failure.
pub fn first_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid input".to_string())
}

/// Reduces a client supplied filename to a flat ASCII name that is safe to
/// join onto the upload directory.
///
/// Accents are folded to their base letter (`ñ` → `n`, via NFKD) and other
/// non-ASCII characters vanish. Path separators become spaces, whitespace runs
/// collapse to `_`, anything outside `[A-Za-z0-9_.-]` is dropped and leading/trailing `.`/`_` are
/// stripped, so `../../etc/passwd` ends up as `etc_passwd`.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let folded: String = filename.nfkd().filter(char::is_ascii).collect();
    let flattened = folded.replace(['/', '\\'], " ");

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let mut sanitized = filtered.trim_matches(|c| c == '.' || c == '_').to_string();

    if sanitized.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("Filename '{}' has no usable characters", filename),
        }));
    }

    let stem = sanitized.split('.').next().unwrap_or_default().to_uppercase();
    if WINDOWS_DEVICE_NAMES.contains(&stem.as_str()) {
        sanitized = format!("_{}", sanitized);
    }

    // ASCII only at this point, so byte truncation is char-safe
    sanitized.truncate(MAX_FILENAME_LEN);

    Ok(sanitized)
}
