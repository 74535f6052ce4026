use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A 4xx whose body carried a human-readable message. The message is
    /// exactly what gets shown next to the triggering form.
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized - credential may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data.
    /// Error bodies are arbitrary text (HTML error pages included), so
    /// the cut must land on a UTF-8 character boundary.
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 | 401 | 403 => match extract_message(body) {
                Some(msg) => ApiError::Validation(msg),
                None if status.as_u16() == 401 => ApiError::Unauthorized,
                None => ApiError::Validation(truncated),
            },
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// The message suitable for showing to the user, if this error
    /// carries one.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            ApiError::Validation(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Pull the most specific human-readable message out of a JSON error
/// payload. Field-level `non_field_errors` wins over `detail`, which
/// wins over the generic `error` key.
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    if let Some(msg) = value
        .get("non_field_errors")
        .and_then(|v| v.get(0))
        .and_then(|v| v.as_str())
    {
        return Some(msg.to_string());
    }

    for key in ["detail", "error"] {
        if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
            return Some(msg.to_string());
        }
    }

    None
}
