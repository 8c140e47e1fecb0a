use thiserror::Error;

/// Caller-side input errors. Surfaced as 4xx responses, never swallowed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("page must be a positive integer, got {0}")]
    InvalidPage(i64),

    #[error("pageSize must be a positive integer, got {0}")]
    InvalidPageSize(i64),

    #[error("malformed value for {field}: {value:?}")]
    Malformed { field: &'static str, value: String },

    #[error("unknown city: {0}")]
    UnknownCity(String),

    #[error("invalid listing: {0}")]
    InvalidListing(String),
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ValidationError::InvalidListing(errors.to_string())
    }
}

/// Reject non-positive pagination parameters
pub fn validate_pagination(page: i64, page_size: i64) -> Result<(usize, usize), ValidationError> {
    if page <= 0 {
        return Err(ValidationError::InvalidPage(page));
    }
    if page_size <= 0 {
        return Err(ValidationError::InvalidPageSize(page_size));
    }

    Ok((page as usize, page_size as usize))
}
