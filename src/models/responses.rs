use serde::{Deserialize, Serialize};
use crate::models::domain::{Listing, TagSet};

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterResult {
    pub items: Vec<Listing>,
    pub total: usize,
    pub pages: usize,
    #[serde(rename = "currentPage")]
    pub current_page: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Tag preview response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagPreviewResponse {
    pub tags: TagSet,
    pub count: usize,
}

/// Delete response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}
