//! Outbound OCR job request, consumed by the external OCR worker.

use serde::{Deserialize, Serialize};

use crate::document::{DocumentId, FileType};

/// One extracted text fragment attached to a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailContent {
    pub id: String,
    pub created_time: String,
    pub index: u32,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrJobRequest {
    pub document_id: DocumentId,
    pub priority: i32,
    /// RFC 3339.
    pub document_created_time: String,
    pub is_detect_face: bool,
    pub file_type: FileType,
    pub original_lang_code: String,
    pub translate_lang_code: String,
    pub title: String,
    pub subject: Option<String>,
    pub detail_content: Vec<DetailContent>,
}
