//! Inbound intake event as published on the document stream.

use serde::{Deserialize, Serialize};

use crate::content::Content;

/// Descriptive block attached to every intake event.
///
/// All values arrive as strings (coded fields included); missing keys
/// deserialize to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventMetadata {
    pub issued_date: String,
    pub confidence_level: String,
    pub process: String,
    pub attachments: Vec<String>,
    pub doc_id: String,
    pub subject: String,
    pub infor_sign: String,
    pub type_name: String,
    pub format: String,
    pub description: String,
    pub language: Vec<String>,
    pub autograph: String,
    pub risk_recovery_status: String,
    pub code_number: String,
    pub number_of_page: String,
    pub mode: String,
    pub organ_name: String,
    pub code_notation: String,
    pub arc_doc_code: String,
    pub schema_id: String,
    pub file_extension: String,
    pub keyword: String,
    pub maintenance: String,
    pub risk_recovery: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestEvent {
    pub metadata: EventMetadata,
    pub party_code: String,
    pub pid: String,
    /// Upstream integration identifier.
    pub id: String,
    pub source: String,
    /// Source type tag: `DOC`, `PIC`, `MEDIA` or `FILE`.
    #[serde(rename = "type")]
    pub kind: String,
    pub fond_code: String,
    pub content: Content,
}

impl IngestEvent {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
