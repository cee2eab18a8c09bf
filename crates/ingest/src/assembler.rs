//! Builds the canonical [`Document`] from an intake event.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use docintake_core::codes;
use docintake_core::config::IntakeConfig;
use docintake_core::{
    ApproveStatus, BackupStatus, Document, DocumentStatus, FileType, IngestEvent, ProcessStatus,
};

/// Target language for every intake document: keep the original.
pub const TRANSLATE_LANG_CODE: &str = "org";

/// Upstream issued-date layout.
pub const ISSUED_DATE_FORMAT: &str = "%d/%m/%Y";

pub fn classify_file_type(tag: &str) -> FileType {
    match tag {
        "DOC" | "FILE" => FileType::Doc,
        "PIC" => FileType::Image,
        "MEDIA" => FileType::Video,
        other => {
            debug!(tag = other, "Unrecognized source type tag");
            FileType::Unclassified
        }
    }
}

/// `DD/MM/YYYY` at midnight UTC. Anything else, including years past 9999,
/// is treated as unknown.
pub fn parse_issued_date(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(raw, ISSUED_DATE_FORMAT).ok()?;
    if !(0..=9999).contains(&date.year()) {
        return None;
    }
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Comma split with no trimming or filtering; `""` yields `[""]`.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

pub struct DocumentAssembler {
    intake: IntakeConfig,
}

impl DocumentAssembler {
    pub fn new(intake: IntakeConfig) -> Self {
        Self { intake }
    }

    pub fn assemble(&self, event: &IngestEvent) -> Result<Document, serde_json::Error> {
        self.assemble_at(event, Utc::now())
    }

    /// Assemble with an explicit clock. Fails only if the event cannot be
    /// re-serialized into the metadata blob.
    pub fn assemble_at(
        &self,
        event: &IngestEvent,
        now: DateTime<Utc>,
    ) -> Result<Document, serde_json::Error> {
        let meta = &event.metadata;
        let metadata = serde_json::to_string(event)?;

        Ok(Document {
            id: Uuid::new_v4(),
            integration_id: event.id.clone(),
            title: String::new(),
            subject: non_empty(&meta.subject),
            description: non_empty(&meta.description),
            document_code: non_empty(&meta.arc_doc_code),
            autograph: non_empty(&meta.autograph),
            file_type: classify_file_type(&event.kind),
            created_time: now,
            inserted_time: now,
            issued_time: parse_issued_date(&meta.issued_date),
            original_lang_code: codes::language_code(&meta.language),
            translate_lang_code: TRANSLATE_LANG_CODE.to_string(),
            privacy: codes::privacy(&meta.mode),
            physical_state: codes::physical_state(&meta.format),
            reliability_level: codes::reliability(&meta.confidence_level),
            keywords: split_keywords(&meta.keyword),
            metadata,
            creator_id: self.intake.system_key_id.clone(),
            creator_name: self.intake.creator_name.clone(),
            input_source_type: self.intake.input_source_type.clone(),
            status: DocumentStatus::NotStarted,
            approve_status: ApproveStatus::Draft,
            backup_status: BackupStatus::NotBackedUp,
            has_backup: false,
            details_updated: false,
            ocr_process_status: ProcessStatus::Pending,
            face_detect_process_status: ProcessStatus::Pending,
            extract_pure_info_process_status: ProcessStatus::Pending,
            extract_content_process_status: ProcessStatus::Pending,
            legal_document_process_status: ProcessStatus::Pending,
            priority: self.intake.default_priority,
            is_detect_face: self.intake.detect_face,
            can_find_document_by_image: false,
            input_file_urls: Vec::new(),
            configs: Vec::new(),
        })
    }
}
