//! PostgreSQL document store.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use docintake_core::config::PostgresConfig;
use docintake_core::{Document, DocumentId, PhysicalState, ReliabilityLevel};

use crate::error::StorageError;
use crate::store::DocumentStore;

/// Conditional insert keyed on `integration_id`.
///
/// `ON CONFLICT DO NOTHING RETURNING id` yields no row when the integration
/// id already exists, so check-and-insert is one statement and safe across
/// concurrent consumers.
pub const INSERT_DOCUMENT_SQL: &str = "
    INSERT INTO documents (
        id, title, subject, description, file_type,
        created_time, inserted_time, issued_time, document_code, creator_id,
        creator_name, metadata, input_source_type, original_lang_code, translate_lang_code,
        autograph, privacy, keywords, physical_state, has_attachment,
        reliability_level, integration_id, is_detect_face, priority, input_file_urls,
        configs, can_find_document_by_image, status, approve_status, ocr_process_status,
        face_detect_process_status, extract_pure_info_process_status,
        extract_content_process_status, legal_document_process_status
    ) VALUES (
        $1, $2, $3, $4, $5,
        $6, $7, $8, $9, $10,
        $11, $12::jsonb, $13, $14, $15,
        $16, $17, $18, $19, NULL,
        $20, $21, $22, $23, $24,
        $25::jsonb, $26, $27, $28, $29,
        $30, $31,
        $32, $33
    )
    ON CONFLICT (integration_id) DO NOTHING
    RETURNING id";

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Connect, verify the connection, and apply migrations when enabled.
    pub async fn connect(config: &PostgresConfig) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        info!(url = %config.redacted_url(), "Connected to PostgreSQL");

        if config.run_migrations {
            sqlx::migrate!("../../migrations").run(&pool).await?;
            info!("Database migrations applied successfully");
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert_if_absent(&self, doc: &Document) -> Result<Option<DocumentId>, StorageError> {
        let configs = serde_json::to_string(&doc.configs)?;

        let row: Option<(Uuid,)> = sqlx::query_as(INSERT_DOCUMENT_SQL)
            .bind(doc.id)
            .bind(&doc.title)
            .bind(&doc.subject)
            .bind(&doc.description)
            .bind(doc.file_type.code())
            .bind(doc.created_time)
            .bind(doc.inserted_time)
            .bind(doc.issued_time)
            .bind(&doc.document_code)
            .bind(&doc.creator_id)
            .bind(&doc.creator_name)
            .bind(&doc.metadata)
            .bind(&doc.input_source_type)
            .bind(&doc.original_lang_code)
            .bind(&doc.translate_lang_code)
            .bind(&doc.autograph)
            .bind(doc.privacy.code())
            .bind(&doc.keywords)
            .bind(doc.physical_state.map(PhysicalState::code))
            .bind(doc.reliability_level.map(ReliabilityLevel::code))
            .bind(&doc.integration_id)
            .bind(doc.is_detect_face)
            .bind(doc.priority)
            .bind(&doc.input_file_urls)
            .bind(configs)
            .bind(doc.can_find_document_by_image)
            .bind(doc.status.code())
            .bind(doc.approve_status.code())
            .bind(doc.ocr_process_status.code())
            .bind(doc.face_detect_process_status.code())
            .bind(doc.extract_pure_info_process_status.code())
            .bind(doc.extract_content_process_status.code())
            .bind(doc.legal_document_process_status.code())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id,)| id))
    }
}
