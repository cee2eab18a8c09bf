use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("search index request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search index returned {status}: {body}")]
    SearchApi { status: u16, body: String },

    #[error("not configured: {0}")]
    NotConfigured(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
