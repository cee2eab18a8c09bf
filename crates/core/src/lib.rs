pub mod codes;
pub mod config;
pub mod content;
pub mod document;
pub mod error;
pub mod event;
pub mod job;

pub use config::Config;
pub use content::Content;
pub use document::*;
pub use error::*;
pub use event::{EventMetadata, IngestEvent};
pub use job::{DetailContent, OcrJobRequest};
