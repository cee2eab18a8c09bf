//! Document intake pipeline: stream event → stored document → OCR job.

pub mod assembler;
pub mod dead_letter;
pub mod dispatcher;
pub mod error;
pub mod health;
pub mod persister;
pub mod pipeline;
pub mod stats;
pub mod worker;

pub use assembler::DocumentAssembler;
pub use dead_letter::DeadLetterSink;
pub use dispatcher::JobDispatcher;
pub use error::{DispatchError, PersistError, PipelineError};
pub use persister::{DedupPersister, PersistOutcome};
pub use pipeline::{IngestPipeline, ProcessOutcome};
pub use stats::{LoopState, PipelineStats, StatsSnapshot};
pub use worker::IngestLoop;
