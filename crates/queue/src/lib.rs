pub mod amqp;
pub mod error;
pub mod kafka;
pub mod publisher;
pub mod source;

pub use amqp::AmqpPublisher;
pub use error::QueueError;
pub use kafka::KafkaSource;
pub use publisher::JobPublisher;
pub use source::{EventSource, StreamMessage};
