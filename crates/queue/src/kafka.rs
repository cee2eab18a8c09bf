//! Kafka event source.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Message};
use tracing::{debug, info};

use docintake_core::config::StreamConfig;

use crate::error::QueueError;
use crate::source::{EventSource, StreamMessage};

/// Timeout for the startup metadata probe.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// librdkafka settings for the intake consumer group.
///
/// Offsets are auto-committed; the stream is treated as at-least-once and
/// duplicates are absorbed by the dedup-safe insert downstream.
pub fn client_config(stream: &StreamConfig) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", &stream.bootstrap_servers)
        .set("group.id", &stream.group_id)
        .set("client.id", &stream.client_id)
        .set("auto.offset.reset", &stream.auto_offset_reset)
        .set("enable.auto.commit", "true");

    if let Some(ref protocol) = stream.security_protocol {
        config.set("security.protocol", protocol);
    }
    if let Some(ref mechanism) = stream.sasl_mechanism {
        config.set("sasl.mechanism", mechanism);
    }
    if let Some(ref username) = stream.sasl_username {
        config.set("sasl.username", username);
    }
    if let Some(ref password) = stream.sasl_password {
        config.set("sasl.password", password);
    }
    config
}

/// Map a consumer error, keeping librdkafka's fatal flag.
pub fn transport_error(err: KafkaError) -> QueueError {
    let fatal = matches!(err, KafkaError::MessageConsumptionFatal(_))
        || err.rdkafka_error_code() == Some(RDKafkaErrorCode::Fatal);
    QueueError::Transport {
        message: err.to_string(),
        fatal,
    }
}

/// Kafka-backed event source subscribed to a single topic.
pub struct KafkaSource {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaSource {
    /// Create the consumer, check the brokers are reachable, and subscribe.
    ///
    /// Blocks on the metadata round-trip; call from a blocking context.
    pub fn connect(stream: &StreamConfig) -> Result<Self, QueueError> {
        let consumer: StreamConsumer = client_config(stream)
            .create()
            .map_err(|e| QueueError::Connection(format!("failed to create consumer: {e}")))?;

        let metadata = consumer
            .fetch_metadata(Some(&stream.topic), METADATA_TIMEOUT)
            .map_err(|e| QueueError::Connection(format!("broker unreachable: {e}")))?;
        info!(
            servers = %stream.bootstrap_servers,
            brokers = metadata.brokers().len(),
            "Connected to stream"
        );

        consumer
            .subscribe(&[stream.topic.as_str()])
            .map_err(|e| QueueError::Subscribe(format!("{}: {e}", stream.topic)))?;
        info!(topic = %stream.topic, group = %stream.group_id, "Subscribed to topic");

        Ok(Self {
            consumer,
            topic: stream.topic.clone(),
        })
    }
}

fn to_stream_message(msg: &BorrowedMessage<'_>) -> StreamMessage {
    let timestamp = msg
        .timestamp()
        .to_millis()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now);

    StreamMessage {
        id: format!("{}/{}@{}", msg.topic(), msg.partition(), msg.offset()),
        key: msg.key().map(|k| String::from_utf8_lossy(k).into_owned()),
        body: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        timestamp,
    }
}

#[async_trait]
impl EventSource for KafkaSource {
    async fn poll(&self, timeout: Duration) -> Result<Option<StreamMessage>, QueueError> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => Ok(None),
            Ok(Err(e)) => Err(transport_error(e)),
            Ok(Ok(msg)) => {
                let message = to_stream_message(&msg);
                debug!(
                    topic = %self.topic,
                    message_id = %message.id,
                    bytes = message.body.len(),
                    "Polled message"
                );
                Ok(Some(message))
            }
        }
    }

    fn provider(&self) -> &str {
        "kafka"
    }
}
