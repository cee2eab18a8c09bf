//! RabbitMQ job publisher.

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

use docintake_core::config::AmqpConfig;

use crate::error::QueueError;
use crate::publisher::JobPublisher;

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// Arguments for the OCR work queue: classic queue with priorities enabled.
pub fn priority_queue_arguments(max_priority: u8) -> FieldTable {
    let mut args = FieldTable::default();
    args.insert(
        ShortString::from("x-queue-type"),
        AMQPValue::LongString("classic".into()),
    );
    args.insert(
        ShortString::from("x-max-priority"),
        AMQPValue::LongInt(i32::from(max_priority)),
    );
    args
}

pub fn message_properties(priority: Option<u8>) -> BasicProperties {
    let props = BasicProperties::default()
        .with_content_type(ShortString::from("application/json"))
        .with_delivery_mode(PERSISTENT);
    match priority {
        Some(p) => props.with_priority(p),
        None => props,
    }
}

/// Publisher on a single confirm-mode channel.
///
/// Declares the OCR queue (and the dead-letter queue, if configured) on
/// connect so publishing never targets a missing queue.
pub struct AmqpPublisher {
    // Held so the connection lives as long as the channel.
    _connection: Connection,
    channel: Channel,
}

impl AmqpPublisher {
    pub async fn connect(amqp: &AmqpConfig) -> Result<Self, QueueError> {
        let connection = Connection::connect(&amqp.url, ConnectionProperties::default())
            .await
            .map_err(|e| QueueError::Connection(format!("RabbitMQ connect failed: {e}")))?;
        info!("Connected to RabbitMQ");

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| QueueError::Connection(format!("failed to open channel: {e}")))?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| QueueError::Connection(format!("failed to enable confirms: {e}")))?;

        let durable = QueueDeclareOptions {
            durable: true,
            ..QueueDeclareOptions::default()
        };
        channel
            .queue_declare(
                &amqp.ocr_queue,
                durable,
                priority_queue_arguments(amqp.max_priority),
            )
            .await
            .map_err(|e| QueueError::Connection(format!("failed to declare {}: {e}", amqp.ocr_queue)))?;
        info!(queue = %amqp.ocr_queue, max_priority = amqp.max_priority, "Declared OCR queue");

        if let Some(ref dlq) = amqp.dead_letter_queue {
            channel
                .queue_declare(dlq, durable, FieldTable::default())
                .await
                .map_err(|e| QueueError::Connection(format!("failed to declare {dlq}: {e}")))?;
            info!(queue = %dlq, "Declared dead-letter queue");
        }

        Ok(Self {
            _connection: connection,
            channel,
        })
    }
}

#[async_trait]
impl JobPublisher for AmqpPublisher {
    async fn publish(&self, queue: &str, body: &[u8], priority: Option<u8>) -> Result<(), QueueError> {
        debug!(queue, bytes = body.len(), ?priority, "Publishing to RabbitMQ");

        let confirm = self
            .channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                body,
                message_properties(priority),
            )
            .await
            .map_err(|e| QueueError::Publish(format!("{queue}: {e}")))?;

        let confirmation = confirm
            .await
            .map_err(|e| QueueError::Publish(format!("{queue}: confirm failed: {e}")))?;
        if confirmation.is_nack() {
            return Err(QueueError::Publish(format!("{queue}: broker nacked message")));
        }
        Ok(())
    }
}
