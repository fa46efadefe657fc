use std::time::Duration;

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    protocol::basic::AMQPProperties,
    types::FieldTable,
    Channel, Connection, ConnectionProperties, Result as LapinResult,
};
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::data_model::BatchNotification;
use crate::error::{PipelineError, Result};
use crate::utils::prometheus_metrics::NOTIFICATIONS_PUBLISHED_TOTAL;

// Helper function to connect to RabbitMQ with retry.
pub async fn connect_rabbitmq(addr: &str) -> LapinResult<Connection> {
    let options = ConnectionProperties::default()
        .with_executor(tokio_executor_trait::Tokio::current())
        .with_reactor(tokio_reactor_trait::Tokio);

    let mut attempts = 0;
    loop {
        match Connection::connect(addr, options.clone()).await {
            Ok(conn) => {
                info!("Successfully connected to RabbitMQ at {}", addr);
                return Ok(conn);
            }
            Err(e) => {
                attempts += 1;
                error!(
                    attempt = attempts,
                    error = %e,
                    "Failed to connect to RabbitMQ. Retrying in 5 seconds..."
                );
                if attempts >= 5 {
                    return Err(e);
                }
                sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// Trait for the downstream notification collaborator. One notification per
/// successfully completed batch, at-least-once.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &BatchNotification) -> Result<()>;
}

/// Publishes batch-completed notifications to a durable RabbitMQ queue with
/// publisher confirms, so a notification is only counted once the broker
/// acknowledged it.
pub struct AmqpNotifier {
    channel: Channel,
    queue: String,
}

impl AmqpNotifier {
    pub async fn new(conn: &Connection, queue: &str) -> Result<Self> {
        let channel = conn.create_channel().await.map_err(|e| {
            PipelineError::QueueError(format!("Failed to create notify channel: {}", e))
        })?;

        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                PipelineError::QueueError(format!("Failed to declare notify queue: {}", e))
            })?;

        Ok(AmqpNotifier {
            channel,
            queue: queue.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for AmqpNotifier {
    async fn notify(&self, notification: &BatchNotification) -> Result<()> {
        let payload = serde_json::to_vec(notification)?;

        self.channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                &payload,
                AMQPProperties::default().with_delivery_mode(2),
            )
            .await?
            .await?;

        NOTIFICATIONS_PUBLISHED_TOTAL.inc();
        debug!(batch_id = %notification.batch_id, queue = %self.queue, "Published batch notification");
        Ok(())
    }
}
