use crate::amqp::BrokerChannel;
use crate::error::QueueWrapperError;
use crate::publishers::PublishDefinition;
use crate::topology::Topology;
use lapin::{publisher_confirm::Confirmation, BasicProperties};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;
use uuid::Uuid;

/// Reply Code 312 - NO_ROUTE
/// See <https://www.rabbitmq.com/amqp-0-9-1-reference.html>
const NO_ROUTE: u16 = 312;

/// Make sure the queue is ready, then publish a persistent message.
///
/// Nothing is published if the queue cannot be ensured.
#[tracing::instrument(
    name = "publisher_publish",
    skip_all,
    fields(exchange = %definition.exchange, routing_key = %definition.routing_key)
)]
pub(crate) async fn publish(
    channel: &impl BrokerChannel,
    topology: &Topology,
    definition: &PublishDefinition,
    payload: &[u8],
) -> Result<(), QueueWrapperError> {
    topology.ensure_queue(channel).await?;

    let properties = message_properties(definition);
    match tokio::time::timeout(
        definition.timeout,
        send(channel, definition, payload, properties),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!(timeout = ?definition.timeout, "Timed out publishing to RabbitMq");
            Err(QueueWrapperError::PublishTimeout)
        }
    }
}

/// Publish a payload on a RabbitMq exchange, waiting for publisher confirmation from the
/// RabbitMq broker when the channel is in confirm mode.
async fn send(
    channel: &impl BrokerChannel,
    definition: &PublishDefinition,
    payload: &[u8],
    properties: BasicProperties,
) -> Result<(), QueueWrapperError> {
    let publish_error = || QueueWrapperError::Publish {
        exchange: definition.exchange.clone(),
        routing_key: definition.routing_key.clone(),
    };

    let confirm = channel
        .basic_publish(
            &definition.exchange,
            &definition.routing_key,
            definition.publish_options(),
            payload,
            properties,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to publish on channel");
            publish_error()
        })?;

    match confirm {
        Confirmation::Ack(Some(return_message)) if return_message.reply_code == NO_ROUTE => {
            tracing::error!(
                reply_text = %return_message.reply_text,
                "The message could not be routed"
            );
            Err(publish_error())
        }
        Confirmation::Ack(_) | Confirmation::NotRequested => Ok(()),
        Confirmation::Nack(_) => {
            tracing::error!("The RabbitMq broker nacked the publishing of the message");
            Err(publish_error())
        }
    }
}

/// Persistent delivery, the configured content type, the current timestamp and a fresh
/// message id.
fn message_properties(definition: &PublishDefinition) -> BasicProperties {
    // Delivery mode: Non-persistent (1) or persistent (2).
    let mut properties = BasicProperties::default()
        .with_delivery_mode(2)
        .with_message_id(Uuid::new_v4().to_string().into());
    if !definition.content_type.is_empty() {
        properties = properties.with_content_type(definition.content_type.as_str().into());
    }

    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(now) => properties.with_timestamp(now.as_secs()),
        Err(_) => {
            warn!("System time is before 1970");
            properties
        }
    }
}
