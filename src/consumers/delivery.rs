use crate::amqp::convenience::BasicPropertiesExt;
use crate::error::QueueWrapperError;
use amq_protocol_types::{DeliveryTag, ShortString};
use lapin::{
    acker::Acker,
    options::{BasicAckOptions, BasicNackOptions, BasicRejectOptions},
    BasicProperties,
};
use std::borrow::Cow;

/// A received AMQP message.
///
/// Unless the subscription uses `auto_ack`, every delivery must be settled exactly once with
/// [`ack`](Delivery::ack), [`nack`](Delivery::nack) or [`reject`](Delivery::reject). A second
/// settlement of the same delivery fails with [`QueueWrapperError::Acknowledgement`].
#[derive(Debug, PartialEq)]
pub struct Delivery {
    /// The delivery tag of the message.
    pub delivery_tag: DeliveryTag,

    /// The exchange of the message. May be an empty string
    /// if the default exchange is used.
    pub exchange: ShortString,

    /// The routing key of the message. May be an empty string
    /// if no routing key is specified.
    pub routing_key: ShortString,

    /// Whether this message was redelivered
    pub redelivered: bool,

    /// Contains the properties and the headers of the
    /// message.
    pub properties: BasicProperties,

    /// The payload of the message in binary format.
    pub data: Vec<u8>,

    acker: Acker,
}

impl Delivery {
    /// Acknowledge this delivery.
    pub async fn ack(&self) -> Result<(), QueueWrapperError> {
        self.acker
            .ack(BasicAckOptions { multiple: false })
            .await
            .map_err(QueueWrapperError::Acknowledgement)
    }

    /// Acknowledge this delivery and every unacknowledged one received before it.
    pub async fn ack_multiple(&self) -> Result<(), QueueWrapperError> {
        self.acker
            .ack(BasicAckOptions { multiple: true })
            .await
            .map_err(QueueWrapperError::Acknowledgement)
    }

    /// Negatively acknowledge this delivery.
    ///
    /// Without `requeue` the message is dropped, or dead-lettered if the queue has dead-letter
    /// routing.
    pub async fn nack(&self, requeue: bool) -> Result<(), QueueWrapperError> {
        self.acker
            .nack(BasicNackOptions {
                multiple: false,
                requeue,
            })
            .await
            .map_err(QueueWrapperError::Acknowledgement)
    }

    pub async fn reject(&self, requeue: bool) -> Result<(), QueueWrapperError> {
        self.acker
            .reject(BasicRejectOptions { requeue })
            .await
            .map_err(QueueWrapperError::Acknowledgement)
    }

    /// The MIME content type set by the publisher.
    pub fn content_type(&self) -> Option<&str> {
        self.properties.content_type_str()
    }

    /// Lookup a string header.
    pub fn header_str(&self, key: &str) -> Option<Cow<'_, str>> {
        self.properties.get_header_str(key)
    }
}

impl From<lapin::message::Delivery> for Delivery {
    fn from(value: lapin::message::Delivery) -> Self {
        Self {
            delivery_tag: value.delivery_tag,
            exchange: value.exchange,
            routing_key: value.routing_key,
            redelivered: value.redelivered,
            properties: value.properties,
            data: value.data,
            acker: value.acker,
        }
    }
}
