//! The slice of the AMQP channel API used to declare topology and publish messages.
use amq_protocol_types::{FieldTable, ShortUInt};
use futures_util::Stream;
use lapin::{
    message::Delivery,
    options::{
        BasicCancelOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
        ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    publisher_confirm::Confirmation,
    BasicProperties, Channel, ExchangeKind,
};
use std::pin::Pin;

/// The raw deliveries pushed by the broker for a single consumer.
pub type DeliverySource = Pin<Box<dyn Stream<Item = Result<Delivery, lapin::Error>> + Send>>;

#[async_trait::async_trait]
/// Broker operations the declarator, the consumer and the publisher rely on.
///
/// The signatures follow [`lapin::Channel`], which is the production implementation.
/// Having the seam lets the declaration sequence be exercised without a running broker.
pub trait BrokerChannel: Send + Sync {
    async fn exchange_declare(
        &self,
        exchange: &str,
        kind: ExchangeKind,
        options: ExchangeDeclareOptions,
        arguments: FieldTable,
    ) -> Result<(), lapin::Error>;

    async fn queue_declare(
        &self,
        queue: &str,
        options: QueueDeclareOptions,
        arguments: FieldTable,
    ) -> Result<(), lapin::Error>;

    async fn basic_qos(
        &self,
        prefetch_count: ShortUInt,
        options: BasicQosOptions,
    ) -> Result<(), lapin::Error>;

    async fn queue_bind(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        options: QueueBindOptions,
        arguments: FieldTable,
    ) -> Result<(), lapin::Error>;

    async fn basic_consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
        arguments: FieldTable,
    ) -> Result<DeliverySource, lapin::Error>;

    async fn basic_cancel(
        &self,
        consumer_tag: &str,
        options: BasicCancelOptions,
    ) -> Result<(), lapin::Error>;

    /// Publish and wait for the broker confirmation, if the channel is in confirm mode.
    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        options: BasicPublishOptions,
        payload: &[u8],
        properties: BasicProperties,
    ) -> Result<Confirmation, lapin::Error>;

    /// Put the channel in publisher confirm mode.
    async fn confirm_select(&self, options: ConfirmSelectOptions) -> Result<(), lapin::Error>;

    async fn close(&self, reply_code: ShortUInt, reply_text: &str) -> Result<(), lapin::Error>;
}

/// assert it's object safe
type _CHECK = Box<dyn BrokerChannel>;

#[async_trait::async_trait]
impl BrokerChannel for Channel {
    async fn exchange_declare(
        &self,
        exchange: &str,
        kind: ExchangeKind,
        options: ExchangeDeclareOptions,
        arguments: FieldTable,
    ) -> Result<(), lapin::Error> {
        Channel::exchange_declare(self, exchange, kind, options, arguments).await
    }

    async fn queue_declare(
        &self,
        queue: &str,
        options: QueueDeclareOptions,
        arguments: FieldTable,
    ) -> Result<(), lapin::Error> {
        Channel::queue_declare(self, queue, options, arguments)
            .await
            .map(|_| ())
    }

    async fn basic_qos(
        &self,
        prefetch_count: ShortUInt,
        options: BasicQosOptions,
    ) -> Result<(), lapin::Error> {
        Channel::basic_qos(self, prefetch_count, options).await
    }

    async fn queue_bind(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        options: QueueBindOptions,
        arguments: FieldTable,
    ) -> Result<(), lapin::Error> {
        Channel::queue_bind(self, queue, exchange, routing_key, options, arguments).await
    }

    async fn basic_consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
        arguments: FieldTable,
    ) -> Result<DeliverySource, lapin::Error> {
        let consumer =
            Channel::basic_consume(self, queue, consumer_tag, options, arguments).await?;
        Ok(Box::pin(consumer))
    }

    async fn basic_cancel(
        &self,
        consumer_tag: &str,
        options: BasicCancelOptions,
    ) -> Result<(), lapin::Error> {
        Channel::basic_cancel(self, consumer_tag, options).await
    }

    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        options: BasicPublishOptions,
        payload: &[u8],
        properties: BasicProperties,
    ) -> Result<Confirmation, lapin::Error> {
        Channel::basic_publish(self, exchange, routing_key, options, payload, properties)
            .await?
            .await
    }

    async fn confirm_select(&self, options: ConfirmSelectOptions) -> Result<(), lapin::Error> {
        Channel::confirm_select(self, options).await
    }

    async fn close(&self, reply_code: ShortUInt, reply_text: &str) -> Result<(), lapin::Error> {
        Channel::close(self, reply_code, reply_text).await
    }
}
