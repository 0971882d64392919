//! A [`BrokerChannel`] that records what it is asked to do, for unit tests.
use crate::amqp::BrokerChannel;
use crate::amqp::DeliverySource;
use amq_protocol_types::{FieldTable, ShortUInt};
use futures_util::stream::{self, StreamExt};
use lapin::{
    acker::Acker,
    message::Delivery,
    options::{
        BasicCancelOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
        ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
    },
    publisher_confirm::Confirmation,
    BasicProperties, ChannelState, ExchangeKind,
};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    ExchangeDeclare {
        exchange: String,
        kind: ExchangeKind,
        options: ExchangeDeclareOptions,
    },
    QueueDeclare {
        queue: String,
        options: QueueDeclareOptions,
        arguments: FieldTable,
    },
    BasicQos {
        prefetch_count: ShortUInt,
        options: BasicQosOptions,
    },
    QueueBind {
        queue: String,
        exchange: String,
        routing_key: String,
    },
    BasicConsume {
        queue: String,
        consumer_tag: String,
        options: BasicConsumeOptions,
        arguments: FieldTable,
    },
    BasicCancel {
        consumer_tag: String,
    },
    BasicPublish {
        exchange: String,
        routing_key: String,
        options: BasicPublishOptions,
        payload: Vec<u8>,
        properties: BasicProperties,
    },
    ConfirmSelect,
    Close {
        reply_code: ShortUInt,
    },
}

/// The broker operation a [`RecordingChannel`] should fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    ExchangeDeclare,
    QueueDeclare,
    BasicQos,
    QueueBind,
    BasicConsume,
    BasicCancel,
    BasicPublish,
    ConfirmSelect,
    Close,
}

#[derive(Default)]
pub(crate) struct RecordingChannel {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<Option<Step>>,
    /// Queues a passive declaration will find.
    queues: Mutex<HashSet<String>>,
    confirmation: Mutex<Option<Confirmation>>,
    deliveries: Mutex<Vec<Delivery>>,
    stall_publish: bool,
}

impl RecordingChannel {
    pub(crate) fn failing_on(step: Step) -> Self {
        let channel = Self::default();
        *channel.failing.lock().unwrap() = Some(step);
        channel
    }

    pub(crate) fn with_queue(self, queue: &str) -> Self {
        self.queues.lock().unwrap().insert(queue.to_owned());
        self
    }

    /// The broker answer to the next publish; `NotRequested` when unset.
    pub(crate) fn confirming_with(self, confirmation: Confirmation) -> Self {
        *self.confirmation.lock().unwrap() = Some(confirmation);
        self
    }

    /// Publishing never completes.
    pub(crate) fn stalling_publish(mut self) -> Self {
        self.stall_publish = true;
        self
    }

    /// Deliveries handed to the next consumer, after which its stream stays pending.
    pub(crate) fn delivering(self, deliveries: Vec<Delivery>) -> Self {
        *self.deliveries.lock().unwrap() = deliveries;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call, step: Step) -> Result<(), lapin::Error> {
        self.calls.lock().unwrap().push(call);
        if *self.failing.lock().unwrap() == Some(step) {
            return Err(broker_error());
        }
        Ok(())
    }
}

pub(crate) fn broker_error() -> lapin::Error {
    lapin::Error::InvalidChannelState(ChannelState::Closed)
}

/// A one-word summary of each call, to assert on ordering.
pub(crate) fn kinds(calls: &[Call]) -> Vec<&'static str> {
    calls
        .iter()
        .map(|call| match call {
            Call::ExchangeDeclare { .. } => "exchange",
            Call::QueueDeclare { .. } => "queue",
            Call::BasicQos { .. } => "qos",
            Call::QueueBind { .. } => "bind",
            Call::BasicConsume { .. } => "consume",
            Call::BasicCancel { .. } => "cancel",
            Call::BasicPublish { .. } => "publish",
            Call::ConfirmSelect => "confirm",
            Call::Close { .. } => "close",
        })
        .collect()
}

/// A delivery whose acker does not talk to any broker.
pub(crate) fn delivery(delivery_tag: u64, data: &[u8]) -> Delivery {
    Delivery {
        delivery_tag,
        exchange: "".into(),
        routing_key: "cake".into(),
        redelivered: false,
        properties: BasicProperties::default().with_content_type("application/json".into()),
        data: data.to_vec(),
        acker: Acker::default(),
    }
}

#[async_trait::async_trait]
impl BrokerChannel for RecordingChannel {
    async fn exchange_declare(
        &self,
        exchange: &str,
        kind: ExchangeKind,
        options: ExchangeDeclareOptions,
        _arguments: FieldTable,
    ) -> Result<(), lapin::Error> {
        self.record(
            Call::ExchangeDeclare {
                exchange: exchange.to_owned(),
                kind,
                options,
            },
            Step::ExchangeDeclare,
        )
    }

    async fn queue_declare(
        &self,
        queue: &str,
        options: QueueDeclareOptions,
        arguments: FieldTable,
    ) -> Result<(), lapin::Error> {
        self.record(
            Call::QueueDeclare {
                queue: queue.to_owned(),
                options,
                arguments,
            },
            Step::QueueDeclare,
        )?;
        let mut queues = self.queues.lock().unwrap();
        if options.passive {
            if !queues.contains(queue) {
                return Err(broker_error());
            }
        } else {
            queues.insert(queue.to_owned());
        }
        Ok(())
    }

    async fn basic_qos(
        &self,
        prefetch_count: ShortUInt,
        options: BasicQosOptions,
    ) -> Result<(), lapin::Error> {
        self.record(
            Call::BasicQos {
                prefetch_count,
                options,
            },
            Step::BasicQos,
        )
    }

    async fn queue_bind(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        _options: QueueBindOptions,
        _arguments: FieldTable,
    ) -> Result<(), lapin::Error> {
        self.record(
            Call::QueueBind {
                queue: queue.to_owned(),
                exchange: exchange.to_owned(),
                routing_key: routing_key.to_owned(),
            },
            Step::QueueBind,
        )
    }

    async fn basic_consume(
        &self,
        queue: &str,
        consumer_tag: &str,
        options: BasicConsumeOptions,
        arguments: FieldTable,
    ) -> Result<DeliverySource, lapin::Error> {
        self.record(
            Call::BasicConsume {
                queue: queue.to_owned(),
                consumer_tag: consumer_tag.to_owned(),
                options,
                arguments,
            },
            Step::BasicConsume,
        )?;
        let deliveries = std::mem::take(&mut *self.deliveries.lock().unwrap());
        Ok(Box::pin(
            stream::iter(deliveries.into_iter().map(Ok::<_, lapin::Error>)).chain(stream::pending()),
        ))
    }

    async fn basic_cancel(
        &self,
        consumer_tag: &str,
        _options: BasicCancelOptions,
    ) -> Result<(), lapin::Error> {
        self.record(
            Call::BasicCancel {
                consumer_tag: consumer_tag.to_owned(),
            },
            Step::BasicCancel,
        )
    }

    async fn basic_publish(
        &self,
        exchange: &str,
        routing_key: &str,
        options: BasicPublishOptions,
        payload: &[u8],
        properties: BasicProperties,
    ) -> Result<Confirmation, lapin::Error> {
        self.record(
            Call::BasicPublish {
                exchange: exchange.to_owned(),
                routing_key: routing_key.to_owned(),
                options,
                payload: payload.to_vec(),
                properties,
            },
            Step::BasicPublish,
        )?;
        if self.stall_publish {
            std::future::pending::<()>().await;
        }
        Ok(self
            .confirmation
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Confirmation::NotRequested))
    }

    async fn confirm_select(&self, _options: ConfirmSelectOptions) -> Result<(), lapin::Error> {
        self.record(Call::ConfirmSelect, Step::ConfirmSelect)
    }

    async fn close(&self, reply_code: ShortUInt, _reply_text: &str) -> Result<(), lapin::Error> {
        self.record(Call::Close { reply_code }, Step::Close)
    }
}
