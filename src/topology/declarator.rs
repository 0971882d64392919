use crate::amqp::BrokerChannel;
use crate::error::QueueWrapperError;
use crate::topology::{
    BindingDefinition, DeadLetterDefinition, ExchangeDefinition, ExchangeKind, QueueDefinition,
};
use amq_protocol_types::FieldTable;
use lapin::options::{
    BasicQosOptions, ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};

/// Deliveries a consumer may hold unacknowledged at any time.
///
/// One at a time gives fair dispatch across consumers sharing a queue,
/// see <https://www.rabbitmq.com/tutorials/tutorial-two-python.html>.
pub const PREFETCH_COUNT: u16 = 1;

/// Everything that has to exist on the broker before messages can flow through a queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub queue_name: String,
    pub queue: QueueDefinition,
    pub exchange: Option<ExchangeDefinition>,
    pub binding: Option<BindingDefinition>,
    pub dead_letter: Option<DeadLetterDefinition>,
}

impl Topology {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            queue: QueueDefinition::default(),
            exchange: None,
            binding: None,
            dead_letter: None,
        }
    }

    /// Declare the whole topology, in order: exchange, dead-letter routing, queue, prefetch,
    /// binding.
    ///
    /// The first failing step aborts the sequence.
    #[tracing::instrument(name = "topology_declare", skip_all, fields(queue_name = %self.queue_name))]
    pub async fn declare(&self, channel: &impl BrokerChannel) -> Result<(), QueueWrapperError> {
        if let Some(exchange) = &self.exchange {
            declare_exchange(
                channel,
                &exchange.name,
                exchange.kind.clone(),
                exchange.declare_options(),
                exchange.arguments.clone(),
            )
            .await?;
        }

        if let Some(dead_letter) = self.attached_dead_letter() {
            declare_dead_letter(channel, dead_letter).await?;
        }

        self.ensure_queue(channel).await?;

        if let Some(binding) = &self.binding {
            bind(
                channel,
                &binding.queue,
                &binding.exchange,
                &binding.routing_key,
                binding.bind_options(),
                binding.arguments.clone(),
            )
            .await?;
        }

        Ok(())
    }

    /// Make sure the queue exists with the expected parameters, then set the prefetch.
    ///
    /// Declaring is idempotent: running this again against an existing, identically declared
    /// queue is a no-op on the broker.
    pub async fn ensure_queue(
        &self,
        channel: &impl BrokerChannel,
    ) -> Result<(), QueueWrapperError> {
        let queue_not_found = |source: lapin::Error| {
            tracing::error!(
                queue_name = %self.queue_name,
                error = %source,
                "RabbitMq queue not found or configured not as expected"
            );
            QueueWrapperError::QueueNotFound {
                queue: self.queue_name.clone(),
                source,
            }
        };

        channel
            .queue_declare(
                &self.queue_name,
                self.queue.declare_options(),
                self.queue_arguments(),
            )
            .await
            .map_err(queue_not_found)?;
        channel
            .basic_qos(PREFETCH_COUNT, BasicQosOptions { global: false })
            .await
            .map_err(queue_not_found)?;

        tracing::debug!(queue_name = %self.queue_name, "RabbitMq queue is ready");
        Ok(())
    }

    /// The arguments the queue is declared with, dead-letter routing included when attached.
    pub fn queue_arguments(&self) -> FieldTable {
        let mut arguments = self.queue.arguments.clone();
        if let Some(dead_letter) = self.attached_dead_letter() {
            dead_letter.apply(&mut arguments);
        }
        arguments
    }

    fn attached_dead_letter(&self) -> Option<&DeadLetterDefinition> {
        self.dead_letter.as_ref().filter(|d| d.attach)
    }
}

async fn declare_dead_letter(
    channel: &impl BrokerChannel,
    dead_letter: &DeadLetterDefinition,
) -> Result<(), QueueWrapperError> {
    declare_exchange(
        channel,
        &dead_letter.exchange,
        ExchangeKind::Direct,
        ExchangeDeclareOptions {
            durable: true,
            ..Default::default()
        },
        FieldTable::default(),
    )
    .await?;

    channel
        .queue_declare(
            &dead_letter.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|source| {
            tracing::error!(queue_name = %dead_letter.queue, error = %source, "Failed to declare the dead-letter queue");
            QueueWrapperError::QueueNotFound {
                queue: dead_letter.queue.clone(),
                source,
            }
        })?;

    bind(
        channel,
        &dead_letter.queue,
        &dead_letter.exchange,
        &dead_letter.routing_key,
        QueueBindOptions::default(),
        FieldTable::default(),
    )
    .await
}

async fn declare_exchange(
    channel: &impl BrokerChannel,
    name: &str,
    kind: ExchangeKind,
    options: ExchangeDeclareOptions,
    arguments: FieldTable,
) -> Result<(), QueueWrapperError> {
    channel
        .exchange_declare(name, kind, options, arguments)
        .await
        .map_err(|source| {
            tracing::error!(exchange = %name, error = %source, "Failed to declare exchange");
            QueueWrapperError::ExchangeDeclare {
                exchange: name.to_owned(),
                source,
            }
        })
}

async fn bind(
    channel: &impl BrokerChannel,
    queue: &str,
    exchange: &str,
    routing_key: &str,
    options: QueueBindOptions,
    arguments: FieldTable,
) -> Result<(), QueueWrapperError> {
    channel
        .queue_bind(queue, exchange, routing_key, options, arguments)
        .await
        .map_err(|source| {
            tracing::error!(
                queue_name = %queue,
                exchange = %exchange,
                routing_key = %routing_key,
                error = %source,
                "Failed to bind queue to exchange"
            );
            QueueWrapperError::Bind {
                queue: queue.to_owned(),
                exchange: exchange.to_owned(),
                routing_key: routing_key.to_owned(),
                source,
            }
        })
}
