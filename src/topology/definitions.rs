//! Plain descriptions of the broker objects a [`QueueWrapper`](crate::wrapper::QueueWrapper)
//! relies on.
//!
//! Each definition carries the same defaults a queue wrapper starts from, so you only spell
//! out what differs:
//!
//! ```
//! use queue_wrapper::topology::{ExchangeDefinition, QueueDefinition};
//!
//! let queue = QueueDefinition::default().max_priority(10);
//! assert!(queue.durable);
//!
//! let exchange = ExchangeDefinition::new("orders", "topic");
//! assert!(exchange.durable);
//! ```
use amq_protocol_types::{AMQPValue, FieldTable, LongString};
use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
pub use lapin::ExchangeKind;

/// Argument naming the exchange rejected messages are re-published to.
pub const DEAD_LETTER_EXCHANGE_ARGUMENT: &str = "x-dead-letter-exchange";
/// Argument naming the routing key used when re-publishing rejected messages.
pub const DEAD_LETTER_ROUTING_KEY_ARGUMENT: &str = "x-dead-letter-routing-key";

/// How the wrapper's queue should be declared.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueDefinition {
    /// Declare the queue if it does not exist.
    ///
    /// When `false` the queue must already exist: its presence is checked with a passive
    /// declaration, which never creates anything. If the queue is missing the broker closes
    /// the channel, and the wrapper has to be closed and opened again from scratch.
    ///
    /// Set through [`QueueWrapperBuilder::create_queue`](crate::QueueWrapperBuilder::create_queue),
    /// which [`QueueWrapperBuilder::queue`](crate::QueueWrapperBuilder::queue) does not override.
    pub should_create: bool,
    /// Survive a broker restart.
    pub durable: bool,
    /// Delete the queue once its last consumer goes away.
    pub auto_delete: bool,
    /// Only usable from the declaring connection.
    pub exclusive: bool,
    /// Do not wait for the broker to confirm the declaration.
    pub no_wait: bool,
    /// Extra queue arguments, e.g. `x-message-ttl`.
    pub arguments: FieldTable,
}

impl Default for QueueDefinition {
    fn default() -> Self {
        Self {
            should_create: true,
            durable: true,
            auto_delete: false,
            exclusive: false,
            no_wait: false,
            arguments: FieldTable::default(),
        }
    }
}

impl QueueDefinition {
    /// Enable [priority queue](https://www.rabbitmq.com/priority.html) and set the maximum
    /// priority this queue should support.
    ///
    /// Warning: this value is immutable, so enabling priority or changing it on an existing
    /// queue requires rolling a new queue.
    pub fn max_priority(mut self, priority: u8) -> Self {
        self.arguments
            .insert("x-max-priority".into(), AMQPValue::ShortShortUInt(priority));
        self
    }

    pub(crate) fn declare_options(&self) -> QueueDeclareOptions {
        QueueDeclareOptions {
            passive: !self.should_create,
            durable: self.durable,
            exclusive: self.exclusive,
            auto_delete: self.auto_delete,
            nowait: self.no_wait,
        }
    }
}

/// An exchange to declare before the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeDefinition {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
    pub auto_delete: bool,
    /// Internal exchanges cannot be published to directly.
    pub internal: bool,
    pub no_wait: bool,
    pub arguments: FieldTable,
}

impl ExchangeDefinition {
    /// A durable exchange of the given kind.
    ///
    /// `kind` is one of `direct`, `fanout`, `topic` or `headers`; anything else is passed to the
    /// broker verbatim as a plugin-provided exchange type.
    pub fn new(name: impl Into<String>, kind: &str) -> Self {
        Self {
            name: name.into(),
            kind: exchange_kind(kind),
            durable: true,
            auto_delete: false,
            internal: false,
            no_wait: false,
            arguments: FieldTable::default(),
        }
    }

    pub(crate) fn declare_options(&self) -> ExchangeDeclareOptions {
        ExchangeDeclareOptions {
            passive: false,
            durable: self.durable,
            auto_delete: self.auto_delete,
            internal: self.internal,
            nowait: self.no_wait,
        }
    }
}

/// Parse an exchange type name.
pub fn exchange_kind(kind: &str) -> ExchangeKind {
    match kind {
        "direct" => ExchangeKind::Direct,
        "fanout" => ExchangeKind::Fanout,
        "topic" => ExchangeKind::Topic,
        "headers" => ExchangeKind::Headers,
        other => ExchangeKind::Custom(other.to_owned()),
    }
}

/// Bind a queue to an exchange using a routing key.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingDefinition {
    pub queue: String,
    pub routing_key: String,
    pub exchange: String,
    pub no_wait: bool,
    pub arguments: FieldTable,
}

impl BindingDefinition {
    pub fn new(
        queue: impl Into<String>,
        routing_key: impl Into<String>,
        exchange: impl Into<String>,
    ) -> Self {
        Self {
            queue: queue.into(),
            routing_key: routing_key.into(),
            exchange: exchange.into(),
            no_wait: false,
            arguments: FieldTable::default(),
        }
    }

    pub(crate) fn bind_options(&self) -> QueueBindOptions {
        QueueBindOptions {
            nowait: self.no_wait,
        }
    }
}

/// Where rejected or expired messages of the wrapper's queue should end up.
///
/// A definition built with [`DeadLetterDefinition::new`] is only recorded: the queue is declared
/// without dead-letter arguments. Use [`DeadLetterDefinition::attached`] to have the wrapper
/// declare the dead-letter exchange and queue, bind them, and point the main queue at them.
///
/// Given that AMQP queue's settings are immutable, attaching dead-letter routing to an
/// existing queue requires rolling a new queue.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetterDefinition {
    pub exchange: String,
    pub queue: String,
    pub routing_key: String,
    pub attach: bool,
}

impl DeadLetterDefinition {
    pub fn new(
        exchange: impl Into<String>,
        queue: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            queue: queue.into(),
            routing_key: routing_key.into(),
            attach: false,
        }
    }

    /// Declare the dead-letter topology and wire it to the main queue.
    pub fn attached(mut self) -> Self {
        self.attach = true;
        self
    }

    /// Add the dead-letter arguments to a queue's declaration arguments.
    pub(crate) fn apply(&self, arguments: &mut FieldTable) {
        arguments.insert(
            DEAD_LETTER_EXCHANGE_ARGUMENT.into(),
            AMQPValue::LongString(LongString::from(self.exchange.as_str())),
        );
        arguments.insert(
            DEAD_LETTER_ROUTING_KEY_ARGUMENT.into(),
            AMQPValue::LongString(LongString::from(self.routing_key.as_str())),
        );
    }
}
