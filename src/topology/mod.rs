//! Describe and declare the exchange, queue and binding a queue wrapper works with.
mod declarator;
mod definitions;

pub use declarator::{Topology, PREFETCH_COUNT};
pub use definitions::{
    exchange_kind, BindingDefinition, DeadLetterDefinition, ExchangeDefinition, ExchangeKind,
    QueueDefinition, DEAD_LETTER_EXCHANGE_ARGUMENT, DEAD_LETTER_ROUTING_KEY_ARGUMENT,
};
