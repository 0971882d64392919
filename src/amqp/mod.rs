//! Helpers for connecting to a rabbitmq broker

mod channel;
pub mod configuration;
pub mod convenience;
mod factory;
pub use channel::{BrokerChannel, DeliverySource};
pub use factory::ConnectionFactory;
pub use lapin::{Channel, Connection};

pub use lapin::{options, types, BasicProperties, ExchangeKind};
