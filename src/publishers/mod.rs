//! Facilities to publish messages to a RabbitMq exchange. Check out
//! [`QueueWrapper::publish`](crate::wrapper::QueueWrapper::publish) as a starting point.
mod definition;
mod publisher;

pub use definition::PublishDefinition;
pub(crate) use publisher::publish;
