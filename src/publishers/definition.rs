use lapin::options::BasicPublishOptions;
use std::time::Duration;

/// Where and how the wrapper publishes messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishDefinition {
    /// Exchange to publish to. Empty for the default exchange, which routes on queue names.
    pub exchange: String,
    pub routing_key: String,
    /// Ask the broker to return messages it cannot route to any queue.
    pub mandatory: bool,
    /// The immediate flag was dropped in RabbitMQ 3.0 - see <https://www.rabbitmq.com/blog/2012/11/19/breaking-things-with-rabbitmq-3-0/>.
    /// Setting `true` will cause a not-supported error.
    pub immediate: bool,
    /// MIME type of the payload. Empty to leave the property unset.
    pub content_type: String,
    /// Timeout on publishing, confirmation included.
    pub timeout: Duration,
    /// Put the channel in confirm mode and wait for the broker to acknowledge each message.
    pub confirm: bool,
}

impl PublishDefinition {
    /// Publish on `exchange` with `routing_key`, as persistent JSON messages.
    pub fn new(exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
            mandatory: false,
            immediate: false,
            content_type: "application/json".into(),
            timeout: Duration::from_secs(3),
            confirm: false,
        }
    }

    /// Publish straight to `queue_name` through the default exchange.
    pub fn for_queue(queue_name: impl Into<String>) -> Self {
        Self::new("", queue_name)
    }

    pub(crate) fn publish_options(&self) -> BasicPublishOptions {
        BasicPublishOptions {
            mandatory: self.mandatory,
            immediate: self.immediate,
        }
    }
}
