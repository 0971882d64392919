/// Error returned by [`QueueWrapper`](crate::wrapper::QueueWrapper) operations.
///
/// Broker failures keep the underlying [`lapin::Error`] as their `source()`, with the exception
/// of [`QueueWrapperError::Publish`]: the broker reason for a failed publish is logged and
/// then discarded.
#[derive(thiserror::Error, Debug)]
pub enum QueueWrapperError {
    #[error("The RabbitMq connection settings are invalid")]
    Configuration(#[source] anyhow::Error),
    #[error("Failed to connect to the RabbitMq broker")]
    Connection(#[source] anyhow::Error),
    #[error("Failed to open or configure a channel on the RabbitMq connection")]
    Channel(#[source] lapin::Error),
    #[error("Failed to declare the `{exchange}` exchange")]
    ExchangeDeclare {
        exchange: String,
        #[source]
        source: lapin::Error,
    },
    /// The queue is missing, was declared with conflicting parameters, or the prefetch could
    /// not be set on it. Inspect `source` to tell the cases apart.
    #[error("The `{queue}` queue is not available")]
    QueueNotFound {
        queue: String,
        #[source]
        source: lapin::Error,
    },
    #[error("Failed to bind the `{queue}` queue to the `{exchange}` exchange with routing key `{routing_key}`")]
    Bind {
        queue: String,
        exchange: String,
        routing_key: String,
        #[source]
        source: lapin::Error,
    },
    #[error("Failed to consume from the `{queue}` queue")]
    Consume {
        queue: String,
        #[source]
        source: lapin::Error,
    },
    #[error("Failed to publish to the `{exchange}` exchange with routing key `{routing_key}`")]
    Publish {
        exchange: String,
        routing_key: String,
    },
    #[error("The timeout threshold was reached while trying to publish the message")]
    PublishTimeout,
    #[error("Failed to acknowledge the delivery with the RabbitMq broker")]
    Acknowledgement(#[source] lapin::Error),
    #[error("The queue wrapper has not been opened yet")]
    NotOpen,
    #[error("The queue wrapper is already open")]
    AlreadyOpen,
    #[error("The queue wrapper has been closed")]
    Closed,
}
