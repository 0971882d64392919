use queue_wrapper::publishers::PublishDefinition;
use queue_wrapper::topology::ExchangeDefinition;
use queue_wrapper::QueueWrapper;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let exchange = "cake.dx";
    let routing_key = "cake";
    let queue_name = "cake";

    // The queue belongs to the consumers: the publisher only checks that it is there
    // (start the `consumer` demo first) and leaves the content type unset.
    let mut wrapper = QueueWrapper::builder(queue_name)
        .exchange(ExchangeDefinition::new(exchange, "direct"))
        .create_queue(false)
        .publish(PublishDefinition {
            content_type: String::new(),
            ..PublishDefinition::new(exchange, routing_key)
        })
        .build();
    wrapper.open().await?;

    let outcome = wrapper.publish(b"a message").await;
    wrapper.close().await;
    outcome?;

    Ok(())
}
