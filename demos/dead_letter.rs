use queue_wrapper::topology::{BindingDefinition, DeadLetterDefinition, ExchangeDefinition};
use queue_wrapper::QueueWrapper;
use tracing_subscriber::EnvFilter;

/// Messages rejected on `dlexample` without requeueing end up in `dlexample.dl`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let exchange = "dlexample.dx";
    let routing_key = "dlexample";
    let queue_name = "dlexample";

    let mut wrapper = QueueWrapper::builder(queue_name)
        .exchange(ExchangeDefinition::new(exchange, "direct"))
        .bind(BindingDefinition::new(queue_name, routing_key, exchange))
        .dead_letter(
            DeadLetterDefinition::new("dlexample.dlx", "dlexample.dl", "dlexample.dl").attached(),
        )
        .build();
    wrapper.open().await?;

    let outcome = wrapper.publish(b"a message").await;
    wrapper.close().await;
    outcome?;

    Ok(())
}
