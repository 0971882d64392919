use futures_util::StreamExt;
use queue_wrapper::topology::{BindingDefinition, ExchangeDefinition};
use queue_wrapper::QueueWrapper;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Consume on the main task until the stream ends.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let consumer_name = format!("consumer #{}", &Uuid::new_v4().to_string()[..8]);
    let exchange = "cake.dx";
    let routing_key = "cake";
    let queue_name = "cake";

    // The exchange is declared too, so that the binding does not fail on the first run.
    let mut wrapper = QueueWrapper::builder(queue_name)
        .exchange(ExchangeDefinition::new(exchange, "direct"))
        .bind(BindingDefinition::new(queue_name, routing_key, exchange))
        .build();
    wrapper.open().await?;

    let mut deliveries = wrapper.start_consuming().await?;
    while let Some(delivery) = deliveries.next().await {
        let delivery = delivery?;
        println!("{consumer_name} <- {}", String::from_utf8_lossy(&delivery.data));
        delivery.ack_multiple().await?;
    }

    wrapper.close().await;
    Ok(())
}
