use futures_util::StreamExt;
use queue_wrapper::topology::{BindingDefinition, ExchangeDefinition};
use queue_wrapper::{QueueWrapper, QueueWrapperError};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Each consumer owns its wrapper and runs on its own task, until CTRL-C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut consumers = Vec::new();
    let mut stop_handles = Vec::new();
    for _ in 0..2 {
        let consumer_name = format!("consumer #{}", &Uuid::new_v4().to_string()[..8]);
        let mut wrapper = QueueWrapper::builder("cake")
            .exchange(ExchangeDefinition::new("cake.dx", "direct"))
            .bind(BindingDefinition::new("cake", "cake", "cake.dx"))
            .build();
        wrapper.open().await?;
        let deliveries = wrapper.start_consuming().await?;
        stop_handles.push(deliveries.stop_handle());
        consumers.push(tokio::spawn(consumer_loop(consumer_name, wrapper, deliveries)));
    }

    println!("I have moved on to other stuff");
    println!("waiting for CTRL-C");
    tokio::signal::ctrl_c().await?;
    for stop_handle in &stop_handles {
        stop_handle.stop();
    }
    for consumer in consumers {
        consumer.await??;
    }

    Ok(())
}

async fn consumer_loop(
    consumer_name: String,
    mut wrapper: QueueWrapper,
    mut deliveries: queue_wrapper::consumers::DeliveryStream,
) -> Result<(), QueueWrapperError> {
    while let Some(delivery) = deliveries.next().await {
        let delivery = delivery?;
        println!("{consumer_name} <- {}", String::from_utf8_lossy(&delivery.data));
        delivery.ack_multiple().await?;
    }
    println!("{consumer_name} is closing");
    wrapper.close().await;
    Ok(())
}
