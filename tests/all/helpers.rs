use queue_wrapper::amqp::configuration::RabbitMqSettings;
use queue_wrapper::{QueueWrapper, QueueWrapperBuilder};
use uuid::Uuid;

pub fn get_rabbitmq_settings() -> RabbitMqSettings {
    RabbitMqSettings::default()
}

/// A queue name no other test uses.
pub fn unique_queue_name() -> String {
    format!("queue-wrapper-test-{}", Uuid::new_v4())
}

/// A wrapper on a throwaway queue, deleted by the broker once its last consumer is gone.
pub fn temporary_queue(queue_name: &str) -> QueueWrapperBuilder {
    QueueWrapper::builder(queue_name)
        .settings(get_rabbitmq_settings())
        .queue(queue_wrapper::topology::QueueDefinition {
            durable: false,
            auto_delete: true,
            ..Default::default()
        })
}

pub async fn open(builder: QueueWrapperBuilder) -> QueueWrapper {
    let mut wrapper = builder.build();
    wrapper
        .open()
        .await
        .expect("Failed to open the queue wrapper, is RabbitMq running on localhost:5672?");
    wrapper
}
