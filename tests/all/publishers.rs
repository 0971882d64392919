use crate::helpers::{open, temporary_queue, unique_queue_name};
use queue_wrapper::publishers::PublishDefinition;
use queue_wrapper::topology::ExchangeDefinition;
use queue_wrapper::QueueWrapperError;

#[tokio::test]
#[ignore = "requires a running RabbitMQ broker"]
async fn confirmed_messages_are_accepted_by_the_broker() {
    let queue_name = unique_queue_name();
    let wrapper = open(temporary_queue(&queue_name).publish(PublishDefinition {
        confirm: true,
        mandatory: true,
        ..PublishDefinition::for_queue(&queue_name)
    }))
    .await;

    wrapper.publish(b"hello").await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running RabbitMQ broker"]
async fn an_unroutable_mandatory_message_is_a_publish_error() {
    // Arrange
    let queue_name = unique_queue_name();
    let exchange = format!("{queue_name}.unbound");
    let wrapper = open(
        temporary_queue(&queue_name)
            .exchange(ExchangeDefinition {
                durable: false,
                auto_delete: true,
                ..ExchangeDefinition::new(&exchange, "direct")
            })
            .publish(PublishDefinition {
                confirm: true,
                mandatory: true,
                ..PublishDefinition::new(&exchange, "nowhere")
            }),
    )
    .await;

    // Act
    let outcome = wrapper.publish(b"hello").await;

    // Assert
    assert!(matches!(
        outcome,
        Err(QueueWrapperError::Publish { routing_key, .. }) if routing_key == "nowhere"
    ));
}
