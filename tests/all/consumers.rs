use crate::helpers::{open, temporary_queue, unique_queue_name};
use futures_util::StreamExt;
use queue_wrapper::consumers::{Delivery, DeliveryStream};
use queue_wrapper::publishers::PublishDefinition;
use queue_wrapper::topology::{BindingDefinition, ExchangeDefinition};
use std::collections::HashSet;
use std::time::Duration;

async fn next_delivery(stream: &mut DeliveryStream) -> Delivery {
    tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("No delivery within 5 seconds")
        .expect("The delivery stream ended")
        .expect("The delivery stream failed")
}

#[tokio::test]
#[ignore = "requires a running RabbitMQ broker"]
async fn a_message_published_on_the_exchange_reaches_the_bound_queue() {
    // Arrange
    let queue_name = unique_queue_name();
    let wrapper = open(
        temporary_queue(&queue_name)
            .exchange(ExchangeDefinition::new("cake.dx", "direct"))
            .bind(BindingDefinition::new(&queue_name, &queue_name, "cake.dx"))
            .publish(PublishDefinition::new("cake.dx", &queue_name)),
    )
    .await;
    let mut stream = wrapper.start_consuming().await.unwrap();

    // Act
    wrapper.publish(b"hello").await.unwrap();

    // Assert
    let delivery = next_delivery(&mut stream).await;
    assert_eq!(delivery.data, b"hello");
    assert_eq!(delivery.exchange.as_str(), "cake.dx");
    assert_eq!(delivery.content_type(), Some("application/json"));
    delivery.ack().await.unwrap();

    stream.cancel().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running RabbitMQ broker"]
async fn messages_are_shared_fairly_between_consumers_of_the_same_queue() {
    // Arrange
    const MESSAGES: usize = 10;
    let queue_name = unique_queue_name();
    let first = open(temporary_queue(&queue_name)).await;
    let second = open(temporary_queue(&queue_name)).await;
    let first_stream = first.start_consuming().await.unwrap();
    let second_stream = second.start_consuming().await.unwrap();

    // Act
    for i in 0..MESSAGES {
        first.publish(i.to_string().as_bytes()).await.unwrap();
    }
    let drain = |mut stream: DeliveryStream| async move {
        let mut bodies = Vec::new();
        while let Ok(Some(Ok(delivery))) =
            tokio::time::timeout(Duration::from_secs(2), stream.next()).await
        {
            delivery.ack().await.unwrap();
            bodies.push(String::from_utf8(delivery.data).unwrap());
        }
        bodies
    };
    let (first_bodies, second_bodies) = tokio::join!(drain(first_stream), drain(second_stream));

    // Assert
    assert!(!first_bodies.is_empty());
    assert!(!second_bodies.is_empty());
    assert_eq!(first_bodies.len() + second_bodies.len(), MESSAGES);
    let received: HashSet<_> = first_bodies.into_iter().chain(second_bodies).collect();
    let expected: HashSet<_> = (0..MESSAGES).map(|i| i.to_string()).collect();
    assert_eq!(received, expected);
}

#[tokio::test]
#[ignore = "requires a running RabbitMQ broker"]
async fn redeclaring_the_queue_does_not_disturb_an_active_stream() {
    // Arrange
    let queue_name = unique_queue_name();
    let consumer = open(temporary_queue(&queue_name)).await;
    let publisher = open(temporary_queue(&queue_name)).await;
    let mut stream = consumer.start_consuming().await.unwrap();

    // Act
    publisher.publish(b"first").await.unwrap();
    let first = next_delivery(&mut stream).await;
    first.ack().await.unwrap();
    // Both publishes re-declare the queue before sending
    consumer.publish(b"second").await.unwrap();
    publisher.publish(b"third").await.unwrap();

    // Assert
    let second = next_delivery(&mut stream).await;
    second.ack().await.unwrap();
    let third = next_delivery(&mut stream).await;
    third.ack().await.unwrap();
    assert_eq!(first.data, b"first");
    assert_eq!(second.data, b"second");
    assert_eq!(third.data, b"third");
}

#[tokio::test]
#[ignore = "requires a running RabbitMQ broker"]
async fn a_stopped_stream_ends() {
    let queue_name = unique_queue_name();
    let wrapper = open(temporary_queue(&queue_name)).await;
    let mut stream = wrapper.start_consuming().await.unwrap();
    let stop_handle = stream.stop_handle();

    stop_handle.stop();

    assert!(stream.next().await.is_none());
}
