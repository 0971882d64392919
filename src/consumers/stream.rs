use crate::amqp::{BrokerChannel, DeliverySource};
use crate::consumers::{ConsumeDefinition, Delivery};
use crate::error::QueueWrapperError;
use crate::topology::Topology;
use futures_util::stream::{AbortHandle, Abortable};
use futures_util::Stream;
use lapin::options::BasicCancelOptions;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// The deliveries pushed by the broker to one subscription on the wrapper's queue.
///
/// The stream ends when the channel or connection closes, when the broker cancels the
/// subscription, or when it is stopped through a [`StopHandle`] or [`DeliveryStream::cancel`].
/// A stream that ended cannot be restarted: subscribe again with
/// [`QueueWrapper::start_consuming`](crate::wrapper::QueueWrapper::start_consuming).
pub struct DeliveryStream {
    inner: Pin<Box<Abortable<DeliverySource>>>,
    abort_handle: AbortHandle,
    channel: Arc<dyn BrokerChannel>,
    consumer_tag: String,
    queue_name: String,
}

/// Stops a [`DeliveryStream`] from another task.
///
/// The broker is not told about it: deliveries already pushed to the stopped subscription stay
/// unacknowledged until the channel closes.
#[derive(Debug, Clone)]
pub struct StopHandle(AbortHandle);

impl StopHandle {
    pub fn stop(&self) {
        self.0.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.is_aborted()
    }
}

impl DeliveryStream {
    /// Make sure the queue is ready, then subscribe to it.
    #[tracing::instrument(name = "consumer_start", skip_all, fields(queue_name = %topology.queue_name))]
    pub(crate) async fn start<C>(
        channel: Arc<C>,
        topology: &Topology,
        definition: &ConsumeDefinition,
    ) -> Result<Self, QueueWrapperError>
    where
        C: BrokerChannel + 'static,
    {
        topology.ensure_queue(channel.as_ref()).await?;

        let queue_name = topology.queue_name.clone();
        let consumer_tag = definition.consumer_tag(&queue_name);
        let source = channel
            .basic_consume(
                &queue_name,
                &consumer_tag,
                definition.consume_options(),
                definition.arguments(),
            )
            .await
            .map_err(|source| {
                tracing::error!(queue_name = %queue_name, error = %source, "Failed to start consuming");
                QueueWrapperError::Consume {
                    queue: queue_name.clone(),
                    source,
                }
            })?;
        tracing::debug!(consumer_tag = %consumer_tag, "Consumer registered");

        let (inner, abort_handle) = futures_util::stream::abortable(source);
        Ok(Self {
            inner: Box::pin(inner),
            abort_handle,
            channel,
            consumer_tag,
            queue_name,
        })
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.abort_handle.clone())
    }

    /// Cancel the subscription with the broker, then end the stream.
    ///
    /// The stream ends even if the broker could not be reached.
    pub async fn cancel(self) -> Result<(), QueueWrapperError> {
        let outcome = self
            .channel
            .basic_cancel(&self.consumer_tag, BasicCancelOptions { nowait: false })
            .await
            .map_err(|source| {
                tracing::warn!(queue_name = %self.queue_name, error = %source, "Failed to cancel consumer");
                QueueWrapperError::Consume {
                    queue: self.queue_name.clone(),
                    source,
                }
            });
        self.abort_handle.abort();
        outcome
    }

    pub fn consumer_tag(&self) -> &str {
        &self.consumer_tag
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }
}

impl Stream for DeliveryStream {
    type Item = Result<Delivery, QueueWrapperError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(delivery))) => Poll::Ready(Some(Ok(delivery.into()))),
            Poll::Ready(Some(Err(source))) => {
                tracing::error!(queue_name = %this.queue_name, error = %source, "Consumer error");
                Poll::Ready(Some(Err(QueueWrapperError::Consume {
                    queue: this.queue_name.clone(),
                    source,
                })))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl std::fmt::Debug for DeliveryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryStream")
            .field("consumer_tag", &self.consumer_tag)
            .field("queue_name", &self.queue_name)
            .field("stopped", &self.abort_handle.is_aborted())
            .finish()
    }
}
