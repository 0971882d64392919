use crate::amqp::configuration::RabbitMqSettings;
use crate::amqp::{BrokerChannel, Channel, Connection, ConnectionFactory};
use crate::consumers::{ConsumeDefinition, DeliveryStream};
use crate::error::QueueWrapperError;
use crate::publishers::{self, PublishDefinition};
use crate::topology::Topology;
use crate::wrapper::QueueWrapperBuilder;
use lapin::options::ConfirmSelectOptions;
use std::future::Future;
use std::sync::Arc;

/// Reply code sent to the broker on a regular shutdown.
const REPLY_SUCCESS: u16 = 200;

/// One queue on a RabbitMq broker, with the connection and channel used to reach it.
///
/// A wrapper is configured with [`QueueWrapper::builder`], then [`open`](QueueWrapper::open)ed:
/// that connects to the broker and declares the whole topology. Once open you can
/// [`publish`](QueueWrapper::publish) messages or
/// [`start_consuming`](QueueWrapper::start_consuming) them.
///
/// # Lifecycle
///
/// `Configured` → `Open` → `Closed`. A closed wrapper cannot be reopened, build a new one.
/// A wrapper dropped while open closes its connection in the background, as long as it is
/// dropped inside a tokio runtime.
///
/// # Example
///
/// ```rust,no_run
/// use queue_wrapper::topology::{BindingDefinition, ExchangeDefinition};
/// use queue_wrapper::QueueWrapper;
///
/// # async fn run() -> Result<(), queue_wrapper::QueueWrapperError> {
/// let mut wrapper = QueueWrapper::builder("cake")
///     .exchange(ExchangeDefinition::new("cake.dx", "direct"))
///     .bind(BindingDefinition::new("cake", "cake", "cake.dx"))
///     .build();
/// wrapper.open().await?;
/// wrapper.publish(br#"{"flavour":"carrot"}"#).await?;
/// wrapper.close().await;
/// # Ok(())
/// # }
/// ```
pub struct QueueWrapper {
    settings: RabbitMqSettings,
    topology: Topology,
    publish: PublishDefinition,
    consume: ConsumeDefinition,
    state: State,
}

/// Where a [`QueueWrapper`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperState {
    /// Built, no broker resources held yet.
    Configured,
    /// Connected, with the topology declared.
    Open,
    /// Released. Terminal.
    Closed,
}

enum State {
    Configured,
    Open(Session),
    Closed,
}

struct Session {
    connection: Connection,
    channel: Arc<Channel>,
}

impl Session {
    /// Close the channel, then the connection. Failures are only logged.
    async fn close(self, queue_name: &str) {
        close_channel(self.channel.as_ref(), queue_name).await;
        close_connection(&self.connection, queue_name).await;
    }
}

async fn close_channel(channel: &impl BrokerChannel, queue_name: &str) {
    if let Err(e) = channel.close(REPLY_SUCCESS, "OK").await {
        tracing::warn!(queue_name = %queue_name, error = %e, "Failed to close RabbitMq channel");
    }
}

async fn close_connection(connection: &Connection, queue_name: &str) {
    if let Err(e) = connection.close(REPLY_SUCCESS, "OK").await {
        tracing::warn!(queue_name = %queue_name, error = %e, "Failed to close RabbitMq connection");
    }
}

/// Enable publisher confirms when asked to, then declare the topology.
///
/// If either step fails the channel is closed and `release_connection` runs before the error
/// is returned.
async fn prepare<C, F, Fut>(
    channel: &C,
    topology: &Topology,
    publish: &PublishDefinition,
    release_connection: F,
) -> Result<(), QueueWrapperError>
where
    C: BrokerChannel,
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let outcome = configure(channel, topology, publish).await;
    if outcome.is_err() {
        close_channel(channel, &topology.queue_name).await;
        release_connection().await;
    }
    outcome
}

async fn configure(
    channel: &impl BrokerChannel,
    topology: &Topology,
    publish: &PublishDefinition,
) -> Result<(), QueueWrapperError> {
    if publish.confirm {
        channel
            .confirm_select(ConfirmSelectOptions { nowait: false })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to enable publisher confirms");
                QueueWrapperError::Channel(e)
            })?;
    }
    topology.declare(channel).await
}

impl QueueWrapper {
    /// Start building a [`QueueWrapper`] for `queue_name`.
    pub fn builder(queue_name: impl Into<String>) -> QueueWrapperBuilder {
        QueueWrapperBuilder::new(queue_name.into())
    }

    pub(super) fn new(
        settings: RabbitMqSettings,
        topology: Topology,
        publish: PublishDefinition,
        consume: ConsumeDefinition,
    ) -> Self {
        Self {
            settings,
            topology,
            publish,
            consume,
            state: State::Configured,
        }
    }

    /// Connect to the broker and declare the topology.
    ///
    /// On failure every resource acquired so far is released and the wrapper stays
    /// `Configured`, so `open` can be retried.
    #[tracing::instrument(name = "queue_wrapper_open", skip(self), fields(queue_name = %self.topology.queue_name))]
    pub async fn open(&mut self) -> Result<(), QueueWrapperError> {
        match self.state {
            State::Configured => {}
            State::Open(_) => return Err(QueueWrapperError::AlreadyOpen),
            State::Closed => return Err(QueueWrapperError::Closed),
        }

        let factory = ConnectionFactory::new_from_config(&self.settings).map_err(|e| {
            tracing::error!(error = ?e, "Invalid RabbitMq settings");
            QueueWrapperError::Configuration(e)
        })?;
        let connection = factory.new_connection().await.map_err(|e| {
            tracing::error!(error = ?e, "Failed to connect to RabbitMq");
            QueueWrapperError::Connection(e)
        })?;

        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open a channel");
                close_connection(&connection, &self.topology.queue_name).await;
                return Err(QueueWrapperError::Channel(e));
            }
        };
        let session = Session {
            connection,
            channel: Arc::new(channel),
        };

        let queue_name = self.topology.queue_name.as_str();
        prepare(session.channel.as_ref(), &self.topology, &self.publish, || {
            close_connection(&session.connection, queue_name)
        })
        .await?;

        tracing::info!(dsn = %factory.dsn(), "Queue wrapper is open");
        self.state = State::Open(session);
        Ok(())
    }

    /// Subscribe to the queue.
    ///
    /// The queue is re-declared first. Each call creates a new, independent subscription.
    ///
    /// When the queue must already exist and is missing, the broker answers the check by
    /// closing the channel: every later call fails as well, even once the queue is created.
    /// [`close`](QueueWrapper::close) this wrapper and open a new one.
    pub async fn start_consuming(&self) -> Result<DeliveryStream, QueueWrapperError> {
        let session = self.session()?;
        DeliveryStream::start(Arc::clone(&session.channel), &self.topology, &self.consume).await
    }

    /// Publish `body` as a persistent message.
    ///
    /// The queue is re-declared first. Nothing is published if that fails.
    ///
    /// A [`QueueNotFound`](QueueWrapperError::QueueNotFound) for a queue that must already
    /// exist leaves the channel closed by the broker, so later calls keep failing.
    /// [`close`](QueueWrapper::close) this wrapper and open a new one.
    pub async fn publish(&self, body: &[u8]) -> Result<(), QueueWrapperError> {
        let session = self.session()?;
        publishers::publish(session.channel.as_ref(), &self.topology, &self.publish, body).await
    }

    /// Release the channel, then the connection.
    ///
    /// Never fails: problems are logged. The wrapper is `Closed` afterwards whatever state it
    /// was in.
    #[tracing::instrument(name = "queue_wrapper_close", skip(self), fields(queue_name = %self.topology.queue_name))]
    pub async fn close(&mut self) {
        if let State::Open(session) = std::mem::replace(&mut self.state, State::Closed) {
            session.close(&self.topology.queue_name).await;
            tracing::info!("Queue wrapper is closed");
        }
    }

    pub fn state(&self) -> WrapperState {
        match self.state {
            State::Configured => WrapperState::Configured,
            State::Open(_) => WrapperState::Open,
            State::Closed => WrapperState::Closed,
        }
    }

    pub fn queue_name(&self) -> &str {
        &self.topology.queue_name
    }

    pub fn settings(&self) -> &RabbitMqSettings {
        &self.settings
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn publish_definition(&self) -> &PublishDefinition {
        &self.publish
    }

    pub fn consume_definition(&self) -> &ConsumeDefinition {
        &self.consume
    }

    fn session(&self) -> Result<&Session, QueueWrapperError> {
        match &self.state {
            State::Open(session) => Ok(session),
            State::Configured => Err(QueueWrapperError::NotOpen),
            State::Closed => Err(QueueWrapperError::Closed),
        }
    }
}

impl Drop for QueueWrapper {
    fn drop(&mut self) {
        if let State::Open(session) = std::mem::replace(&mut self.state, State::Closed) {
            let queue_name = self.topology.queue_name.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move { session.close(&queue_name).await });
                }
                Err(_) => tracing::warn!(
                    queue_name = %queue_name,
                    "Queue wrapper dropped outside of a tokio runtime while open, its connection is not closed gracefully"
                ),
            }
        }
    }
}

impl std::fmt::Debug for QueueWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueWrapper")
            .field("settings", &self.settings)
            .field("topology", &self.topology)
            .field("publish", &self.publish)
            .field("consume", &self.consume)
            .field("state", &self.state())
            .finish()
    }
}
