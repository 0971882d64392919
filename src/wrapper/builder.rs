use crate::amqp::configuration::RabbitMqSettings;
use crate::consumers::ConsumeDefinition;
use crate::publishers::PublishDefinition;
use crate::topology::{
    BindingDefinition, DeadLetterDefinition, ExchangeDefinition, QueueDefinition, Topology,
};
use crate::wrapper::QueueWrapper;

/// A builder for [`QueueWrapper`].
///
/// Use [`QueueWrapper::builder`] as entrypoint.
///
/// Setters are applied in call order. Each definition setter replaces its whole section: a
/// later call wins over an earlier one. [`create_queue`](QueueWrapperBuilder::create_queue) is
/// the exception, it owns `should_create` on its own: [`queue`](QueueWrapperBuilder::queue)
/// keeps whatever `create_queue` decided, in either order.
#[derive(Debug, Clone)]
pub struct QueueWrapperBuilder {
    settings: RabbitMqSettings,
    topology: Topology,
    publish: PublishDefinition,
    consume: ConsumeDefinition,
}

impl QueueWrapperBuilder {
    pub(super) fn new(queue_name: String) -> Self {
        Self {
            settings: RabbitMqSettings::default(),
            publish: PublishDefinition::for_queue(queue_name.as_str()),
            topology: Topology::new(queue_name),
            consume: ConsumeDefinition::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.settings.host = host.into();
        self
    }

    pub fn user(mut self, username: impl Into<String>) -> Self {
        self.settings.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.settings.password = password.into().into();
        self
    }

    pub fn vhost(mut self, vhost: impl Into<String>) -> Self {
        self.settings.vhost = vhost.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    /// Replace all the connection settings, e.g. with the ones loaded from your configuration.
    pub fn settings(mut self, settings: RabbitMqSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Declare the queue if missing (the default), or require it to exist already.
    pub fn create_queue(mut self, create: bool) -> Self {
        self.topology.queue.should_create = create;
        self
    }

    /// Replace the queue parameters. `should_create` is left as it is, see
    /// [`create_queue`](QueueWrapperBuilder::create_queue).
    pub fn queue(mut self, queue: QueueDefinition) -> Self {
        let should_create = self.topology.queue.should_create;
        self.topology.queue = QueueDefinition {
            should_create,
            ..queue
        };
        self
    }

    /// Declare an exchange before the queue.
    pub fn exchange(mut self, exchange: ExchangeDefinition) -> Self {
        self.topology.exchange = Some(exchange);
        self
    }

    /// Bind a queue to an exchange once the queue is declared.
    pub fn bind(mut self, binding: BindingDefinition) -> Self {
        self.topology.binding = Some(binding);
        self
    }

    /// See [`DeadLetterDefinition`] for when the dead-letter routing is actually applied.
    pub fn dead_letter(mut self, dead_letter: DeadLetterDefinition) -> Self {
        self.topology.dead_letter = Some(dead_letter);
        self
    }

    pub fn publish(mut self, publish: PublishDefinition) -> Self {
        self.publish = publish;
        self
    }

    pub fn consume(mut self, consume: ConsumeDefinition) -> Self {
        self.consume = consume;
        self
    }

    /// Finalise the configuration.
    ///
    /// Nothing is validated here: inconsistent topologies are only rejected by the broker when
    /// the wrapper is opened.
    pub fn build(self) -> QueueWrapper {
        let Self {
            settings,
            topology,
            publish,
            consume,
        } = self;

        if let Some(binding) = &topology.binding {
            let declared = topology.exchange.as_ref().map(|e| e.name.as_str());
            if declared != Some(binding.exchange.as_str()) {
                tracing::warn!(
                    queue_name = %topology.queue_name,
                    exchange = %binding.exchange,
                    "The binding references an exchange this queue wrapper does not declare, it must already exist on the broker"
                );
            }
        }
        if let Some(dead_letter) = topology.dead_letter.as_ref().filter(|d| !d.attach) {
            tracing::warn!(
                queue_name = %topology.queue_name,
                exchange = %dead_letter.exchange,
                "Dead-letter routing is recorded but not attached to the queue"
            );
        }

        QueueWrapper::new(settings, topology, publish, consume)
    }
}
