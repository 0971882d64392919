use amq_protocol_types::{AMQPValue, FieldTable};
use lapin::options::BasicConsumeOptions;
use uuid::Uuid;

/// How to subscribe to the wrapper's queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumeDefinition {
    /// Consumer tag. Left empty, a unique `<queue>-<uuid>` tag is generated for each
    /// subscription.
    pub consumer: String,
    /// Let the broker consider deliveries acknowledged as soon as they are sent.
    pub auto_ack: bool,
    pub exclusive: bool,
    /// Do not receive messages published on the same connection.
    pub no_local: bool,
    pub no_wait: bool,
    /// Consumer priority. See <https://www.rabbitmq.com/consumer-priority.html>.
    pub priority: Option<i32>,
}

impl ConsumeDefinition {
    pub(crate) fn consumer_tag(&self, queue_name: &str) -> String {
        if self.consumer.is_empty() {
            format!("{queue_name}-{}", Uuid::new_v4())
        } else {
            self.consumer.clone()
        }
    }

    pub(crate) fn consume_options(&self) -> BasicConsumeOptions {
        BasicConsumeOptions {
            no_local: self.no_local,
            no_ack: self.auto_ack,
            exclusive: self.exclusive,
            nowait: self.no_wait,
        }
    }

    pub(crate) fn arguments(&self) -> FieldTable {
        let mut args = FieldTable::default();
        if let Some(priority) = self.priority {
            args.insert("x-priority".into(), AMQPValue::LongInt(priority));
        }
        args
    }
}
