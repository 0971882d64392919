//! Receive messages from the wrapper's queue. Check out [`DeliveryStream`] as a starting point.
mod definition;
mod delivery;
mod stream;

pub use definition::ConsumeDefinition;
pub use delivery::Delivery;
pub use stream::{DeliveryStream, StopHandle};
