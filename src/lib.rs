//! `queue-wrapper` wraps a single RabbitMq queue, built on top of [`lapin`].
//!
//! You describe the queue, and optionally the exchange, binding and dead-letter routing around
//! it, with [`QueueWrapper::builder`]. [`QueueWrapper::open`] connects to the broker and
//! declares all of it in one go. From there you get a stream of incoming deliveries with
//! [`QueueWrapper::start_consuming`], or publish persistent messages with
//! [`QueueWrapper::publish`].
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use queue_wrapper::QueueWrapper;
//!
//! # async fn run() -> Result<(), queue_wrapper::QueueWrapperError> {
//! let mut wrapper = QueueWrapper::builder("cake").build();
//! wrapper.open().await?;
//!
//! let mut deliveries = wrapper.start_consuming().await?;
//! while let Some(delivery) = deliveries.next().await {
//!     let delivery = delivery?;
//!     println!("{}", String::from_utf8_lossy(&delivery.data));
//!     delivery.ack().await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Examples
//!
//! Check the `demos` directory to see the library in action.

pub mod amqp;
pub mod consumers;
mod error;
pub mod publishers;
#[cfg(test)]
mod testing;
pub mod topology;
pub mod wrapper;

pub use error::QueueWrapperError;
pub use wrapper::{QueueWrapper, QueueWrapperBuilder, WrapperState};
