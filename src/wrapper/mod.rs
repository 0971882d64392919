//! The [`QueueWrapper`] aggregate and its builder.
mod builder;
mod queue_wrapper;

pub use builder::QueueWrapperBuilder;
pub use queue_wrapper::{QueueWrapper, WrapperState};
