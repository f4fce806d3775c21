//! Transport collaborator for position samples.
//!
//! The scheduler hands every [`PositionSample`] to a [`PositionPublisher`]
//! with the line id as partition key. Delivery is fire-and-forget: failures
//! are counted by the caller and never retried.

mod channel;
mod stdout;

use std::future::Future;

use thiserror::Error;

use crate::simulation::PositionSample;

pub use channel::{ChannelPublisher, PublishedSample};
pub use stdout::JsonLinesPublisher;

/// Errors returned by publishers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The consumer side is gone.
    #[error("Transport closed")]
    Closed,

    /// The consumer cannot keep up.
    #[error("Transport full, sample dropped")]
    Full,

    /// Sample could not be encoded.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Publishes samples to downstream consumers.
pub trait PositionPublisher: Send + Sync + 'static {
    /// Publishes one sample under `partition_key` (the line id).
    fn publish(
        &self,
        partition_key: &str,
        sample: &PositionSample,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
