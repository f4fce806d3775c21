//! In-process publisher over a tokio mpsc channel.

use tokio::sync::mpsc::{self, error::TrySendError};

use super::{PositionPublisher, TransportError};
use crate::simulation::PositionSample;

/// A sample together with the partition it was published under.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedSample {
    pub partition_key: String,
    pub sample: PositionSample,
}

/// Publisher that forwards samples into a bounded channel.
///
/// A full channel drops the sample with [`TransportError::Full`] instead of
/// blocking the tick.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<PublishedSample>,
}

impl ChannelPublisher {
    /// Creates a publisher and the receiving end of its channel.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PublishedSample>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl PositionPublisher for ChannelPublisher {
    async fn publish(
        &self,
        partition_key: &str,
        sample: &PositionSample,
    ) -> Result<(), TransportError> {
        let published = PublishedSample {
            partition_key: partition_key.to_string(),
            sample: sample.clone(),
        };
        self.tx.try_send(published).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Full,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }
}
