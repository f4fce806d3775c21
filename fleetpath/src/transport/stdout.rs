//! Publisher writing one JSON document per line.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::{PositionPublisher, TransportError};
use crate::simulation::PositionSample;

#[derive(Serialize)]
struct Envelope<'a> {
    partition: &'a str,
    #[serde(flatten)]
    sample: &'a PositionSample,
}

/// Writes `{"partition": ..., <sample fields>}` lines to a writer (stdout by default).
#[derive(Clone)]
pub struct JsonLinesPublisher {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl JsonLinesPublisher {
    /// Publisher writing to stdout.
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(writer)),
        }
    }

    fn write_line(&self, partition_key: &str, sample: &PositionSample) -> Result<(), TransportError> {
        let line = serde_json::to_string(&Envelope {
            partition: partition_key,
            sample,
        })
        .map_err(|e| TransportError::Encode(e.to_string()))?;

        let mut out = self.out.lock();
        writeln!(out, "{}", line).map_err(|e| TransportError::Io(e.to_string()))?;
        out.flush().map_err(|e| TransportError::Io(e.to_string()))
    }
}

impl PositionPublisher for JsonLinesPublisher {
    async fn publish(
        &self,
        partition_key: &str,
        sample: &PositionSample,
    ) -> Result<(), TransportError> {
        self.write_line(partition_key, sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coordinate;
    use crate::geometry::RouteKey;
    use chrono::Utc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_writes_one_json_object_per_line() {
        let buffer = SharedBuffer::default();
        let publisher = JsonLinesPublisher::with_writer(Box::new(buffer.clone()));
        let sample = PositionSample {
            vehicle_id: "bus-7".to_string(),
            route: RouteKey::outbound("728"),
            coordinate: Coordinate::new(38.7, -9.1).unwrap(),
            speed_kmh: 31.5,
            timestamp: Utc::now(),
            fallback: false,
        };

        publisher.publish("728", &sample).await.unwrap();
        publisher.publish("728", &sample).await.unwrap();

        let text = String::from_utf8(buffer.0.lock().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["partition"], "728");
        assert_eq!(value["vehicle_id"], "bus-7");
        assert_eq!(value["route"], "728:outbound");
    }
}
