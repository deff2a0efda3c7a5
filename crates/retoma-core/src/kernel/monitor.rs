use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use tracing::{info, warn};

use crate::config::FlowControlConfig;
use crate::error::MonitorError;
use crate::kernel::{Kernel, NodeKernel};

/// Watermark-driven flow-control monitor.
///
/// Polls the stored message count on a dedicated thread. Crossing the high
/// watermark blocks every registered flow-control channel; falling back to
/// the low watermark unblocks them. The gap between the two watermarks keeps
/// the channels from flapping around a single threshold.
pub struct ResourceMonitor {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl ResourceMonitor {
    pub fn start(
        kernel: Arc<NodeKernel>,
        config: FlowControlConfig,
    ) -> Result<Self, MonitorError> {
        let (shutdown, shutdown_rx) = bounded::<()>(1);
        let poll = Duration::from_millis(config.poll_interval_ms);

        let handle = std::thread::Builder::new()
            .name("resource-monitor".to_string())
            .spawn(move || {
                info!(
                    high = config.high_watermark,
                    low = config.low_watermark,
                    "resource monitor started"
                );
                let mut blocked = false;
                loop {
                    match shutdown_rx.recv_timeout(poll) {
                        Err(RecvTimeoutError::Timeout) => match kernel.stored_message_count() {
                            Ok(count) => {
                                if !blocked && count >= config.high_watermark {
                                    kernel.block_channels();
                                    blocked = true;
                                    warn!(count, high = config.high_watermark, "flow control engaged");
                                } else if blocked && count <= config.low_watermark {
                                    kernel.unblock_channels();
                                    blocked = false;
                                    info!(count, low = config.low_watermark, "flow control released");
                                }
                            }
                            Err(error) => {
                                warn!(%error, "resource monitor failed to read message count");
                            }
                        },
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("resource monitor stopped");
            })
            .map_err(|e| MonitorError::Spawn(e.to_string()))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::flow::FlowState;
    use crate::message::{AckMode, ContentPart, Message, MessageId, MessageMetadata};
    use crate::storage::RocksDbStorage;
    use std::time::Instant;

    fn outbound(destination: &str, payload: &[u8]) -> Message {
        let metadata = MessageMetadata {
            id: MessageId(0),
            destination: destination.to_string(),
            storage_queue: format!("queue:{destination}:node-0"),
            exchange: "amq.direct".to_string(),
            routing_key: destination.to_string(),
            content_length: 0,
            published_at: 1_000,
        };
        Message::new(
            metadata,
            vec![ContentPart {
                index: 0,
                data: payload.to_vec(),
            }],
        )
    }

    fn wait_for(channel: &crate::flow::FlowControlChannel, state: FlowState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while channel.snapshot() != state {
            assert!(Instant::now() < deadline, "timed out waiting for {state:?}");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn blocks_above_high_watermark_and_releases_below_low() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(RocksDbStorage::open(dir.path()).unwrap());
        let kernel = Arc::new(NodeKernel::new(storage, &KernelConfig::default()).unwrap());
        let channel = kernel.create_channel();

        let config = FlowControlConfig {
            high_watermark: 3,
            low_watermark: 1,
            poll_interval_ms: 10,
        };
        let _monitor = ResourceMonitor::start(Arc::clone(&kernel), config).unwrap();

        for _ in 0..3 {
            kernel.admit(outbound("orders", b"x"), AckMode::PublisherAck).unwrap();
        }
        wait_for(&channel, FlowState::Blocked);

        kernel.purge("orders").unwrap();
        wait_for(&channel, FlowState::Open);
    }

    #[test]
    fn drop_joins_the_monitor_thread() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(RocksDbStorage::open(dir.path()).unwrap());
        let kernel = Arc::new(NodeKernel::new(storage, &KernelConfig::default()).unwrap());

        let monitor =
            ResourceMonitor::start(Arc::clone(&kernel), FlowControlConfig::default()).unwrap();
        drop(monitor);
    }
}
