pub mod config;
pub mod destination;
pub mod error;
pub mod flow;
pub mod kernel;
pub mod message;
pub mod storage;
pub mod subscription;
pub mod telemetry;

pub use config::{AdminConfig, FlowControlConfig, KernelConfig, TelemetryConfig};
pub use destination::{DestinationKind, DestinationRecord};
pub use error::{ConfigError, KernelError, MonitorError, StorageError, StorageResult};
pub use flow::{FlowControlChannel, FlowState};
pub use kernel::{Kernel, NodeKernel, ResourceMonitor};
pub use message::{AckMode, ContentPart, Message, MessageId, MessageMetadata};
pub use storage::{RocksDbStorage, Storage, WriteBatchOp};
pub use subscription::{Protocol, SubscriptionRecord};
