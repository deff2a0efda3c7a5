use std::sync::Arc;

use retoma_core::{DestinationKind, Protocol};

use super::{FacadeCore, ResourceFacade};

/// AMQP queue view over the shared facade core.
pub struct AmqpQueueResource {
    core: Arc<FacadeCore>,
}

impl AmqpQueueResource {
    pub fn new(core: Arc<FacadeCore>) -> Self {
        Self { core }
    }
}

impl ResourceFacade for AmqpQueueResource {
    fn core(&self) -> &FacadeCore {
        &self.core
    }

    fn protocol(&self) -> Protocol {
        Protocol::Amqp
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::Queue
    }
}
