use std::sync::Arc;

use retoma_core::{DestinationKind, Protocol};

use super::{FacadeCore, ResourceFacade};

/// MQTT topic view over the shared facade core.
pub struct MqttTopicResource {
    core: Arc<FacadeCore>,
}

impl MqttTopicResource {
    pub fn new(core: Arc<FacadeCore>) -> Self {
        Self { core }
    }
}

impl ResourceFacade for MqttTopicResource {
    fn core(&self) -> &FacadeCore {
        &self.core
    }

    fn protocol(&self) -> Protocol {
        Protocol::Mqtt
    }

    fn kind(&self) -> DestinationKind {
        DestinationKind::Topic
    }
}
