pub mod error;
pub mod facade;
pub mod restore;

pub use error::RestoreError;
pub use facade::{
    AmqpQueueResource, BrowsedMessage, FacadeCore, MqttTopicResource, ResourceFacade,
    SubscriptionQuery,
};
pub use restore::RestoreEngine;
