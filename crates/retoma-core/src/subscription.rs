use serde::{Deserialize, Serialize};

/// Wire protocol a subscription was created through. The admin surface is
/// partitioned per protocol; each facade variant only sees its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Amqp,
    Mqtt,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Amqp => "amqp",
            Protocol::Mqtt => "mqtt",
        }
    }
}

/// Subscription record stored in the `subscriptions` column family.
/// Created by the protocol/transport layer; the admin surface only lists and
/// force-closes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionRecord {
    pub id: String,
    pub name: String,
    pub destination: String,
    pub protocol: Protocol,
    pub active: bool,
}
