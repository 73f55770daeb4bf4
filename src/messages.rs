// src/messages.rs
//
// Payloads the exemplar indicators read from the bus. The bus delivers raw
// bytes per topic; these are JSON-encoded. An empty payload means
// "nothing published this tick".

use crate::types::ParkingSpaceWgs84;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod topic {
    pub const PARKING_STATE: &str = "PARKING_STATE";
    pub const PARKING_SPACE: &str = "PARKING_SPACE";
}

/// Non-blocking read of the current tick's payload for a topic.
pub trait MessageSource {
    /// Empty slice when nothing was published.
    fn get_message(&self, topic: &str) -> &[u8];
}

/// Current-tick payloads keyed by topic.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    payloads: HashMap<String, Vec<u8>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, topic: &str, payload: Vec<u8>) {
        self.payloads.insert(topic.to_string(), payload);
    }

    pub fn publish_json<T: Serialize>(&mut self, topic: &str, message: &T) -> serde_json::Result<()> {
        let payload = serde_json::to_vec(message)?;
        self.publish(topic, payload);
        Ok(())
    }

    /// Start a new tick.
    pub fn clear(&mut self) {
        self.payloads.clear();
    }
}

impl MessageSource for MessageStore {
    fn get_message(&self, topic: &str) -> &[u8] {
        self.payloads.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ============================================================================
// PARKING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParkingStage {
    Idle,
    Searching,
    ParkingIn,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingStateMsg {
    pub stage: ParkingStage,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParkingSpaceMsg {
    #[serde(default)]
    pub spaces: Vec<ParkingSpaceWgs84>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_topic_is_empty() {
        let mut store = MessageStore::new();
        assert!(store.get_message(topic::PARKING_STATE).is_empty());

        store
            .publish_json(
                topic::PARKING_STATE,
                &ParkingStateMsg {
                    stage: ParkingStage::ParkingIn,
                },
            )
            .unwrap();
        let raw = store.get_message(topic::PARKING_STATE);
        let msg: ParkingStateMsg = serde_json::from_slice(raw).unwrap();
        assert_eq!(msg.stage, ParkingStage::ParkingIn);

        store.clear();
        assert!(store.get_message(topic::PARKING_STATE).is_empty());
    }
}
