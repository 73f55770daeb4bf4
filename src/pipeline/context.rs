// src/pipeline/context.rs
//
// What an indicator sees at each lifecycle call. Every indicator on a tick
// reads the same StepContext, so they all agree on time, actors and bus
// contents.

use crate::config::ThresholdLookup;
use crate::indicator::NoDataReason;
use crate::map::MapAccess;
use crate::messages::MessageSource;
use crate::types::{ActorSnapshot, ActorState};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::debug;

pub struct InitContext<'a> {
    pub config: &'a dyn ThresholdLookup,
    pub report_enabled: bool,
}

impl<'a> InitContext<'a> {
    pub fn new(config: &'a dyn ThresholdLookup) -> Self {
        Self {
            config,
            report_enabled: true,
        }
    }

    pub fn with_report(mut self, enabled: bool) -> Self {
        self.report_enabled = enabled;
        self
    }
}

pub struct StepContext<'a> {
    pub sim_time_s: f64,
    pub actors: &'a ActorSnapshot,
    pub map: &'a dyn MapAccess,
    pub messages: &'a dyn MessageSource,
}

impl<'a> StepContext<'a> {
    pub fn new(
        sim_time_s: f64,
        actors: &'a ActorSnapshot,
        map: &'a dyn MapAccess,
        messages: &'a dyn MessageSource,
    ) -> Self {
        Self {
            sim_time_s,
            actors,
            map,
            messages,
        }
    }

    pub fn ego(&self) -> Result<&ActorState, NoDataReason> {
        self.actors.ego().ok_or(NoDataReason::MissingEgo)
    }

    /// Decode a JSON payload from the bus. Nothing published and an
    /// undecodable payload are both "no data" for this tick.
    pub fn decode<T: DeserializeOwned>(&self, topic: &'static str) -> Result<T, NoDataReason> {
        let raw = self.messages.get_message(topic);
        if raw.is_empty() {
            return Err(NoDataReason::MissingMessage(topic));
        }
        serde_json::from_slice(raw).map_err(|e| {
            debug!("Malformed payload on {}: {}", topic, e);
            NoDataReason::MalformedMessage(topic)
        })
    }
}

pub struct StopContext<'a> {
    pub sim_time_s: f64,
    pub feedback: &'a mut BTreeMap<String, String>,
}

impl<'a> StopContext<'a> {
    pub fn new(sim_time_s: f64, feedback: &'a mut BTreeMap<String, String>) -> Self {
        Self {
            sim_time_s,
            feedback,
        }
    }

    pub fn set_feedback(&mut self, key: &str, value: impl ToString) {
        self.feedback.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geodetic;
    use crate::map::LocalMap;
    use crate::messages::{topic, MessageStore, ParkingStateMsg};

    #[test]
    fn test_decode_distinguishes_missing_and_malformed() {
        let actors = ActorSnapshot::default();
        let map = LocalMap::new(Geodetic::default());
        let mut store = MessageStore::new();

        {
            let ctx = StepContext::new(0.0, &actors, &map, &store);
            let r: Result<ParkingStateMsg, _> = ctx.decode(topic::PARKING_STATE);
            assert_eq!(r.unwrap_err(), NoDataReason::MissingMessage(topic::PARKING_STATE));
            assert_eq!(ctx.ego().unwrap_err(), NoDataReason::MissingEgo);
        }

        store.publish(topic::PARKING_STATE, b"{not json".to_vec());
        let ctx = StepContext::new(0.0, &actors, &map, &store);
        let r: Result<ParkingStateMsg, _> = ctx.decode(topic::PARKING_STATE);
        assert_eq!(r.unwrap_err(), NoDataReason::MalformedMessage(topic::PARKING_STATE));
    }
}
