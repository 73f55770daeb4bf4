// src/replay.rs
//
// Recorded scenario played back tick by tick through the orchestrator.
// Stands in for the simulator's scheduler and message bus when running
// the evaluation offline.

use crate::config::EvalConfig;
use crate::map::LocalMap;
use crate::messages::MessageStore;
use crate::pipeline::{EvalError, EvalOrchestrator, EvalOutcome, StepContext};
use crate::registry::IndicatorRegistry;
use crate::types::ActorSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse replay: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to encode message on {topic}: {source}")]
    Message {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayTick {
    #[serde(alias = "t")]
    pub sim_time_s: f64,
    #[serde(default)]
    pub actors: ActorSnapshot,
    /// Topic → message body, published as JSON for this tick only.
    #[serde(default)]
    pub messages: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReplay {
    pub name: String,
    #[serde(default)]
    pub map: LocalMap,
    #[serde(default)]
    pub ticks: Vec<ReplayTick>,
}

impl ScenarioReplay {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ReplayError> {
        let replay: ScenarioReplay = serde_yaml::from_str(contents)?;
        if replay
            .ticks
            .windows(2)
            .any(|w| w[1].sim_time_s < w[0].sim_time_s)
        {
            warn!("⚠️  Replay '{}' has ticks out of time order", replay.name);
        }
        Ok(replay)
    }
}

/// Init → Reset → Step per tick → Stop. Playback ends early after the
/// first tick on which an indicator requests a stop.
pub fn run_replay(
    registry: &IndicatorRegistry,
    config: EvalConfig,
    replay: &ScenarioReplay,
) -> Result<EvalOutcome, ReplayError> {
    let mut orchestrator = EvalOrchestrator::new(registry, config);
    orchestrator.init()?;
    orchestrator.reset(&replay.name)?;

    let mut store = MessageStore::new();
    for tick in &replay.ticks {
        store.clear();
        for (topic, body) in &tick.messages {
            store
                .publish_json(topic, body)
                .map_err(|source| ReplayError::Message {
                    topic: topic.clone(),
                    source,
                })?;
        }

        let ctx = StepContext::new(tick.sim_time_s, &tick.actors, &replay.map, &store);
        let report = orchestrator.step(&ctx)?;
        if let Some(reason) = report.stop_request {
            info!("Ending replay at t={:.2}s: {}", tick.sim_time_s, reason);
            break;
        }
    }

    Ok(orchestrator.stop()?)
}
