// src/main.rs

use anyhow::{bail, Context, Result};
use kpi_grading::config::EvalConfig;
use kpi_grading::indicators::default_registry;
use kpi_grading::replay::{run_replay, ScenarioReplay};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: kpi-grading <config.yaml> <replay.yaml> [report.json]";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, replay_path) = match args.as_slice() {
        [config, replay, ..] => (config, replay),
        _ => bail!(USAGE),
    };
    let report_path = args.get(2);

    let config = EvalConfig::read(config_path)
        .with_context(|| format!("loading evaluation config {}", config_path))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("kpi_grading={}", config.settings.log_level))
        }))
        .init();

    info!("🚗 KPI grading starting");
    let config = config.validated();
    info!("✓ Configuration loaded: {} indicator definitions", config.kpis.len());

    let replay = ScenarioReplay::load(replay_path)
        .with_context(|| format!("loading replay {}", replay_path))?;
    info!("✓ Replay '{}' loaded: {} ticks", replay.name, replay.ticks.len());

    let registry = default_registry();
    let outcome = run_replay(&registry, config, &replay).context("running replay")?;

    let json = serde_json::to_string_pretty(&outcome).context("serializing outcome")?;
    match report_path {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("writing report {}", path))?;
            info!("✓ Report written to {}", path);
        }
        None => println!("{}", json),
    }

    if outcome.passed {
        info!("✓ Scenario '{}' passed", replay.name);
    } else {
        warn!("❌ Scenario '{}' failed: {}", replay.name, outcome.reason);
        std::process::exit(1);
    }
    Ok(())
}
