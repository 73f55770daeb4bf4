// tests/scenario_end_to_end.rs
//
// Full Init → Reset → Step* → Stop runs through the public API.

use kpi_grading::config::{EvalConfig, IndicatorDefinition, ScoreMap1D, ThresholdValue};
use kpi_grading::geometry::{Enu, Geodetic, Vec2};
use kpi_grading::indicator::{Indicator, StepOutcome, VerdictState};
use kpi_grading::indicators::{collision, default_registry, lateral_acceleration, parking_precision};
use kpi_grading::map::{LocalMap, MapAccess};
use kpi_grading::messages::{topic, MessageStore, ParkingSpaceMsg, ParkingStage, ParkingStateMsg};
use kpi_grading::pipeline::{EvalOrchestrator, InitContext, StepContext};
use kpi_grading::replay::{run_replay, ScenarioReplay};
use kpi_grading::report::ReportFragment;
use kpi_grading::types::{
    ActorKind, ActorSnapshot, ActorState, ParkingSpaceType, ParkingSpaceWgs84, Pose,
};
use std::f64::consts::FRAC_PI_2;

fn actor(id: i64, kind: ActorKind, x: f64, y: f64, yaw: f64) -> ActorState {
    ActorState::new(
        id,
        kind,
        Pose {
            position: Vec2::new(x, y),
            z: 0.0,
            yaw,
        },
    )
}

fn config(kpis: Vec<IndicatorDefinition>) -> EvalConfig {
    EvalConfig {
        kpis,
        ..EvalConfig::default()
    }
    .validated()
}

/// Ego at the origin, one vehicle at `gap` metres ahead.
fn following(gap: f64) -> ActorSnapshot {
    ActorSnapshot {
        ego: Some(actor(0, ActorKind::Ego, 0.0, 0.0, 0.0)),
        fellows: vec![actor(1, ActorKind::Vehicle, gap, 0.0, 0.0)],
    }
}

#[test]
fn disabled_indicator_is_skipped_without_fragments() {
    let registry = default_registry();
    let mut orch = EvalOrchestrator::new(
        &registry,
        config(vec![
            IndicatorDefinition::new(lateral_acceleration::NAME)
                .with_threshold("LateralAccThreshold", ThresholdValue::Number(0.1))
                .with_pass_condition(1.0)
                .disabled(),
        ]),
    );
    orch.init().unwrap();
    orch.reset("disabled").unwrap();

    let map = LocalMap::new(Geodetic::default());
    let store = MessageStore::new();
    for i in 0..20 {
        let mut actors = following(30.0);
        if let Some(ego) = actors.ego.as_mut() {
            ego.acceleration.lateral = 5.0;
        }
        let tick = orch
            .step(&StepContext::new(f64::from(i) * 0.1, &actors, &map, &store))
            .unwrap();
        assert_eq!(tick.evaluated, 0);
        assert!(tick.stop_request.is_none());
    }

    let outcome = orch.stop().unwrap();
    assert!(outcome.passed);
    assert_eq!(outcome.verdicts.len(), 1);
    let verdict = &outcome.verdicts[0].verdict;
    assert_eq!(verdict.state, VerdictState::Skipped);
    assert_eq!(verdict.reason, "lateral acceleration check skipped");

    let case = outcome.report.case(lateral_acceleration::NAME).unwrap();
    assert!(case.fragments().is_empty());
    assert_eq!(outcome.metrics.disabled_steps, 20);
    assert_eq!(outcome.metrics.evaluated_steps, 0);
}

#[test]
fn collision_count_against_pass_condition() {
    let registry = default_registry();
    let map = LocalMap::new(Geodetic::default());
    let store = MessageStore::new();

    // Two separate contacts in one run.
    let gaps = [10.0, 4.0, 10.0, 4.0, 10.0];

    for (pass_condition, expect_pass) in [(2.0, false), (3.0, true), (0.0, true)] {
        let mut orch = EvalOrchestrator::new(
            &registry,
            config(vec![
                IndicatorDefinition::new(collision::NAME).with_pass_condition(pass_condition)
            ]),
        );
        orch.init().unwrap();
        orch.reset("follow").unwrap();
        for (i, gap) in gaps.iter().enumerate() {
            let actors = following(*gap);
            orch.step(&StepContext::new(i as f64 * 0.1, &actors, &map, &store))
                .unwrap();
        }
        let outcome = orch.stop().unwrap();

        assert_eq!(outcome.passed, expect_pass, "pass condition {}", pass_condition);
        assert_eq!(outcome.verdicts[0].verdict.detected_count, 2);
        assert_eq!(
            outcome.report.feedback.get("Collision").map(String::as_str),
            Some("2")
        );
        if !expect_pass {
            assert_eq!(outcome.reason, "collision occurred");
        }
    }
}

#[test]
fn failing_reasons_are_joined() {
    let registry = default_registry();
    let mut orch = EvalOrchestrator::new(
        &registry,
        config(vec![
            IndicatorDefinition::new(collision::NAME).with_pass_condition(1.0),
            IndicatorDefinition::new(lateral_acceleration::NAME)
                .with_threshold("LateralAccThreshold", ThresholdValue::Number(1.0))
                .with_pass_condition(1.0),
        ]),
    );
    orch.init().unwrap();
    orch.reset("bad run").unwrap();

    let map = LocalMap::new(Geodetic::default());
    let store = MessageStore::new();
    let mut actors = following(4.0);
    if let Some(ego) = actors.ego.as_mut() {
        ego.acceleration.lateral = -2.5;
    }
    let tick = orch
        .step(&StepContext::new(0.1, &actors, &map, &store))
        .unwrap();
    assert_eq!(tick.evaluated, 2);
    assert_eq!(tick.events.len(), 2);
    assert!(orch.grading().event_detected());

    // Nothing new: each indicator still reports its running count.
    let tick = orch
        .step(&StepContext::new(0.2, &actors, &map, &store))
        .unwrap();
    assert_eq!(tick.events.len(), 2);
    assert!(tick.events.iter().all(|e| e.count == 1));
    assert!(!orch.grading().event_detected());

    let outcome = orch.stop().unwrap();
    assert!(!outcome.passed);
    assert_eq!(
        outcome.reason,
        "collision occurred;lateral acceleration too high"
    );
    assert_eq!(outcome.report.reason, outcome.reason);
}

#[test]
fn finish_condition_ends_replay_after_the_tick() {
    let replay = ScenarioReplay::from_yaml(
        r#"
name: rear_end
map:
  origin: { lon: 113.93, lat: 22.53 }
ticks:
  - t: 0.0
    actors:
      ego: { id: 0, kind: ego, pose: { position: { x: 0.0, y: 0.0 }, yaw: 0.0 } }
      fellows:
        - { id: 1, kind: vehicle, pose: { position: { x: 12.0, y: 0.0 }, yaw: 0.0 } }
  - t: 0.1
    actors:
      ego: { id: 0, kind: ego, pose: { position: { x: 0.0, y: 0.0 }, yaw: 0.0 } }
      fellows:
        - { id: 1, kind: vehicle, pose: { position: { x: 4.0, y: 0.0 }, yaw: 0.0 } }
  - t: 0.2
    actors:
      ego: { id: 0, kind: ego, pose: { position: { x: 0.0, y: 0.0 }, yaw: 0.0 } }
"#,
    )
    .unwrap();

    let cfg = config(vec![IndicatorDefinition::new(collision::NAME)
        .with_pass_condition(1.0)
        .with_finish_condition(1.0)]);
    let outcome = run_replay(&default_registry(), cfg, &replay).unwrap();

    assert_eq!(outcome.metrics.ticks, 2, "third tick must not run");
    assert_eq!(outcome.metrics.stop_requests, 1);
    assert_eq!(outcome.report.early_stop.as_deref(), Some("collision occurred"));
    assert!((outcome.report.total_sim_time_s - 0.1).abs() < 1e-9);
    assert!(!outcome.passed);

    let case = outcome.report.case(collision::NAME).unwrap();
    assert!(case.info.request_stop);
    assert_eq!(case.info.detected_count, 1);
}

#[test]
fn unknown_indicator_is_omitted_and_rest_run() {
    let cfg = config(vec![
        IndicatorDefinition::new("NoSuchKpi").with_pass_condition(1.0),
        IndicatorDefinition::new(collision::NAME),
    ]);
    let orch = EvalOrchestrator::new(&default_registry(), cfg);
    assert_eq!(orch.indicator_names(), vec![collision::NAME]);
    assert_eq!(orch.build_errors().len(), 1);
}

#[test]
fn parking_precision_with_score_map() {
    let map = LocalMap::new(Geodetic::new(113.93, 22.53, 0.0));
    let g = |x: f64, y: f64| map.enu_to_wgs84(Enu::new(x, y, 0.0));
    let spaces = ParkingSpaceMsg {
        spaces: vec![ParkingSpaceWgs84 {
            id: 3,
            kind: ParkingSpaceType::Vertical,
            left_top: g(-1.25, 2.75),
            left_bottom: g(-1.25, -2.75),
            right_top: g(1.25, 2.75),
            right_bottom: g(1.25, -2.75),
            center: g(0.0, 0.0),
            yaw: FRAC_PI_2,
        }],
    };

    let mut def = IndicatorDefinition::new(parking_precision::NAME)
        .with_threshold("ParkingSpaceId", ThresholdValue::Text("3".into()))
        .with_threshold("LateralThreshold", ThresholdValue::Number(0.4))
        .with_threshold("VerticalThreshold", ThresholdValue::Number(1.6))
        .with_pass_condition(1.0);
    def.score_map = Some(ScoreMap1D {
        u: vec![0.0, 4.0],
        y: vec![100.0, 0.0],
    });

    let mut orch = EvalOrchestrator::new(&default_registry(), config(vec![def]));
    orch.init().unwrap();
    orch.reset("park").unwrap();

    let ego = |x: f64| ActorSnapshot {
        ego: Some(actor(0, ActorKind::Ego, x, 0.0, FRAC_PI_2)),
        fellows: Vec::new(),
    };
    let publish = |stage: ParkingStage| {
        let mut store = MessageStore::new();
        store
            .publish_json(topic::PARKING_STATE, &ParkingStateMsg { stage })
            .unwrap();
        store.publish_json(topic::PARKING_SPACE, &spaces).unwrap();
        store
    };

    // Still manoeuvring: gated out even though the car is off-centre.
    let parking_in = publish(ParkingStage::ParkingIn);
    let actors = ego(0.6);
    let tick = orch
        .step(&StepContext::new(0.1, &actors, &map, &parking_in))
        .unwrap();
    assert_eq!(tick.evaluated, 0);

    // Completed, 0.2 m right of centre: both left wheels too far from the line.
    let completed = publish(ParkingStage::Completed);
    let actors = ego(0.2);
    let tick = orch
        .step(&StepContext::new(0.2, &actors, &map, &completed))
        .unwrap();
    assert_eq!(tick.evaluated, 1);

    let outcome = orch.stop().unwrap();
    assert!(!outcome.passed);
    let case = outcome.report.case(parking_precision::NAME).unwrap();
    assert_eq!(case.info.detected_count, 2);
    assert_eq!(
        case.info.threshold_info,
        "LateralThreshold:0.4;ParkingSpaceId:3;VerticalThreshold:1.6"
    );

    let result = case.info.result.as_ref().unwrap();
    assert_eq!(result.state, VerdictState::Fail);
    assert_eq!(result.reason, "imprecise parking");
    assert!((result.score.unwrap() - 50.0).abs() < 1e-9);

    let pairs = case
        .fragments()
        .iter()
        .filter(|f| matches!(f, ReportFragment::Pair(_)))
        .count();
    assert_eq!(pairs, 8);
}

#[test]
fn step_outcome_for_missing_ego_is_no_data() {
    let registry = default_registry();
    let mut ind = registry.build(collision::NAME).unwrap();
    let cfg = config(vec![IndicatorDefinition::new(collision::NAME)]);
    ind.init(&InitContext::new(&cfg)).unwrap();
    ind.reset();

    let map = LocalMap::new(Geodetic::default());
    let store = MessageStore::new();
    let actors = ActorSnapshot::default();
    let outcome = ind.step(&StepContext::new(0.0, &actors, &map, &store));
    assert!(matches!(outcome, StepOutcome::NoData(_)));
    assert_eq!(ind.detected_count(), 0);
}
