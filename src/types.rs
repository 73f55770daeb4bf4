// src/types.rs
//
// Per-tick world view handed to indicators. Everything here is owned by the
// orchestrator (or whatever feeds it) and only borrowed for one Step call.

use crate::geometry::{footprint_corners, Geodetic, Vec2};
use serde::{Deserialize, Serialize};

// ============================================================================
// ACTORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Ego,
    Vehicle,
    Pedestrian,
    Static,
    Dynamic,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ego => "EGO",
            Self::Vehicle => "VEHICLE",
            Self::Pedestrian => "PEDESTRIAN",
            Self::Static => "STATIC",
            Self::Dynamic => "DYNAMIC",
        }
    }
}

/// Position in the local ENU plane plus heading (rad, CCW from east).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    #[serde(default)]
    pub z: f64,
    pub yaw: f64,
}

/// Body-frame vector: longitudinal, lateral, normal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyVector {
    #[serde(default)]
    pub longitudinal: f64,
    #[serde(default)]
    pub lateral: f64,
    #[serde(default)]
    pub normal: f64,
}

impl BodyVector {
    pub fn planar_magnitude(&self) -> f64 {
        self.longitudinal.hypot(self.lateral)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub length: f64,
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Front axle to front bumper (m).
    #[serde(default = "default_front_axle_to_front")]
    pub front_axle_to_front: f64,
    /// Rear axle to rear bumper (m).
    #[serde(default = "default_rear_axle_to_rear")]
    pub rear_axle_to_rear: f64,
}

fn default_front_axle_to_front() -> f64 {
    0.9
}

fn default_rear_axle_to_rear() -> f64 {
    1.0
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            length: 4.5,
            width: 1.8,
            height: 1.5,
            front_axle_to_front: default_front_axle_to_front(),
            rear_axle_to_rear: default_rear_axle_to_rear(),
        }
    }
}

/// Where the actor sits on the HD map, when the map service could match it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneContext {
    pub road_id: u64,
    pub section_id: u64,
    pub lane_id: i64,
    /// Signed lateral offset from the lane reference line (m).
    #[serde(default)]
    pub ref_line_offset: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorState {
    pub id: i64,
    pub kind: ActorKind,
    pub pose: Pose,
    #[serde(default)]
    pub velocity: BodyVector,
    #[serde(default)]
    pub acceleration: BodyVector,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default)]
    pub lane: Option<LaneContext>,
}

impl ActorState {
    pub fn new(id: i64, kind: ActorKind, pose: Pose) -> Self {
        Self {
            id,
            kind,
            pose,
            velocity: BodyVector::default(),
            acceleration: BodyVector::default(),
            shape: Shape::default(),
            lane: None,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.pose.position
    }

    /// Footprint corners: front-left, front-right, rear-right, rear-left.
    pub fn footprint(&self) -> [Vec2; 4] {
        footprint_corners(
            self.pose.position,
            self.pose.yaw,
            self.shape.length,
            self.shape.width,
        )
    }

    /// Wheel contact points: front-left, front-right, rear-right, rear-left.
    /// Same order as `footprint`, pulled in from the bumpers to the axles.
    pub fn wheel_positions(&self) -> [Vec2; 4] {
        let hl = self.shape.length / 2.0;
        let hw = self.shape.width / 2.0;
        let front = hl - self.shape.front_axle_to_front;
        let rear = self.shape.rear_axle_to_rear - hl;
        [
            Vec2::new(front, hw),
            Vec2::new(front, -hw),
            Vec2::new(rear, -hw),
            Vec2::new(rear, hw),
        ]
        .map(|local| self.pose.position + local.rotate(self.pose.yaw))
    }

    /// Express a world point in this actor's body frame (x forward, y left).
    pub fn to_body_frame(&self, world: Vec2) -> Vec2 {
        (world - self.pose.position).rotate(-self.pose.yaw)
    }

    pub fn speed(&self) -> f64 {
        self.velocity.planar_magnitude()
    }
}

/// Read-only view of all actors for one simulation tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    #[serde(default)]
    pub ego: Option<ActorState>,
    #[serde(default)]
    pub fellows: Vec<ActorState>,
}

impl ActorSnapshot {
    pub fn ego(&self) -> Option<&ActorState> {
        self.ego.as_ref()
    }

    pub fn fellows_of(&self, kind: ActorKind) -> impl Iterator<Item = &ActorState> {
        self.fellows.iter().filter(move |a| a.kind == kind)
    }

    /// Fellows whose centre lies within `range` metres of the ego centre.
    pub fn fellows_within(&self, range: f64) -> Vec<&ActorState> {
        let Some(ego) = self.ego() else {
            return Vec::new();
        };
        self.fellows
            .iter()
            .filter(|a| a.position().distance(ego.position()) <= range)
            .collect()
    }

    /// Nearest vehicle ahead of ego whose lateral body-frame offset is
    /// within the combined half-widths. Measured ego front → fellow rear.
    pub fn leading_vehicle(&self) -> Option<&ActorState> {
        let ego = self.ego()?;
        let ego_front = ego.pose.position + Vec2::new(ego.shape.length / 2.0, 0.0).rotate(ego.pose.yaw);

        let mut best: Option<(&ActorState, f64)> = None;
        for fellow in self.fellows_of(ActorKind::Vehicle) {
            let fellow_rear = fellow.pose.position
                + Vec2::new(-fellow.shape.length / 2.0, 0.0).rotate(fellow.pose.yaw);
            let rel = (fellow_rear - ego_front).rotate(-ego.pose.yaw);
            let max_lateral = (ego.shape.width + fellow.shape.width) / 2.0;

            if rel.y.abs() <= max_lateral && rel.x > 0.0 {
                match best {
                    Some((_, dist)) if dist <= rel.x => {}
                    _ => best = Some((fellow, rel.x)),
                }
            }
        }
        best.map(|(actor, _)| actor)
    }
}

// ============================================================================
// PARKING SPACES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParkingSpaceType {
    Parallel,
    Vertical,
    Slanted,
}

/// Parking space in geodetic coordinates, as published on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpaceWgs84 {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ParkingSpaceType,
    pub left_top: Geodetic,
    pub left_bottom: Geodetic,
    pub right_top: Geodetic,
    pub right_bottom: Geodetic,
    pub center: Geodetic,
    /// Heading of the space (rad, ENU).
    #[serde(default)]
    pub yaw: f64,
}

/// Parking space in the local ENU plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub id: i64,
    pub kind: ParkingSpaceType,
    pub left_top: Vec2,
    pub left_bottom: Vec2,
    pub right_top: Vec2,
    pub right_bottom: Vec2,
    pub center: Vec2,
    pub yaw: f64,
}

impl ParkingSpace {
    /// Outline in walk order lt → lb → rb → rt.
    pub fn outline(&self) -> [Vec2; 4] {
        [
            self.left_top,
            self.left_bottom,
            self.right_bottom,
            self.right_top,
        ]
    }

    /// True when the left edge (lt–lb) is longer than the top edge (lt–rt),
    /// i.e. the space's long axis runs top → bottom.
    pub fn is_long_axis_top_bottom(&self) -> bool {
        self.left_top.distance(self.left_bottom) > self.left_top.distance(self.right_top)
    }
}
