// src/map.rs
//
// Read-only map accessor handed to indicators each tick. The HD-map service
// itself lives outside this crate; `LocalMap` is the in-memory stand-in used
// by replays and tests.

use crate::geometry::{enu_to_wgs84, point_to_polygon_distance, wgs84_to_enu, Enu, Geodetic, Vec2};
use crate::types::{ParkingSpace, ParkingSpaceWgs84};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapObjectKind {
    Pole,
    Building,
    Ditch,
    Surface,
    Tree,
    Obstacle,
}

impl MapObjectKind {
    pub const COLLIDABLE: [MapObjectKind; 6] = [
        MapObjectKind::Pole,
        MapObjectKind::Building,
        MapObjectKind::Ditch,
        MapObjectKind::Surface,
        MapObjectKind::Tree,
        MapObjectKind::Obstacle,
    ];

    /// Search radius used when looking for objects of this kind around ego.
    pub fn default_search_radius(&self) -> f64 {
        match self {
            Self::Building | Self::Obstacle => 30.0,
            _ => 10.0,
        }
    }
}

/// Static map object with its outline in the local ENU plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub id: u64,
    pub kind: MapObjectKind,
    pub outline: Vec<Vec2>,
}

pub trait MapAccess {
    fn origin(&self) -> Geodetic;

    fn wgs84_to_enu(&self, point: Geodetic) -> Enu {
        wgs84_to_enu(point, self.origin())
    }

    fn enu_to_wgs84(&self, point: Enu) -> Geodetic {
        enu_to_wgs84(point, self.origin())
    }

    /// Objects of `kind` whose outline comes within `radius` of `center`.
    fn nearby_objects(&self, kind: MapObjectKind, center: Vec2, radius: f64) -> Vec<&MapObject>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalMap {
    pub origin: Geodetic,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

impl LocalMap {
    pub fn new(origin: Geodetic) -> Self {
        Self {
            origin,
            objects: Vec::new(),
        }
    }

    pub fn with_object(mut self, object: MapObject) -> Self {
        self.objects.push(object);
        self
    }
}

impl MapAccess for LocalMap {
    fn origin(&self) -> Geodetic {
        self.origin
    }

    fn nearby_objects(&self, kind: MapObjectKind, center: Vec2, radius: f64) -> Vec<&MapObject> {
        self.objects
            .iter()
            .filter(|o| o.kind == kind)
            .filter(|o| point_to_polygon_distance(center, &o.outline) <= radius)
            .collect()
    }
}

/// Geodetic parking space → local plane, through the map's origin.
pub fn parking_space_to_local(map: &dyn MapAccess, space: &ParkingSpaceWgs84) -> ParkingSpace {
    let local = |g: Geodetic| map.wgs84_to_enu(g).planar();
    ParkingSpace {
        id: space.id,
        kind: space.kind,
        left_top: local(space.left_top),
        left_bottom: local(space.left_bottom),
        right_top: local(space.right_top),
        right_bottom: local(space.right_bottom),
        center: local(space.center),
        yaw: space.yaw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f64, cy: f64, half: f64) -> Vec<Vec2> {
        vec![
            Vec2::new(cx - half, cy - half),
            Vec2::new(cx - half, cy + half),
            Vec2::new(cx + half, cy + half),
            Vec2::new(cx + half, cy - half),
        ]
    }

    #[test]
    fn test_nearby_objects_filters_kind_and_radius() {
        let map = LocalMap::new(Geodetic::default())
            .with_object(MapObject {
                id: 1,
                kind: MapObjectKind::Pole,
                outline: square(5.0, 0.0, 0.2),
            })
            .with_object(MapObject {
                id: 2,
                kind: MapObjectKind::Pole,
                outline: square(50.0, 0.0, 0.2),
            })
            .with_object(MapObject {
                id: 3,
                kind: MapObjectKind::Tree,
                outline: square(3.0, 0.0, 0.5),
            });

        let poles: Vec<u64> = map
            .nearby_objects(MapObjectKind::Pole, Vec2::ZERO, 10.0)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(poles, vec![1]);
    }

    #[test]
    fn test_parking_space_conversion_uses_origin() {
        let origin = Geodetic::new(113.0, 22.0, 0.0);
        let map = LocalMap::new(origin);
        let space = ParkingSpaceWgs84 {
            id: 9,
            kind: crate::types::ParkingSpaceType::Vertical,
            left_top: origin,
            left_bottom: origin,
            right_top: origin,
            right_bottom: origin,
            center: origin,
            yaw: 0.5,
        };
        let local = parking_space_to_local(&map, &space);
        assert!(local.center.norm() < 1e-6);
        assert_eq!(local.id, 9);
        assert_eq!(local.yaw, 0.5);
    }
}
