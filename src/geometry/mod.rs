// src/geometry/mod.rs
//
// Stateless numeric primitives shared by every indicator.
//
//   planar → distances, containment, angles in the local ENU plane
//   enu    → WGS84 geodetic ↔ local East-North-Up frame

pub mod enu;
pub mod planar;

pub use enu::{enu_to_wgs84, wgs84_to_enu, Enu, Geodetic};
pub use planar::{
    angle_between, footprint_corners, normalize_angle, point_in_polygon,
    point_to_polygon_distance, point_to_segment_distance, polygons_overlap, segments_intersect,
    yaw_diff, AngleUnit, Vec2,
};
