// src/geometry/enu.rs
//
// WGS84 geodetic ↔ local East-North-Up frame anchored at the map origin.
// Goes through ECEF so the transform stays exact over the few kilometres
// a scenario spans.

use super::planar::Vec2;
use serde::{Deserialize, Serialize};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

const ECEF_TO_GEODETIC_ITERATIONS: usize = 8;

/// Geodetic coordinate: longitude / latitude in degrees, altitude in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geodetic {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub alt: f64,
}

impl Geodetic {
    pub const fn new(lon: f64, lat: f64, alt: f64) -> Self {
        Self { lon, lat, alt }
    }
}

/// Local Cartesian coordinate in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    #[serde(default)]
    pub up: f64,
}

impl Enu {
    pub const fn new(east: f64, north: f64, up: f64) -> Self {
        Self { east, north, up }
    }

    pub fn planar(&self) -> Vec2 {
        Vec2::new(self.east, self.north)
    }
}

fn geodetic_to_ecef(g: Geodetic) -> [f64; 3] {
    let (lat, lon) = (g.lat.to_radians(), g.lon.to_radians());
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    [
        (n + g.alt) * cos_lat * cos_lon,
        (n + g.alt) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + g.alt) * sin_lat,
    ]
}

fn ecef_to_geodetic(p: [f64; 3]) -> Geodetic {
    let [x, y, z] = p;
    let lon = y.atan2(x);
    let rho = x.hypot(y);

    let mut lat = z.atan2(rho * (1.0 - WGS84_E2));
    let mut alt = 0.0;
    for _ in 0..ECEF_TO_GEODETIC_ITERATIONS {
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        alt = rho / lat.cos() - n;
        lat = z.atan2(rho * (1.0 - WGS84_E2 * n / (n + alt)));
    }

    Geodetic::new(lon.to_degrees(), lat.to_degrees(), alt)
}

/// Geodetic point → ENU relative to `origin`.
pub fn wgs84_to_enu(point: Geodetic, origin: Geodetic) -> Enu {
    let p = geodetic_to_ecef(point);
    let o = geodetic_to_ecef(origin);
    let (dx, dy, dz) = (p[0] - o[0], p[1] - o[1], p[2] - o[2]);

    let (sin_lat, cos_lat) = origin.lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = origin.lon.to_radians().sin_cos();

    Enu {
        east: -sin_lon * dx + cos_lon * dy,
        north: -sin_lat * cos_lon * dx - sin_lat * sin_lon * dy + cos_lat * dz,
        up: cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz,
    }
}

/// ENU relative to `origin` → geodetic point.
pub fn enu_to_wgs84(point: Enu, origin: Geodetic) -> Geodetic {
    let o = geodetic_to_ecef(origin);
    let (sin_lat, cos_lat) = origin.lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = origin.lon.to_radians().sin_cos();
    let Enu { east, north, up } = point;

    let dx = -sin_lon * east - sin_lat * cos_lon * north + cos_lat * cos_lon * up;
    let dy = cos_lon * east - sin_lat * sin_lon * north + cos_lat * sin_lon * up;
    let dz = cos_lat * north + sin_lat * up;

    ecef_to_geodetic([o[0] + dx, o[1] + dy, o[2] + dz])
}
