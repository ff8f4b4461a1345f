// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Planar geometry over lat-long coordinates.
//!
//! All scope math happens in a local nautical-mile projection: latitude scales
//! by 60 NM per degree, longitude by a per-scenario scalar supplied by the
//! host. Headings are true degrees; magnetic variation is applied only at
//! display time by callers.

use serde::{Deserialize, Serialize};

/// Nautical miles per degree of latitude
pub const NM_PER_LATITUDE: f64 = 60.0;

/// A lat-long position in degrees, `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLong(pub [f64; 2]);

impl LatLong {
    #[must_use]
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self([longitude, latitude])
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.0[0]
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.0[1]
    }

    /// Project into local NM coordinates.
    #[must_use]
    pub fn to_nm(self, nm_per_longitude: f64) -> [f64; 2] {
        [self.0[0] * nm_per_longitude, self.0[1] * NM_PER_LATITUDE]
    }

    /// Great-circle-free planar distance in NM, adequate at TRACON scale.
    #[must_use]
    pub fn distance_nm(self, other: LatLong, nm_per_longitude: f64) -> f64 {
        let a = self.to_nm(nm_per_longitude);
        let b = other.to_nm(nm_per_longitude);
        ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
    }

    /// True heading from `self` to `other` in degrees, `[0, 360)`.
    #[must_use]
    pub fn heading_to(self, other: LatLong, nm_per_longitude: f64) -> f64 {
        let a = self.to_nm(nm_per_longitude);
        let b = other.to_nm(nm_per_longitude);
        normalize_heading((b[0] - a[0]).atan2(b[1] - a[1]).to_degrees())
    }

    /// Offset by `dist` NM along true heading `hdg`.
    #[must_use]
    pub fn offset(self, hdg: f64, dist: f64, nm_per_longitude: f64) -> LatLong {
        let rad = hdg.to_radians();
        LatLong::new(
            self.0[0] + dist * rad.sin() / nm_per_longitude,
            self.0[1] + dist * rad.cos() / NM_PER_LATITUDE,
        )
    }
}

/// Normalize a heading into `[0, 360)`.
#[must_use]
pub fn normalize_heading(h: f64) -> f64 {
    let h = h % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Absolute difference between two headings, `[0, 180]`.
#[must_use]
pub fn heading_difference(a: f64, b: f64) -> f64 {
    let d = (normalize_heading(a) - normalize_heading(b)).abs();
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Intersection of two rays `p0 + t*d0`, `p1 + s*d1` in NM coordinates.
///
/// Returns the intersection point and the two ray parameters; `None` when the
/// rays are (near-)parallel.
#[must_use]
pub fn ray_intersection(
    p0: [f64; 2],
    d0: [f64; 2],
    p1: [f64; 2],
    d1: [f64; 2],
) -> Option<([f64; 2], f64, f64)> {
    let denom = d0[0] * d1[1] - d0[1] * d1[0];
    if denom.abs() < 1e-9 {
        return None;
    }
    let dx = p1[0] - p0[0];
    let dy = p1[1] - p0[1];
    let t = (dx * d1[1] - dy * d1[0]) / denom;
    let s = (dx * d0[1] - dy * d0[0]) / denom;
    Some(([p0[0] + t * d0[0], p0[1] + t * d0[1]], t, s))
}

/// Unit direction vector for a true heading.
#[must_use]
pub fn heading_vector(hdg: f64) -> [f64; 2] {
    let rad = hdg.to_radians();
    [rad.sin(), rad.cos()]
}

/// Even-odd point-in-polygon test over lat-long vertices.
#[must_use]
pub fn point_in_polygon(p: LatLong, poly: &[LatLong]) -> bool {
    let (px, py) = (p.longitude(), p.latitude());
    let mut inside = false;
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (poly[i].longitude(), poly[i].latitude());
        let (xj, yj) = (poly[j].longitude(), poly[j].latitude());
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_normalization() {
        assert!((normalize_heading(-90.0) - 270.0).abs() < 1e-9);
        assert!((normalize_heading(720.0)).abs() < 1e-9);
        assert!((heading_difference(350.0, 10.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn planar_distance() {
        // One degree of longitude at nm_per_longitude = 46 (mid latitudes)
        let a = LatLong::new(-73.0, 40.0);
        let b = LatLong::new(-74.0, 40.0);
        assert!((a.distance_nm(b, 46.0) - 46.0).abs() < 1e-6);

        // 0.04 degrees of longitude, the CA seed geometry
        let c = LatLong::new(-73.04, 40.0);
        let d = a.distance_nm(c, 51.26);
        assert!((d - 2.05).abs() < 0.01);
    }

    #[test]
    fn heading_to_cardinal() {
        let a = LatLong::new(-73.0, 40.0);
        let north = LatLong::new(-73.0, 41.0);
        let east = LatLong::new(-72.0, 40.0);
        assert!((a.heading_to(north, 46.0)).abs() < 1e-6);
        assert!((a.heading_to(east, 46.0) - 90.0).abs() < 1e-6);
    }

    #[test]
    fn rays_cross_ahead() {
        // Eastbound and westbound aircraft closing head-on never intersect
        // ahead of both; offset one laterally and they do.
        let i = ray_intersection([0.0, 0.0], heading_vector(90.0), [4.0, 1.0], heading_vector(180.0));
        let (_, t, s) = i.unwrap();
        assert!(t > 0.0 && s > 0.0);
    }

    #[test]
    fn polygon_containment() {
        let sq = [
            LatLong::new(0.0, 0.0),
            LatLong::new(1.0, 0.0),
            LatLong::new(1.0, 1.0),
            LatLong::new(0.0, 1.0),
        ];
        assert!(point_in_polygon(LatLong::new(0.5, 0.5), &sq));
        assert!(!point_in_polygon(LatLong::new(1.5, 0.5), &sq));
    }
}
