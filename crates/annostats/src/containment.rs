// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Point-in-polygon classification using the winding-angle method.
//!
//! The unsigned angles swept between consecutive point-to-vertex vectors are
//! summed around the closed boundary. A point inside a convex polygon sweeps a
//! full turn of 2π; a point outside sweeps less. Because the angles are
//! unsigned, a concave boundary that doubles back as seen from the point
//! sweeps more than 2π and classifies the point as outside. Self-intersecting
//! polygons give undefined results.

use crate::{Error, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Absolute tolerance when comparing the winding total against 2π.
pub const WINDING_TOLERANCE: f64 = 1e-3;

/// How a point that coincides exactly with a polygon vertex is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VertexPolicy {
    /// Propagate [`Error::DegenerateGeometry`].
    #[default]
    Error,
    /// Count the point as inside.
    Inside,
    /// Count the point as outside.
    Outside,
}

impl VertexPolicy {
    /// Classify `point` against `polygon`, resolving vertex hits by policy.
    pub fn classify(self, point: &Point, polygon: &Polygon) -> Result<bool, Error> {
        match (is_inside(point, polygon), self) {
            (Err(Error::DegenerateGeometry { .. }), VertexPolicy::Inside) => Ok(true),
            (Err(Error::DegenerateGeometry { .. }), VertexPolicy::Outside) => Ok(false),
            (result, _) => result,
        }
    }
}

/// Total unsigned angle, in radians, swept around `polygon` as seen from
/// `point`.
///
/// Fails with [`Error::DegenerateGeometry`] when the point lies on a vertex.
pub fn winding_angle(point: &Point, polygon: &Polygon) -> Result<f64, Error> {
    let vertices = polygon.vertices();
    let mut total = 0.0;

    for (i, from) in vertices.iter().enumerate() {
        let to = &vertices[(i + 1) % vertices.len()];
        let u = unit_vector(point, from)?;
        let v = unit_vector(point, to)?;
        // Rounding can push the dot product just past ±1.
        let dot = (u.0 * v.0 + u.1 * v.1).clamp(-1.0, 1.0);
        total += dot.acos();
    }

    Ok(total)
}

/// Returns true when `point` lies inside `polygon`.
///
/// # Example
/// ```
/// use annostats::{Point, is_inside, parse_polygon};
///
/// let square = parse_polygon("MULTIPOINT ((0 0), (1 0), (1 1), (0 1))")?;
/// assert!(is_inside(&Point::new(0.5, 0.5), &square)?);
/// assert!(!is_inside(&Point::new(2.0, 2.0), &square)?);
/// # Ok::<(), annostats::Error>(())
/// ```
pub fn is_inside(point: &Point, polygon: &Polygon) -> Result<bool, Error> {
    let total = winding_angle(point, polygon)?;
    Ok((total - TAU).abs() < WINDING_TOLERANCE)
}

fn unit_vector(origin: &Point, target: &Point) -> Result<(f64, f64), Error> {
    let dx = target.x - origin.x;
    let dy = target.y - origin.y;
    let norm = dx.hypot(dy);

    if norm == 0.0 {
        return Err(Error::DegenerateGeometry {
            x: origin.x,
            y: origin.y,
        });
    }

    Ok((dx / norm, dy / norm))
}
