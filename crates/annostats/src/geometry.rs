// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Parsing of annotation geometries and detection point records.
//!
//! Annotation boundaries arrive as WKT-like text, for example
//! `MULTIPOINT ((0 0), (1 0), (1 1), (0 1))`, and detections arrive as JSON
//! records `{"x": .., "y": ..}`. Both are normalized into [`Point`] values in
//! the same planar unit.

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const MULTIPOINT: &str = "MULTIPOINT";
const POLYGON: &str = "POLYGON";

/// A planar coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// An ordered boundary of at least three vertices.
///
/// The vertex list is not required to be closed: the containment test treats
/// the first vertex as following the last.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    /// Minimum number of vertices for a valid polygon.
    pub const MIN_VERTICES: usize = 3;

    pub fn new(vertices: Vec<Point>) -> Result<Self, Error> {
        if vertices.len() < Self::MIN_VERTICES {
            return Err(Error::MalformedGeometry(format!(
                "polygon needs at least {} vertices, found {}",
                Self::MIN_VERTICES,
                vertices.len()
            )));
        }
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }
}

/// Formats the polygon in the `MULTIPOINT` form accepted by
/// [`parse_polygon`].
impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", MULTIPOINT)?;
        for (i, p) in self.vertices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({} {})", p.x, p.y)?;
        }
        write!(f, ")")
    }
}

/// Parse a textual geometry into a [`Polygon`].
///
/// The geometry starts with the `MULTIPOINT` literal followed by a
/// parenthesized, comma-separated list of `x y` pairs. Each pair may carry its
/// own parentheses. The single-ring `POLYGON ((x y, ...))` form is accepted
/// with the same rules.
///
/// # Example
/// ```
/// use annostats::{Point, parse_polygon};
///
/// let polygon = parse_polygon("MULTIPOINT ((0 0), (1 0), (1 1), (0 1))")?;
/// assert_eq!(polygon.vertices()[2], Point::new(1.0, 1.0));
/// # Ok::<(), annostats::Error>(())
/// ```
pub fn parse_polygon(raw: &str) -> Result<Polygon, Error> {
    let raw = raw.trim();

    let body = if let Some(rest) = raw.strip_prefix(MULTIPOINT) {
        rest
    } else if let Some(rest) = raw.strip_prefix(POLYGON) {
        // Interior rings would be flattened into the outer boundary.
        if rest.matches('(').count() > 2 {
            return Err(Error::MalformedGeometry(
                "polygons with interior rings are not supported".to_string(),
            ));
        }
        rest
    } else {
        return Err(Error::MalformedGeometry(format!(
            "expected a {} or {} geometry, found {:?}",
            MULTIPOINT,
            POLYGON,
            raw.chars().take(32).collect::<String>()
        )));
    };

    let vertices = body
        .split(',')
        .map(parse_pair)
        .collect::<Result<Vec<_>, _>>()?;

    Polygon::new(vertices)
}

/// Parse one `x y` pair, tolerating surrounding whitespace and parentheses.
fn parse_pair(token: &str) -> Result<Point, Error> {
    let pair = token.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
    let mut coords = pair.split_whitespace();

    match (coords.next(), coords.next(), coords.next()) {
        (Some(x), Some(y), None) => Ok(Point::new(parse_coord(x)?, parse_coord(y)?)),
        _ => Err(Error::MalformedGeometry(format!(
            "expected an `x y` pair, found {:?}",
            pair
        ))),
    }
}

fn parse_coord(token: &str) -> Result<f64, Error> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::MalformedGeometry(format!("non-numeric coordinate {:?}", token)))
}

/// Extract [`Point`] values from raw `{"x": .., "y": ..}` records.
///
/// Both fields are required. Numbers and numeric strings are accepted.
pub fn parse_points(raw: &[Value]) -> Result<Vec<Point>, Error> {
    raw.iter()
        .enumerate()
        .map(|(index, record)| {
            Ok(Point::new(
                point_field(record, index, "x")?,
                point_field(record, index, "y")?,
            ))
        })
        .collect()
}

fn point_field(record: &Value, index: usize, name: &str) -> Result<f64, Error> {
    let value = record.get(name).ok_or_else(|| {
        Error::MalformedGeometry(format!("point {} has no `{}` field", index, name))
    })?;

    let coord = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    coord.filter(|v| v.is_finite()).ok_or_else(|| {
        Error::MalformedGeometry(format!(
            "point {} has a non-numeric `{}` value: {}",
            index, name, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_parse_multipoint_wrapped_pairs() {
        let polygon = parse_polygon("MULTIPOINT ((0 0), (1 0), (1 1), (0 1))").unwrap();
        assert_eq!(polygon.vertices(), square().as_slice());
    }

    #[test]
    fn test_parse_multipoint_bare_pairs() {
        let polygon = parse_polygon("MULTIPOINT (0 0, 1 0, 1 1, 0 1)").unwrap();
        assert_eq!(polygon.vertices(), square().as_slice());
    }

    #[test]
    fn test_parse_multipoint_fractional() {
        let polygon =
            parse_polygon("MULTIPOINT ((10.5 20.25), ( 30 -4.5 ), (1e2 7))").unwrap();
        assert_eq!(polygon.vertices().len(), 3);
        assert_eq!(polygon.vertices()[0], Point::new(10.5, 20.25));
        assert_eq!(polygon.vertices()[1], Point::new(30.0, -4.5));
        assert_eq!(polygon.vertices()[2], Point::new(100.0, 7.0));
    }

    #[test]
    fn test_parse_polygon_ring() {
        let polygon = parse_polygon("POLYGON ((0 0, 1 0, 1 1, 0 1, 0 0))").unwrap();
        assert_eq!(polygon.vertices().len(), 5);
        assert_eq!(polygon.vertices()[4], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_parse_polygon_rejects_interior_rings() {
        let result = parse_polygon("POLYGON ((0 0, 4 0, 4 4, 0 0), (1 1, 2 1, 2 2, 1 1))");
        assert!(matches!(result, Err(Error::MalformedGeometry(_))));
    }

    #[test]
    fn test_parse_polygon_too_few_vertices() {
        let result = parse_polygon("MULTIPOINT ((0 0), (1 0))");
        assert!(matches!(result, Err(Error::MalformedGeometry(_))));
    }

    #[test]
    fn test_parse_polygon_non_numeric() {
        assert!(parse_polygon("MULTIPOINT ((0 0), (a 0), (1 1))").is_err());
        assert!(parse_polygon("MULTIPOINT ((0 0), (1 NaN), (1 1))").is_err());
        assert!(parse_polygon("MULTIPOINT ((0 0 0), (1 0 0), (1 1 0))").is_err());
        assert!(parse_polygon("MULTIPOINT ((0 0), (1), (1 1))").is_err());
    }

    #[test]
    fn test_parse_polygon_unknown_prefix() {
        let result = parse_polygon("LINESTRING (0 0, 1 0, 1 1)");
        assert!(matches!(result, Err(Error::MalformedGeometry(_))));
    }

    #[test]
    fn test_polygon_display_reparses() {
        let raw = "MULTIPOINT ((0 0), (10.5 0), (10.5 7.25), (0 7.25))";
        let polygon = parse_polygon(raw).unwrap();
        let reparsed = parse_polygon(&polygon.to_string()).unwrap();
        assert_eq!(polygon, reparsed);
    }

    #[test]
    fn test_parse_points() {
        let raw = vec![
            json!({"x": 0.5, "y": 0.5}),
            json!({"x": 5, "y": 5}),
            json!({"x": "1.5", "y": "2"}),
        ];
        let points = parse_points(&raw).unwrap();
        assert_eq!(
            points,
            vec![
                Point::new(0.5, 0.5),
                Point::new(5.0, 5.0),
                Point::new(1.5, 2.0)
            ]
        );
    }

    #[test]
    fn test_parse_points_empty() {
        assert!(parse_points(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_parse_points_missing_field() {
        let raw = vec![json!({"x": 1.0, "y": 1.0}), json!({"x": 2.0})];
        let err = parse_points(&raw).unwrap_err();
        match err {
            Error::MalformedGeometry(msg) => assert!(msg.contains("point 1"), "{}", msg),
            other => panic!("Expected MalformedGeometry, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_points_non_numeric() {
        assert!(parse_points(&[json!({"x": "left", "y": 1.0})]).is_err());
        assert!(parse_points(&[json!({"x": null, "y": 1.0})]).is_err());
        assert!(parse_points(&[json!([1.0, 2.0])]).is_err());
    }
}
