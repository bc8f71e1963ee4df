// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Input records and statistics produced by the aggregator.

use crate::Point;
use serde::{
    Deserialize, Serialize,
    ser::{SerializeMap, Serializer},
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Annotation identifier.
pub type AnnotationId = u64;

/// Image identifier shared by annotations and detection results.
pub type ImageId = u64;

/// A polygon region drawn over an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique annotation ID.
    pub id: AnnotationId,
    /// ID of the image the annotation is drawn on.
    pub image: ImageId,
    /// Boundary geometry, e.g. `MULTIPOINT ((x y), ...)`.
    pub location: String,
    /// Area of the boundary in squared coordinate units.
    pub area: f64,
    /// Term descriptor, carried through untouched.
    #[serde(default)]
    pub term: Value,
}

/// Point detections for one image, grouped by category label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// ID of the image the detections belong to.
    pub image: ImageId,
    /// Term descriptor of the detection job.
    #[serde(default)]
    pub terms: Value,
    /// Category label → raw `{"x": .., "y": ..}` point records.
    #[serde(default)]
    pub data: BTreeMap<String, Vec<Value>>,
}

/// Image-level counts taken from the matching detection result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageInfo {
    /// Category label → number of detections in the whole image.
    pub counts: BTreeMap<String, usize>,
    /// Number of detections across all categories.
    pub total: usize,
    /// Area of the annotation, for reference.
    pub annotation_area: f64,
}

/// Per-category statistics for one annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CategoryStats {
    /// Detections of this category in the whole image.
    pub image_count: usize,
    /// Detections of this category inside the annotation.
    pub inside_count: usize,
    /// `inside_count / area`.
    pub density: f64,
}

/// Statistics record for one annotation.
///
/// Serializes to the report layout consumed downstream:
///
/// ```json
/// {
///   "info_imagen": {"conteo_cell_imagen": 2, "conteo_total_imagen": 2, "area_anotacion": 1.0},
///   "info_termino_cell": {"conteo_cell_anotacion": 1, "densidad_cell_anotación(n/micron²)": 1.0}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStats {
    pub image: ImageInfo,
    pub categories: BTreeMap<String, CategoryStats>,
}

impl AnnotationStats {
    /// Statistics for a single category label.
    pub fn category(&self, label: &str) -> Option<&CategoryStats> {
        self.categories.get(label)
    }
}

impl Serialize for AnnotationStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + self.categories.len()))?;
        map.serialize_entry("info_imagen", &self.image)?;
        for (label, stats) in &self.categories {
            map.serialize_entry(&format!("info_termino_{}", label), &CategoryEntry(label, stats))?;
        }
        map.end()
    }
}

impl Serialize for ImageInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len() + 2))?;
        for (label, count) in &self.counts {
            map.serialize_entry(&format!("conteo_{}_imagen", label), count)?;
        }
        map.serialize_entry("conteo_total_imagen", &self.total)?;
        map.serialize_entry("area_anotacion", &self.annotation_area)?;
        map.end()
    }
}

struct CategoryEntry<'a>(&'a str, &'a CategoryStats);

impl Serialize for CategoryEntry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let CategoryEntry(label, stats) = self;
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&format!("conteo_{}_anotacion", label), &stats.inside_count)?;
        map.serialize_entry(
            &format!("densidad_{}_anotación(n/micron²)", label),
            &stats.density,
        )?;
        map.end()
    }
}

/// Detections found inside one annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsidePointsRecord {
    pub annotation: AnnotationId,
    /// Category label → points inside the annotation.
    pub points: BTreeMap<String, Vec<Point>>,
    /// Term descriptor of the last matching detection result.
    pub terms: Value,
}

/// An annotation dropped from the outputs because its processing failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedAnnotation {
    pub annotation: AnnotationId,
    pub reason: String,
}

/// Outputs of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    /// Annotation ID → statistics.
    pub stats: BTreeMap<AnnotationId, AnnotationStats>,
    /// One record per annotation with a matching result, in input order.
    pub inside_points: Vec<InsidePointsRecord>,
    /// Annotations that failed and were skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedAnnotation>,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
