// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Aggregation of detection points into per-annotation statistics.
//!
//! Each annotation is joined with the detection results of its image. Every
//! detected point is tested against the annotation boundary and the survivors
//! are counted per category, giving the inside count and density
//! (`inside / area`) alongside the image-level counts.
//!
//! When several results share an image, they are applied in encounter order
//! and later results overwrite earlier ones: the image-level counts come from
//! the last result alone, per-category entries are replaced key by key, and
//! the inside-points record carries the last result's terms.

use crate::{
    Annotation, AnnotationId, AnnotationStats, DetectionResult, Error, ImageId, ImageInfo,
    InsidePointsRecord, Point, Polygon,
    containment::VertexPolicy,
    geometry::{parse_points, parse_polygon},
    types::{Aggregation, CategoryStats, SkippedAnnotation},
};
use log::{debug, warn};
use rayon::prelude::*;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Options for an aggregation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Drop annotations whose processing fails instead of aborting the run.
    pub skip_invalid: bool,
    /// Classification of detections lying exactly on a polygon vertex.
    pub vertex_policy: VertexPolicy,
}

/// Detection results grouped by image, preserving encounter order.
#[derive(Debug, Clone, Default)]
pub struct ResultIndex<'a> {
    by_image: HashMap<ImageId, Vec<&'a DetectionResult>>,
}

impl<'a> ResultIndex<'a> {
    pub fn new(results: &'a [DetectionResult]) -> Self {
        let mut by_image: HashMap<ImageId, Vec<&'a DetectionResult>> = HashMap::new();
        for result in results {
            by_image.entry(result.image).or_default().push(result);
        }
        Self { by_image }
    }

    /// Results for an image, in the order they were supplied.
    pub fn results_for_image(&self, image: ImageId) -> &[&'a DetectionResult] {
        self.by_image
            .get(&image)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct images with at least one result.
    pub fn image_count(&self) -> usize {
        self.by_image.len()
    }
}

type Outcome = Result<Option<(AnnotationStats, InsidePointsRecord)>, Error>;

/// Computes per-annotation statistics from detection results.
///
/// # Example
///
/// ```
/// use annostats::{Aggregator, Annotation, DetectionResult};
/// use serde_json::json;
/// use std::collections::BTreeMap;
///
/// let annotations = vec![Annotation {
///     id: 1,
///     image: 7,
///     location: "MULTIPOINT ((0 0), (1 0), (1 1), (0 1))".to_string(),
///     area: 1.0,
///     term: json!([42]),
/// }];
/// let results = vec![DetectionResult {
///     image: 7,
///     terms: json!("42"),
///     data: BTreeMap::from([(
///         "cell".to_string(),
///         vec![json!({"x": 0.5, "y": 0.5}), json!({"x": 5, "y": 5})],
///     )]),
/// }];
///
/// let aggregation = Aggregator::new().aggregate(&annotations, &results)?;
/// let cell = aggregation.stats[&1].category("cell").unwrap();
/// assert_eq!(cell.image_count, 2);
/// assert_eq!(cell.inside_count, 1);
/// # Ok::<(), annostats::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    options: AggregateOptions,
}

impl Aggregator {
    /// Create an aggregator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an aggregator with custom options.
    pub fn with_options(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Aggregate all annotations sequentially, in input order.
    #[cfg_attr(
        feature = "profiling",
        tracing::instrument(
            skip_all,
            fields(annotations = annotations.len(), results = results.len())
        )
    )]
    pub fn aggregate(
        &self,
        annotations: &[Annotation],
        results: &[DetectionResult],
    ) -> Result<Aggregation, Error> {
        let index = ResultIndex::new(results);
        debug!(
            "Aggregating {} annotations against results for {} images",
            annotations.len(),
            index.image_count()
        );
        let outcomes = annotations
            .iter()
            .map(|annotation| (annotation.id, self.process(annotation, &index)));
        self.collect(outcomes)
    }

    /// Aggregate annotations on the rayon thread pool.
    ///
    /// Outcomes are folded in input order, so the output matches
    /// [`aggregate`](Self::aggregate) exactly.
    #[cfg_attr(
        feature = "profiling",
        tracing::instrument(
            skip_all,
            fields(annotations = annotations.len(), results = results.len())
        )
    )]
    pub fn aggregate_par(
        &self,
        annotations: &[Annotation],
        results: &[DetectionResult],
    ) -> Result<Aggregation, Error> {
        let index = ResultIndex::new(results);
        debug!(
            "Aggregating {} annotations in parallel against results for {} images",
            annotations.len(),
            index.image_count()
        );
        let outcomes: Vec<(AnnotationId, Outcome)> = annotations
            .par_iter()
            .map(|annotation| (annotation.id, self.process(annotation, &index)))
            .collect();
        self.collect(outcomes)
    }

    /// Compute the statistics of a single annotation.
    ///
    /// Returns `Ok(None)` when no detection result matches the annotation's
    /// image.
    pub fn process(
        &self,
        annotation: &Annotation,
        index: &ResultIndex<'_>,
    ) -> Result<Option<(AnnotationStats, InsidePointsRecord)>, Error> {
        let polygon = parse_polygon(&annotation.location)?;

        let matches = index.results_for_image(annotation.image);
        let Some(last) = matches.last() else {
            debug!(
                "Annotation {} has no detection results for image {}",
                annotation.id, annotation.image
            );
            return Ok(None);
        };

        if !annotation.area.is_finite() || annotation.area <= 0.0 {
            return Err(Error::InvalidArea {
                annotation: annotation.id,
                area: annotation.area,
            });
        }

        if matches.len() > 1 {
            warn!(
                "Annotation {}: {} detection results match image {}, later results overwrite earlier ones",
                annotation.id,
                matches.len(),
                annotation.image
            );
        }

        let mut stats = AnnotationStats::default();
        let mut points = BTreeMap::new();

        for result in matches {
            stats.image = image_info(result, annotation.area);

            for (label, raw) in &result.data {
                let inside = self.inside_points(raw, &polygon)?;
                stats.categories.insert(
                    label.clone(),
                    CategoryStats {
                        image_count: raw.len(),
                        inside_count: inside.len(),
                        density: inside.len() as f64 / annotation.area,
                    },
                );
                points.insert(label.clone(), inside);
            }
        }

        let record = InsidePointsRecord {
            annotation: annotation.id,
            points,
            terms: last.terms.clone(),
        };

        Ok(Some((stats, record)))
    }

    fn inside_points(&self, raw: &[Value], polygon: &Polygon) -> Result<Vec<Point>, Error> {
        let mut inside = Vec::new();
        for point in parse_points(raw)? {
            if self.options.vertex_policy.classify(&point, polygon)? {
                inside.push(point);
            }
        }
        Ok(inside)
    }

    fn collect(
        &self,
        outcomes: impl IntoIterator<Item = (AnnotationId, Outcome)>,
    ) -> Result<Aggregation, Error> {
        let mut aggregation = Aggregation::default();

        for (id, outcome) in outcomes {
            match outcome {
                Ok(Some((stats, record))) => {
                    aggregation.inside_points.push(record);
                    aggregation.stats.insert(id, stats);
                }
                Ok(None) => {}
                Err(err) if self.options.skip_invalid => {
                    warn!("Skipping annotation {}: {}", id, err);
                    aggregation.skipped.push(SkippedAnnotation {
                        annotation: id,
                        reason: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            "Computed statistics for {} annotations ({} skipped)",
            aggregation.stats.len(),
            aggregation.skipped.len()
        );

        Ok(aggregation)
    }
}

fn image_info(result: &DetectionResult, annotation_area: f64) -> ImageInfo {
    let counts: BTreeMap<String, usize> = result
        .data
        .iter()
        .map(|(label, raw)| (label.clone(), raw.len()))
        .collect();
    let total = counts.values().sum();

    ImageInfo {
        counts,
        total,
        annotation_area,
    }
}

/// Aggregate with default options.
///
/// Shorthand for `Aggregator::new().aggregate(annotations, results)`.
pub fn aggregate(
    annotations: &[Annotation],
    results: &[DetectionResult],
) -> Result<Aggregation, Error> {
    Aggregator::new().aggregate(annotations, results)
}
