// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # Annotation Point Statistics
//!
//! Counts per-image point detections inside annotation polygons and derives
//! per-category densities.
//!
//! ## Features
//!
//! - **Geometry parsing**: `MULTIPOINT`/`POLYGON` boundaries and
//!   `{"x", "y"}` point records
//! - **Containment**: winding-angle point-in-polygon test
//! - **Aggregation**: per-annotation, per-category counts and densities,
//!   sequentially or on the rayon thread pool
//! - **Configuration**: optional image/annotation filters layered from a file
//!   and `ANNOSTATS_*` environment variables
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use annostats::{Aggregator, AnalysisConfig, ReportWriter, read_annotations, read_results};
//!
//! let config = AnalysisConfig::load(None)?;
//! let annotations = config.select_annotations(read_annotations("annotations.json")?);
//! let results = read_results("results.json")?;
//!
//! let aggregation = Aggregator::with_options(config.aggregate_options())
//!     .aggregate(&annotations, &results)?;
//! ReportWriter::new().write_json(&aggregation, "stats.json")?;
//! # Ok::<(), annostats::Error>(())
//! ```
//!
//! ## Optional Features
//!
//! - `profiling`: emits `tracing` spans around the aggregation entry points

mod containment;
mod error;
mod geometry;
mod reader;
mod settings;
mod stats;
mod types;
mod writer;

pub use crate::{
    containment::{VertexPolicy, WINDING_TOLERANCE, is_inside, winding_angle},
    error::Error,
    geometry::{Point, Polygon, parse_points, parse_polygon},
    reader::{from_reader, read_annotations, read_results},
    settings::{AnalysisConfig, ENV_PREFIX},
    stats::{AggregateOptions, Aggregator, ResultIndex, aggregate},
    types::{
        Aggregation, Annotation, AnnotationId, AnnotationStats, CategoryStats, DetectionResult,
        ImageId, ImageInfo, InsidePointsRecord, SkippedAnnotation,
    },
    writer::{ReportWriteOptions, ReportWriter},
};
