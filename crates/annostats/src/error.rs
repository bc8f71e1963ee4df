// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

/// Error type for annotation statistics operations.
///
/// The geometry variants are raised by the core while parsing and testing
/// polygons; the remaining variants belong to the file, configuration and
/// reporting boundary around it.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred during file operations.
    IoError(std::io::Error),
    /// Configuration parsing or loading error.
    ConfigError(config::ConfigError),
    /// JSON serialization or deserialization error.
    JsonError(serde_json::Error),
    /// A polygon or point record could not be parsed into numeric
    /// coordinates, or a polygon has fewer than three vertices.
    MalformedGeometry(String),
    /// The query point coincides with a polygon vertex.
    DegenerateGeometry { x: f64, y: f64 },
    /// Density is undefined because the annotation area is not positive.
    InvalidArea { annotation: u64, area: f64 },
    /// No annotations were supplied for analysis.
    MissingAnnotations(String),
    /// No detection results were supplied for analysis.
    MissingResults(String),
    /// The aggregation produced no statistics.
    MissingStatistics(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::ConfigError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::MalformedGeometry(s) => write!(f, "Malformed geometry: {}", s),
            Error::DegenerateGeometry { x, y } => {
                write!(f, "Degenerate geometry: point ({}, {}) lies on a vertex", x, y)
            }
            Error::InvalidArea { annotation, area } => write!(
                f,
                "Invalid area {} for annotation {}: density is undefined",
                area, annotation
            ),
            Error::MissingAnnotations(s) => write!(f, "Missing annotations: {}", s),
            Error::MissingResults(s) => write!(f, "Missing results: {}", s),
            Error::MissingStatistics(s) => write!(f, "Missing statistics: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::ConfigError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            _ => None,
        }
    }
}
