// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Analysis configuration layered from an optional file and the environment.
//!
//! Values are read from the configuration file first (any format the `config`
//! crate recognizes by extension) and then overridden by `ANNOSTATS_*`
//! environment variables, e.g. `ANNOSTATS_SKIP_INVALID=true` or
//! `ANNOSTATS_IMAGES=12,15`.

use crate::{AggregateOptions, Annotation, Error, ImageId, containment::VertexPolicy};
use log::debug;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Prefix of the environment variables read by [`AnalysisConfig::load`].
pub const ENV_PREFIX: &str = "ANNOSTATS";

/// Filters and options for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Only analyze annotations drawn on these images.
    #[serde(deserialize_with = "one_or_many")]
    pub images: Option<Vec<ImageId>>,
    /// Only analyze this annotation, when it is part of the supplied set.
    pub annotation: Option<u64>,
    /// Skip annotations that fail instead of aborting the run.
    pub skip_invalid: bool,
    /// Classification of detections lying on a polygon vertex.
    pub vertex_policy: VertexPolicy,
}

/// `ANNOSTATS_IMAGES=12` arrives as a scalar, `ANNOSTATS_IMAGES=12,15` as a list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<ImageId>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(ImageId),
        Many(Vec<ImageId>),
    }

    Ok(
        Option::<OneOrMany>::deserialize(deserializer)?.map(|images| match images {
            OneOrMany::One(image) => vec![image],
            OneOrMany::Many(images) => images,
        }),
    )
}

impl AnalysisConfig {
    /// Load the configuration from an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!("Loading analysis configuration from {:?}", path);
            builder = builder.add_source(config::File::from(path));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("images"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Options for the aggregator.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            skip_invalid: self.skip_invalid,
            vertex_policy: self.vertex_policy,
        }
    }

    /// Apply the image and annotation filters.
    ///
    /// The annotation filter only narrows the set when the requested ID is
    /// present; otherwise every annotation passing the image filter is kept.
    pub fn select_annotations(&self, annotations: Vec<Annotation>) -> Vec<Annotation> {
        let annotations: Vec<Annotation> = match &self.images {
            Some(images) => annotations
                .into_iter()
                .filter(|a| images.contains(&a.image))
                .collect(),
            None => annotations,
        };

        match self.annotation {
            Some(id) if annotations.iter().any(|a| a.id == id) => {
                annotations.into_iter().filter(|a| a.id == id).collect()
            }
            Some(id) => {
                debug!("Annotation {} not found, keeping all annotations", id);
                annotations
            }
            None => annotations,
        }
    }
}
