// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! JSON readers for annotation and detection result collections.

use crate::{Annotation, DetectionResult, Error};
use log::debug;
use serde::de::DeserializeOwned;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

/// Read a JSON array of [`Annotation`] records.
pub fn read_annotations<P: AsRef<Path>>(path: P) -> Result<Vec<Annotation>, Error> {
    let annotations: Vec<Annotation> = read_json(path.as_ref())?;
    debug!("Read {} annotations from {:?}", annotations.len(), path.as_ref());
    Ok(annotations)
}

/// Read a JSON array of [`DetectionResult`] records.
pub fn read_results<P: AsRef<Path>>(path: P) -> Result<Vec<DetectionResult>, Error> {
    let results: Vec<DetectionResult> = read_json(path.as_ref())?;
    debug!("Read {} detection results from {:?}", results.len(), path.as_ref());
    Ok(results)
}

/// Deserialize any JSON document from a reader.
pub fn from_reader<T: DeserializeOwned, R: Read>(reader: R) -> Result<T, Error> {
    Ok(serde_json::from_reader(reader)?)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let file = File::open(path)?;
    from_reader(BufReader::with_capacity(64 * 1024, file))
}
