// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! JSON report writer for aggregation outputs.

use crate::{Error, types::Aggregation};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Options for report writing.
#[derive(Debug, Clone, Default)]
pub struct ReportWriteOptions {
    /// Pretty-print JSON with indentation.
    pub pretty: bool,
}

/// Writes an [`Aggregation`] as a JSON report.
///
/// # Example
///
/// ```rust,no_run
/// use annostats::{Aggregation, ReportWriter};
///
/// let writer = ReportWriter::new();
/// writer.write_json(&Aggregation::default(), "report.json")?;
/// # Ok::<(), annostats::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReportWriter {
    options: ReportWriteOptions,
}

impl ReportWriter {
    /// Create a new report writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new report writer with custom options.
    pub fn with_options(options: ReportWriteOptions) -> Self {
        Self { options }
    }

    /// Write the report to a file.
    pub fn write_json<P: AsRef<Path>>(
        &self,
        aggregation: &Aggregation,
        path: P,
    ) -> Result<(), Error> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to(aggregation, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the report to any writer, followed by a newline.
    pub fn write_to<W: Write>(&self, aggregation: &Aggregation, mut writer: W) -> Result<(), Error> {
        if self.options.pretty {
            serde_json::to_writer_pretty(&mut writer, aggregation)?;
        } else {
            serde_json::to_writer(&mut writer, aggregation)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Render the report as a string.
    pub fn render(&self, aggregation: &Aggregation) -> Result<String, Error> {
        let json = if self.options.pretty {
            serde_json::to_string_pretty(aggregation)?
        } else {
            serde_json::to_string(aggregation)?
        };
        Ok(json)
    }
}
