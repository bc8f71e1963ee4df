// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use annostats::{
    AnalysisConfig, Aggregator, Error, ReportWriteOptions, ReportWriter, read_annotations,
    read_results,
};
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Count detected points inside annotation polygons and report per-category
/// densities.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of annotation records (id, image, location, area, term).
    #[clap(long, env = "ANNOSTATS_ANNOTATIONS_FILE")]
    annotations: PathBuf,

    /// JSON array of detection results (image, terms, data).
    #[clap(long, env = "ANNOSTATS_RESULTS_FILE")]
    results: PathBuf,

    /// Analysis configuration file (TOML, JSON or YAML).
    #[clap(long, env = "ANNOSTATS_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Output file path, the report is printed to stdout when omitted.
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON report.
    #[clap(long)]
    pretty: bool,

    /// Process annotations on all available cores.
    #[clap(long)]
    parallel: bool,

    /// Skip annotations that fail to process instead of aborting.
    #[clap(long)]
    skip_invalid: bool,

    /// Only analyze annotations drawn on these images.
    #[clap(long = "image", value_delimiter = ',')]
    images: Vec<u64>,

    /// Only analyze this annotation, when present.
    #[clap(long)]
    annotation: Option<u64>,
}

impl Args {
    /// Command-line values take precedence over the configuration file and
    /// environment.
    fn apply(&self, config: &mut AnalysisConfig) {
        if !self.images.is_empty() {
            config.images = Some(self.images.clone());
        }
        if self.annotation.is_some() {
            config.annotation = self.annotation;
        }
        if self.skip_invalid {
            config.skip_invalid = true;
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    let mut config = AnalysisConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    info!("Collecting annotations from {:?}", args.annotations);
    let annotations = config.select_annotations(read_annotations(&args.annotations)?);
    if annotations.is_empty() {
        return Err(Error::MissingAnnotations(format!(
            "no annotations selected from {}",
            args.annotations.display()
        )));
    }

    info!("Collecting detection results from {:?}", args.results);
    let results = read_results(&args.results)?;
    if results.is_empty() {
        return Err(Error::MissingResults(format!(
            "no detection results found in {}",
            args.results.display()
        )));
    }

    info!(
        "Computing statistics for {} annotations against {} detection results",
        annotations.len(),
        results.len()
    );
    let aggregator = Aggregator::with_options(config.aggregate_options());
    let aggregation = match args.parallel {
        true => aggregator.aggregate_par(&annotations, &results)?,
        false => aggregator.aggregate(&annotations, &results)?,
    };

    if aggregation.is_empty() {
        return Err(Error::MissingStatistics(
            "no annotation matched a detection result".to_string(),
        ));
    }

    let writer = ReportWriter::with_options(ReportWriteOptions {
        pretty: args.pretty,
    });
    match &args.output {
        Some(path) => {
            writer.write_json(&aggregation, path)?;
            info!(
                "Wrote statistics for {} annotations to {:?}",
                aggregation.stats.len(),
                path
            );
        }
        None => writer.write_to(&aggregation, std::io::stdout().lock())?,
    }

    Ok(())
}

#[cfg(feature = "profiling")]
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .finish();

    // The log facade is already owned by env_logger.
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        log::warn!("Failed to install tracing subscriber: {}", err);
    }
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    #[cfg(feature = "profiling")]
    init_tracing();

    let args = Args::parse();
    run(args)
}
