// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! End-to-end aggregation tests over JSON inputs.

use annostats::{
    AnalysisConfig, Annotation, DetectionResult, ReportWriteOptions, ReportWriter, aggregate,
    read_annotations, read_results,
};
use serde_json::{Value, json};
use std::{collections::BTreeSet, fs};
use tempfile::TempDir;

fn write_inputs(
    dir: &TempDir,
    annotations: &Value,
    results: &Value,
) -> (Vec<Annotation>, Vec<DetectionResult>) {
    let annotations_path = dir.path().join("annotations.json");
    let results_path = dir.path().join("results.json");
    fs::write(&annotations_path, annotations.to_string()).unwrap();
    fs::write(&results_path, results.to_string()).unwrap();

    (
        read_annotations(&annotations_path).unwrap(),
        read_results(&results_path).unwrap(),
    )
}

/// Four annotations over three images, two of which carry detections.
fn tissue_inputs() -> (Value, Value) {
    let annotations = json!([
        {"id": 101, "image": 7, "location": "MULTIPOINT ((0 0), (10 0), (10 10), (0 10))", "area": 100.0, "term": [3]},
        {"id": 102, "image": 7, "location": "POLYGON ((20 20, 30 20, 25 30, 20 20))", "area": 50.0, "term": [3]},
        {"id": 103, "image": 8, "location": "MULTIPOINT ((0 0), (4 0), (4 4), (0 4))", "area": 16.0, "term": [4]},
        {"id": 104, "image": 9, "location": "MULTIPOINT ((0 0), (4 0), (4 4), (0 4))", "area": 16.0, "term": [4]}
    ]);
    let results = json!([
        {"image": 7, "terms": "3", "data": {
            "positive": [{"x": 1, "y": 1}, {"x": 5.5, "y": 9.5}, {"x": 25, "y": 24}, {"x": 40, "y": 40}],
            "negative": [{"x": 9.9, "y": 0.1}, {"x": 21, "y": 29}]
        }},
        {"image": 8, "terms": "4", "data": {
            "positive": [{"x": 2, "y": 2}, {"x": 3, "y": 1}, {"x": 5, "y": 5}],
            "negative": []
        }}
    ]);
    (annotations, results)
}

#[test]
fn test_end_to_end_square() {
    let dir = TempDir::new().unwrap();
    let (annotations, results) = write_inputs(
        &dir,
        &json!([{"id": 1, "image": 7, "location": "MULTIPOINT ((0 0), (1 0), (1 1), (0 1))", "area": 1, "term": [42]}]),
        &json!([{"image": 7, "terms": "42", "data": {"cell": [{"x": 0.5, "y": 0.5}, {"x": 5, "y": 5}]}}]),
    );

    let aggregation = aggregate(&annotations, &results).unwrap();
    let report = serde_json::to_value(&aggregation).unwrap();

    let stats = &report["stats"]["1"];
    assert_eq!(stats["info_imagen"]["conteo_cell_imagen"], 2);
    assert_eq!(stats["info_imagen"]["conteo_total_imagen"], 2);
    assert_eq!(stats["info_termino_cell"]["conteo_cell_anotacion"], 1);
    assert_eq!(stats["info_termino_cell"]["densidad_cell_anotación(n/micron²)"], 1.0);

    assert_eq!(
        report["inside_points"],
        json!([{"annotation": 1, "points": {"cell": [{"x": 0.5, "y": 0.5}]}, "terms": "42"}])
    );
}

#[test]
fn test_tissue_counts() {
    let dir = TempDir::new().unwrap();
    let (annotations, results) = tissue_inputs();
    let (annotations, results) = write_inputs(&dir, &annotations, &results);

    let aggregation = aggregate(&annotations, &results).unwrap();

    // Annotation 104 sits on an image without detections.
    assert_eq!(aggregation.stats.keys().copied().collect::<Vec<_>>(), vec![101, 102, 103]);
    assert_eq!(aggregation.inside_points.len(), 3);

    let square = &aggregation.stats[&101];
    assert_eq!(square.image.total, 6);
    assert_eq!(square.category("positive").unwrap().inside_count, 2);
    assert_eq!(square.category("negative").unwrap().inside_count, 1);
    assert!((square.category("positive").unwrap().density - 0.02).abs() < 1e-12);

    let triangle = &aggregation.stats[&102];
    assert_eq!(triangle.category("positive").unwrap().inside_count, 1);
    assert_eq!(triangle.category("negative").unwrap().inside_count, 0);

    let small = &aggregation.stats[&103];
    assert_eq!(small.category("positive").unwrap().inside_count, 2);
    assert_eq!(small.category("negative").unwrap().image_count, 0);
}

#[test]
fn test_count_and_category_invariants() {
    let (annotations, results) = tissue_inputs();
    let annotations: Vec<Annotation> = serde_json::from_value(annotations).unwrap();
    let results: Vec<DetectionResult> = serde_json::from_value(results).unwrap();

    let aggregation = aggregate(&annotations, &results).unwrap();

    for annotation in &annotations {
        let Some(stats) = aggregation.stats.get(&annotation.id) else {
            continue;
        };
        let result = results.iter().find(|r| r.image == annotation.image).unwrap();

        let expected: BTreeSet<_> = result.data.keys().collect();
        let actual: BTreeSet<_> = stats.categories.keys().collect();
        assert_eq!(expected, actual);

        let inside: usize = stats.categories.values().map(|c| c.inside_count).sum();
        let raw: usize = stats.categories.values().map(|c| c.image_count).sum();
        assert!(inside <= raw);
        assert_eq!(raw, stats.image.total);

        for category in stats.categories.values() {
            let density = category.inside_count as f64 / annotation.area;
            assert!((category.density - density).abs() < 1e-12);
        }
    }
}

#[test]
fn test_reports_are_deterministic() {
    let (annotations, results) = tissue_inputs();
    let annotations: Vec<Annotation> = serde_json::from_value(annotations).unwrap();
    let results: Vec<DetectionResult> = serde_json::from_value(results).unwrap();
    let writer = ReportWriter::with_options(ReportWriteOptions { pretty: true });

    let first = writer.render(&aggregate(&annotations, &results).unwrap()).unwrap();
    let second = writer.render(&aggregate(&annotations, &results).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_filtered_selection() {
    let (annotations, results) = tissue_inputs();
    let annotations: Vec<Annotation> = serde_json::from_value(annotations).unwrap();
    let results: Vec<DetectionResult> = serde_json::from_value(results).unwrap();

    let config = AnalysisConfig {
        images: Some(vec![8, 9]),
        ..Default::default()
    };
    let selected = config.select_annotations(annotations);
    let aggregation = aggregate(&selected, &results).unwrap();

    assert_eq!(aggregation.stats.keys().copied().collect::<Vec<_>>(), vec![103]);
}
