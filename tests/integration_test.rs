//! Integration test: config load, CSV ingestion and cleaning, detection, report export.

use portmap_detect::{
    config::{DetectorConfig, ForestConfig, SubsampleSize},
    dataset::{self, FlowTable, INF_REPLACEMENT},
    features::{FeatureSchema, FLOW_FEATURES},
    report::{self, AlertSummary, RunSummary, ScoreHistogram},
    AnomalyDetector, DetectError, Label, PipelineError,
};
use std::fmt::Write as _;
use std::path::Path;

/// CIC-style CSV: leading spaces in headers, 60 ordinary flows, 2 bursts,
/// one incomplete row and one duplicate.
fn portmap_csv() -> String {
    let mut header = vec![" Source IP".to_string(), " Destination IP".to_string(), " Timestamp".to_string()];
    header.extend(FLOW_FEATURES.iter().map(|f| format!(" {f}")));
    let mut out = header.join(",");
    out.push('\n');

    let row = |i: usize, scale: f64| -> String {
        let mut cells = vec![
            format!("172.16.0.{}", i % 250),
            "192.168.50.4".to_string(),
            format!("2018-11-03 10:{:02}:{:02}", i / 60, i % 60),
        ];
        for j in 0..FLOW_FEATURES.len() {
            let base = ((i * 7 + j * 13) % 17) as f64 + 1.0;
            cells.push(format!("{}", base * scale));
        }
        cells.join(",")
    };

    for i in 0..60 {
        writeln!(out, "{}", row(i, 1.0)).unwrap();
    }
    writeln!(out, "{}", row(60, 400.0)).unwrap();
    writeln!(out, "{}", row(61, 650.0)).unwrap();
    // duplicate of row 3
    writeln!(out, "{}", row(3, 1.0)).unwrap();
    // missing value
    let broken = row(70, 1.0).replacen("192.168.50.4", "", 1);
    writeln!(out, "{broken}").unwrap();
    out
}

fn write_csv(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("flows.csv");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn config_load_default() {
    let c = DetectorConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.forest.n_trees, 100);
    assert_eq!(c.forest.subsample_size, SubsampleSize::Auto);
    assert_eq!(c.forest.seed, 42);
    assert_eq!(c.scoring.contamination, 0.02);
    assert_eq!(c.features.columns.len(), 12);
    assert!(c.validate().is_ok());
}

#[test]
fn config_load_partial_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"forest": {"n_trees": 10, "subsample_size": {"fixed": 64}}, "scoring": {"contamination": 0.05}}"#,
    )
    .unwrap();
    let c = DetectorConfig::load(&path);
    assert_eq!(c.forest.n_trees, 10);
    assert_eq!(c.forest.subsample_size, SubsampleSize::Fixed(64));
    assert_eq!(c.forest.seed, 42);
    assert_eq!(c.scoring.contamination, 0.05);

    std::fs::write(&path, r#"{"forest": {"subsample_size": "auto"}, "scoring": {"contamination": 2.0}}"#).unwrap();
    let c = DetectorConfig::load(&path);
    assert_eq!(c.forest.subsample_size, SubsampleSize::Auto);
    assert!(matches!(c.validate(), Err(DetectError::InvalidInput(_))));
}

#[test]
fn load_and_clean_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), &portmap_csv());
    let (table, stats) = dataset::load_dataset(&path).unwrap();

    assert_eq!(stats.rows_read, 64);
    assert_eq!(stats.dropped_missing, 1);
    assert_eq!(stats.dropped_duplicates, 1);
    assert_eq!(stats.rows_kept, 62);
    assert_eq!(table.len(), 62);
    assert_eq!(table.columns()[0], "Source IP");

    let matrix = table.feature_matrix(&FeatureSchema::default()).unwrap();
    assert_eq!(matrix.dim(), (62, 12));
}

#[test]
fn feature_matrix_maps_infinity_and_reports_bad_cells() {
    let csv = "Flow Duration,Fwd Packets/s\n10,inf\n12,-Infinity\n";
    let table = dataset::read_flows(csv.as_bytes()).unwrap();
    let schema = FeatureSchema::new(["Flow Duration", "Fwd Packets/s"]);
    let m = table.feature_matrix(&schema).unwrap();
    assert_eq!(m[[0, 1]], INF_REPLACEMENT);
    assert_eq!(m[[1, 1]], INF_REPLACEMENT);

    let bad = FlowTable::new(
        vec!["Flow Duration".into(), "Fwd Packets/s".into()],
        vec![vec!["1".into(), "fast".into()]],
    );
    match bad.feature_matrix(&schema) {
        Err(PipelineError::Parse { row, column, value }) => {
            assert_eq!((row, column.as_str(), value.as_str()), (0, "Fwd Packets/s", "fast"));
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn missing_schema_column_is_a_schema_error() {
    let table = dataset::read_flows("Flow Duration,Protocol\n1,6\n".as_bytes()).unwrap();
    match table.feature_matrix(&FeatureSchema::default()) {
        Err(PipelineError::Detect(DetectError::Schema { missing })) => {
            assert_eq!(missing.len(), 11);
            assert!(!missing.contains(&"Flow Duration".to_string()));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn end_to_end_detection_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), &portmap_csv());
    let (table, _) = dataset::load_dataset(&path).unwrap();

    let config = DetectorConfig {
        forest: ForestConfig {
            n_trees: 50,
            seed: 7,
            ..ForestConfig::default()
        },
        ..DetectorConfig::default()
    };
    let matrix = table.feature_matrix(&FeatureSchema::from(&config.features)).unwrap();
    let detection = AnomalyDetector::from_config(&config)
        .unwrap()
        .fit_predict(matrix.view())
        .unwrap();

    assert_eq!(detection.len(), 62);
    let flagged = detection.anomaly_indices();
    assert!((1..=3).contains(&flagged.len()), "flagged {flagged:?}");
    assert!(flagged.contains(&61), "flagged {flagged:?}");

    let summary = AlertSummary::build(&table, &detection).unwrap();
    assert_eq!(summary.context_columns(), &["Source IP", "Destination IP", "Flow Duration"]);
    assert_eq!(summary.anomalies().count(), flagged.len());
    assert_eq!(summary.rows()[0].timestamp, "2018-11-03 10:00:00");

    let alerts_path = dir.path().join("alerts.csv");
    summary.save(&alerts_path).unwrap();
    let written = std::fs::read_to_string(&alerts_path).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("Timestamp,Anomaly_Score,Is_Anomaly,Source IP,Destination IP,Flow Duration")
    );
    assert_eq!(lines.count(), 62);

    let hist = ScoreHistogram::build(&detection.scores, &detection.labels, 20).unwrap();
    assert_eq!(hist.edges.len(), 21);
    assert_eq!(hist.normal_count + hist.anomaly_count, 62);

    let run = RunSummary::from_detection(&detection);
    let run_path = dir.path().join("summary.json");
    report::write_json(&run, &run_path).unwrap();
    let back: RunSummary = serde_json::from_str(&std::fs::read_to_string(&run_path).unwrap()).unwrap();
    assert_eq!(back.flows_processed, 62);
    assert_eq!(back.anomalies, flagged.len());
    assert_eq!(back.generated_at, run.generated_at);
    assert!((back.threshold - detection.threshold).abs() < 1e-12);
}

#[test]
fn alert_summary_without_timestamp_uses_row_index() {
    let table = dataset::read_flows("Flow Duration\n1\n2\n".as_bytes()).unwrap();
    let detection = portmap_detect::Detection {
        scores: vec![0.4, 0.9],
        labels: vec![Label::Normal, Label::Anomaly],
        threshold: 0.9,
    };
    let summary = AlertSummary::build(&table, &detection).unwrap();
    assert_eq!(summary.rows()[1].timestamp, "1");
    assert_eq!(summary.context_columns(), &["Flow Duration"]);
    assert!(summary.rows()[1].is_anomaly);

    let short = portmap_detect::Detection {
        scores: vec![0.4],
        labels: vec![Label::Normal],
        threshold: 0.4,
    };
    assert!(AlertSummary::build(&table, &short).is_err());
}

#[test]
fn alert_timestamps_are_normalized() {
    let csv = "Timestamp,Flow Duration\n\
               2018-11-03T10:05:07.250,1\n\
               11/03/2018 10:05,2\n\
               2018-11-03 10:05:07.813448,3\n\
               slot-7,4\n";
    let table = dataset::read_flows(csv.as_bytes()).unwrap();
    let detection = portmap_detect::Detection {
        scores: vec![0.4, 0.5, 0.6, 0.9],
        labels: vec![Label::Normal, Label::Normal, Label::Normal, Label::Anomaly],
        threshold: 0.9,
    };
    let summary = AlertSummary::build(&table, &detection).unwrap();
    let stamps: Vec<&str> = summary.rows().iter().map(|r| r.timestamp.as_str()).collect();
    assert_eq!(
        stamps,
        vec![
            "2018-11-03 10:05:07.250",
            "2018-11-03 10:05:00",
            "2018-11-03 10:05:07.813448",
            "slot-7",
        ]
    );
}

#[test]
fn histogram_densities_integrate_to_one() {
    let scores = [0.40, 0.42, 0.45, 0.47, 0.50, 0.52, 0.70, 0.75];
    let labels: Vec<Label> = scores
        .iter()
        .map(|&s| Label::from_score(s, 0.7))
        .collect();
    let hist = ScoreHistogram::build(&scores, &labels, 5).unwrap();
    let width = hist.edges[1] - hist.edges[0];
    let normal_area: f64 = hist.normal.iter().map(|d| d * width).sum();
    let anomaly_area: f64 = hist.anomaly.iter().map(|d| d * width).sum();
    assert!((normal_area - 1.0).abs() < 1e-9);
    assert!((anomaly_area - 1.0).abs() < 1e-9);
    assert_eq!((hist.normal_count, hist.anomaly_count), (6, 2));

    let flat = ScoreHistogram::build(&[0.5, 0.5], &[Label::Normal, Label::Normal], 4).unwrap();
    assert_eq!(flat.bins(), 4);
    assert!(ScoreHistogram::build(&scores, &labels, 0).is_err());
}
