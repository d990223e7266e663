//! PortMap detection entrypoint: load flows, score them, write alerts and summaries.
//! Config is read from `PORTMAP_CONFIG_PATH` (default `config.json`).

use portmap_detect::{
    config::DetectorConfig,
    dataset,
    features::FeatureSchema,
    logging::{StructuredLogger, TracingObserver},
    report::{self, AlertSummary, RunSummary, ScoreHistogram},
    scoring::AnomalyDetector,
};
use std::sync::Arc;
use tracing::info;

fn run(config: &DetectorConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    config.validate()?;
    std::fs::create_dir_all(&config.data.output_dir)?;

    let (table, _) = dataset::load_dataset(&config.data.input_path)?;
    let schema = FeatureSchema::from(&config.features);
    let matrix = table.feature_matrix(&schema)?;
    info!(features = schema.len(), "features selected");

    let detector = AnomalyDetector::from_config(config)?.with_observer(Arc::new(TracingObserver));
    let detection = detector.fit_predict(matrix.view())?;

    let hist_path = config.data.output_dir.join("anomaly_hist.json");
    let histogram = ScoreHistogram::build(
        &detection.scores,
        &detection.labels,
        config.data.histogram_bins,
    )?;
    report::write_json(&histogram, &hist_path)?;
    info!(path = %hist_path.display(), "score histogram saved");

    let alerts_path = config.data.output_dir.join("alerts.csv");
    AlertSummary::build(&table, &detection)?.save(&alerts_path)?;

    let summary = RunSummary::from_detection(&detection);
    report::write_json(&summary, &config.data.output_dir.join("summary.json"))?;
    StructuredLogger::emit_json(&summary, &mut std::io::stdout().lock())?;

    info!(
        flows = summary.flows_processed,
        anomalies = summary.anomalies,
        anomaly_rate = summary.anomaly_rate,
        output_dir = %config.data.output_dir.display(),
        "analysis complete"
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("PORTMAP_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = DetectorConfig::load(&config_path);

    StructuredLogger::init(&config.log);
    info!(input = ?config.data.input_path, "starting anomaly detection pipeline");

    if let Err(e) = run(&config) {
        tracing::error!(error = %e, "pipeline failed");
        return Err(e);
    }
    Ok(())
}
