use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cohort_core::{BatchResults, ScreeningEntry};
use cohort_runtime::{
    AnthropicProvider, CriteriaProvider, PatientRecord, RuntimeConfig, ScreeningOrchestrator,
};

/// Screen a patient cohort against a clinical trial's eligibility
/// criteria.
#[derive(Parser, Debug)]
#[command(name = "cohort", version)]
struct Cli {
    /// Trial protocol document (plain text)
    #[arg(long)]
    protocol: PathBuf,

    /// Directory of patient records (EHR_*.csv)
    #[arg(long)]
    patients: PathBuf,

    /// Trial identifier recorded in every verdict
    #[arg(long)]
    trial_id: String,

    /// Result artifact path
    #[arg(long, default_value = "eligibility_results.json")]
    output: PathBuf,

    /// Runtime configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured model
    #[arg(long)]
    model: Option<String>,

    /// Override the number of patients assessed concurrently
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }

    let protocol_text = fs::read_to_string(&cli.protocol)
        .with_context(|| format!("failed to read protocol {}", cli.protocol.display()))?;

    let patients = load_patient_records(&cli.patients)?;
    if patients.is_empty() {
        bail!(
            "no EHR_*.csv records found in {}",
            cli.patients.display()
        );
    }
    tracing::info!(
        patients = patients.len(),
        trial_id = %cli.trial_id,
        model = %config.model,
        "starting screening run"
    );

    let provider = Arc::new(
        AnthropicProvider::from_env().context("Anthropic provider not configured")?,
    );

    // One criteria call for the whole run. Failure here is fatal;
    // assessing without criteria would be meaningless.
    let criteria = CriteriaProvider::new(provider.clone(), config.completion_config());
    let criteria_text = criteria
        .extract(&protocol_text)
        .await
        .context("eligibility criteria extraction failed")?;

    let orchestrator = ScreeningOrchestrator::new(provider, config);
    let results = orchestrator
        .screen_batch(&cli.trial_id, &criteria_text, &patients)
        .await;

    results
        .finalize(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    print_summary(&results, &cli.output);
    Ok(())
}

/// Collect patient records from a directory, in filename order so the
/// batch (and the result artifact) is deterministic.
fn load_patient_records(dir: &Path) -> Result<Vec<PatientRecord>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read patient directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("EHR_") && name.ends_with(".csv"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| {
            let patient_id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("unknown")
                .to_string();
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read patient record {}", path.display()))?;
            Ok(PatientRecord {
                patient_id,
                rows: parse_rows(&contents),
            })
        })
        .collect()
}

fn parse_rows(contents: &str) -> Vec<Vec<String>> {
    contents
        .lines()
        .map(|line| {
            line.trim_end_matches('\r')
                .split(',')
                .map(|cell| cell.to_string())
                .collect()
        })
        .collect()
}

fn print_summary(results: &BatchResults, output: &Path) {
    for entry in results.entries() {
        match entry {
            ScreeningEntry::Verdict(v) => println!(
                "{}\t{}\tconfidence {:.2}",
                v.patient_id, v.overall_eligibility, v.confidence_score
            ),
            ScreeningEntry::Failed(f) => {
                println!("{}\t{}\t{}", f.patient_id, f.status, f.error)
            }
        }
    }
    println!(
        "screened {} patients: {} assessed, {} failed",
        results.len(),
        results.assessed_count(),
        results.failed_count()
    );
    println!("results written to {}", output.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_splits_on_commas() {
        let rows = parse_rows("DEMOGRAPHICS\nAge,Sex\n54,F\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["DEMOGRAPHICS"]);
        assert_eq!(rows[1], vec!["Age", "Sex"]);
        assert_eq!(rows[2], vec!["54", "F"]);
    }

    #[test]
    fn test_parse_rows_strips_carriage_returns() {
        let rows = parse_rows("Age,Sex\r\n54,F\r\n");
        assert_eq!(rows[0], vec!["Age", "Sex"]);
        assert_eq!(rows[1], vec!["54", "F"]);
    }

    #[test]
    fn test_parse_rows_keeps_empty_cells() {
        let rows = parse_rows("a,,c");
        assert_eq!(rows[0], vec!["a", "", "c"]);
    }

    #[test]
    fn test_load_patient_records_filters_and_sorts() {
        let dir = std::env::temp_dir().join(format!("cohort-cli-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("EHR_002.csv"), "Age\n54\n").unwrap();
        fs::write(dir.join("EHR_001.csv"), "Age\n61\n").unwrap();
        fs::write(dir.join("notes.txt"), "ignore me").unwrap();
        fs::write(dir.join("protocol.csv"), "ignore me too").unwrap();

        let records = load_patient_records(&dir).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["EHR_001", "EHR_002"]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
