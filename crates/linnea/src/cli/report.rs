//! The `linnea report` command: merge and reshape evaluation results.

use clap::{Args, Subcommand};
use linnea_core::output::write_json_file;
use linnea_core::types::{ClassPredictions, RunRecord};
use std::path::{Path, PathBuf};

/// Arguments for the `report` command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

/// Subcommands for result reporting.
#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Merge several per-class prediction-pool JSON files into one
    Merge {
        /// Pool files to merge
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Derive per-class prediction pools from an eval results file
    PerClass {
        /// Results file (JSONL stream or JSON array of run records)
        results: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute the report command.
pub async fn execute(args: ReportArgs) -> anyhow::Result<()> {
    match args.command {
        ReportCommand::Merge { inputs, output } => {
            let mut merged = ClassPredictions::default();
            for path in &inputs {
                let content = std::fs::read_to_string(path)?;
                let pools: ClassPredictions = serde_json::from_str(&content)?;
                merged.merge(pools);
            }
            tracing::info!(
                files = inputs.len(),
                predictions = merged.total_predictions(),
                "Merged prediction pools"
            );
            emit(&merged, output.as_deref())
        }

        ReportCommand::PerClass { results, output } => {
            let records = read_records(&results)?;
            let mut pools = ClassPredictions::default();
            for record in records {
                if let RunRecord::Prediction(p) = record {
                    if !p.prediction.is_empty() {
                        pools.insert(&p.ground_truth, &p.prediction);
                    }
                    for completion in p.completions.unwrap_or_default() {
                        pools.insert(&p.ground_truth, &completion);
                    }
                }
            }
            emit(&pools, output.as_deref())
        }
    }
}

/// Read run records from a JSONL stream or a JSON array file.
fn read_records(path: &Path) -> anyhow::Result<Vec<RunRecord>> {
    let content = std::fs::read_to_string(path)?;
    let trimmed = content.trim_start();

    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    let mut records = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(line)?);
    }
    Ok(records)
}

fn emit(pools: &ClassPredictions, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            write_json_file(path, pools)?;
            tracing::info!("Pools written to {:?}", path);
        }
        None => println!("{}", serde_json::to_string_pretty(pools)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linnea_core::types::PredictionRecord;

    fn prediction(index: usize, ground_truth: &str, prediction: &str) -> RunRecord {
        RunRecord::Prediction(PredictionRecord {
            index,
            prediction: prediction.to_string(),
            ground_truth: ground_truth.to_string(),
            correct: false,
            raw_output: None,
            completions: None,
            latency_ms: 10,
        })
    }

    #[test]
    fn test_read_records_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let lines = [
            serde_json::to_string(&prediction(0, "rose", "a red rose")).unwrap(),
            serde_json::to_string(&prediction(1, "lotus", "water lily")).unwrap(),
        ];
        std::fs::write(&path, lines.join("\n")).unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_records_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let records = vec![prediction(0, "rose", "a red rose")];
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let parsed = read_records(&path).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[tokio::test]
    async fn test_per_class_pools() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.jsonl");
        let lines = [
            serde_json::to_string(&prediction(0, "rose", "a red rose")).unwrap(),
            serde_json::to_string(&prediction(1, "rose", "a red rose")).unwrap(),
            serde_json::to_string(&prediction(2, "lotus", "water lily")).unwrap(),
        ];
        std::fs::write(&results, lines.join("\n")).unwrap();
        let output = dir.path().join("pools.json");

        execute(ReportArgs {
            command: ReportCommand::PerClass {
                results,
                output: Some(output.clone()),
            },
        })
        .await
        .unwrap();

        let pools: ClassPredictions =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(pools.0["rose"].len(), 1);
        assert_eq!(pools.total_predictions(), 2);
    }

    #[tokio::test]
    async fn test_merge_pools() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = ClassPredictions::default();
        a.insert("rose", "a red rose");
        let mut b = ClassPredictions::default();
        b.insert("rose", "garden rose");
        b.insert("lotus", "water lily");

        let path_a = dir.path().join("a.json");
        let path_b = dir.path().join("b.json");
        std::fs::write(&path_a, serde_json::to_string(&a).unwrap()).unwrap();
        std::fs::write(&path_b, serde_json::to_string(&b).unwrap()).unwrap();
        let output = dir.path().join("merged.json");

        execute(ReportArgs {
            command: ReportCommand::Merge {
                inputs: vec![path_a, path_b],
                output: Some(output.clone()),
            },
        })
        .await
        .unwrap();

        let merged: ClassPredictions =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(merged.0["rose"].len(), 2);
        assert_eq!(merged.total_predictions(), 3);
    }
}
