//! The `linnea eval` command: run a model over a dataset and score it.

use super::datasets::DatasetSelector;
use clap::{Args, ValueEnum};
use linnea_core::eval::{extract_answer, matches_label, sample_indices, PromptStyle};
use linnea_core::llm::{generate_with_retry, LlmProvider, LlmProviderFactory};
use linnea_core::output::{write_json_file, OutputFormat as CoreOutputFormat, OutputWriter};
use linnea_core::types::{ClassPredictions, EvalSummary, PredictionRecord, RunRecord};
use linnea_core::{Config, Dataset, ImageInput, LlmRequest};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the `eval` command.
#[derive(Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub selector: DatasetSelector,

    /// Model provider
    #[arg(long, value_enum, default_value = "ollama")]
    pub provider: Provider,

    /// Model name (provider-specific)
    #[arg(long)]
    pub model: Option<String>,

    /// Prompt style
    #[arg(long, value_enum, default_value = "closed")]
    pub prompt: Prompt,

    /// Evaluate a random subset of this many samples
    #[arg(long)]
    pub limit: Option<usize>,

    /// Seed for subset sampling
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Sample this many completions per image and pool them per class
    #[arg(long)]
    pub completions: Option<u32>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    pub format: OutputFormat,

    /// Write per-class prediction pools to this JSON file
    #[arg(long)]
    pub class_output: Option<PathBuf>,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

/// Supported model providers.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Provider {
    /// Local Ollama instance
    Ollama,
    /// OpenAI API
    Openai,
    /// Anthropic API
    Anthropic,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::Openai => write!(f, "openai"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Prompt style flag, mirrors `PromptStyle` for clap.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Prompt {
    /// Pick from the dataset's class list
    Closed,
    /// Answer freely with the most specific label
    Open,
    /// Step-by-step reasoning with an <answer> tag
    Reasoning,
}

impl From<Prompt> for PromptStyle {
    fn from(p: Prompt) -> Self {
        match p {
            Prompt::Closed => PromptStyle::Closed,
            Prompt::Open => PromptStyle::Open,
            Prompt::Reasoning => PromptStyle::Reasoning,
        }
    }
}

/// Execute the eval command.
pub async fn execute(args: EvalArgs) -> anyhow::Result<()> {
    let config = Config::load()?;

    let dataset = args.selector.open(&config)?;
    if dataset.is_empty() {
        anyhow::bail!("Dataset {} holds no samples", dataset.name());
    }

    let provider = LlmProviderFactory::create(
        &args.provider.to_string(),
        &config.llm,
        args.model.as_deref(),
        config.eval.llm_timeout_ms,
    )?;
    if !provider.is_available().await {
        anyhow::bail!(
            "Provider {} is not available. Check its endpoint and credentials.",
            provider.name()
        );
    }

    let style: PromptStyle = args.prompt.into();
    let prompt_text = style.build(dataset.classes());

    let indices = match args.limit {
        Some(n) => sample_indices(dataset.len(), n, args.seed),
        None => (0..dataset.len()).collect(),
    };
    tracing::info!(
        dataset = dataset.name(),
        provider = provider.name(),
        prompt = %style,
        samples = indices.len(),
        "Starting evaluation"
    );

    run_eval(&args, &config, dataset.as_ref(), provider.as_ref(), style, &prompt_text, &indices)
        .await
}

/// The sequential evaluation loop.
#[allow(clippy::too_many_arguments)]
async fn run_eval(
    args: &EvalArgs,
    config: &Config,
    dataset: &dyn Dataset,
    provider: &dyn LlmProvider,
    style: PromptStyle,
    prompt_text: &str,
    indices: &[usize],
) -> anyhow::Result<()> {
    let format = match args.format {
        OutputFormat::Json => CoreOutputFormat::Json,
        OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
    };

    // JSONL streams as records arrive; JSON collects for the array wrapper.
    let stream = matches!(format, CoreOutputFormat::JsonLines);
    let mut file_writer = match &args.output {
        Some(path) if stream => {
            let file = File::create(path)?;
            Some(OutputWriter::new(BufWriter::new(file), format, false))
        }
        _ => None,
    };
    let mut collected: Vec<RunRecord> = Vec::new();

    let mut pools = ClassPredictions::for_classes(dataset.classes().iter().map(String::as_str));
    let mut summary = EvalSummary {
        dataset: dataset.name().to_string(),
        model: args
            .model
            .clone()
            .unwrap_or_else(|| provider.name().to_string()),
        prompt_style: style.as_str().to_string(),
        total: 0,
        correct: 0,
        invalid: 0,
        failed: 0,
        accuracy: 0.0,
        elapsed_seconds: 0.0,
    };

    let progress = create_progress_bar(indices.len() as u64);
    let start = Instant::now();

    for &index in indices {
        let sample = dataset.sample(index)?;
        let ground_truth = dataset
            .class_name(sample.class_index)
            .unwrap_or("<unknown>")
            .to_string();

        let image = match ImageInput::from_path(&sample.path) {
            Ok(image) => image,
            Err(e) => {
                summary.failed += 1;
                tracing::error!("Failed to read image {:?}: {e}", sample.path);
                progress.inc(1);
                continue;
            }
        };
        let request = LlmRequest::new(
            image,
            prompt_text.to_string(),
            config.eval.max_tokens,
            config.eval.temperature,
        );

        let record = match args.completions {
            Some(n) => collect_completions(provider, &request, n, index, &ground_truth).await,
            None => {
                score_single(provider, config, &request, style, index, &ground_truth).await
            }
        };

        match record {
            Ok(mut record) => {
                if record.prediction.is_empty() && style.needs_extraction() {
                    summary.invalid += 1;
                }
                record.correct = matches_label(&record.prediction, &ground_truth);
                if record.correct {
                    summary.correct += 1;
                }
                summary.total += 1;

                if !record.prediction.is_empty() {
                    pools.insert(&ground_truth, &record.prediction);
                }
                if let Some(completions) = &record.completions {
                    for completion in completions {
                        pools.insert(&ground_truth, completion);
                    }
                }

                emit(&record, stream, &mut file_writer, &mut collected)?;
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(index, "Model call failed: {e}");
            }
        }

        progress.inc(1);
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let rate = (summary.total + summary.failed) as f64 / elapsed;
            progress.set_message(format!("{rate:.2} img/sec"));
        }
    }

    summary.finalize(start.elapsed().as_secs_f64());
    progress.finish_and_clear();

    // Emit the summary record on the same channel as the predictions.
    let summary_record = RunRecord::Summary(summary.clone());
    if stream {
        match &mut file_writer {
            Some(writer) => {
                writer.write(&summary_record)?;
                writer.flush()?;
            }
            None => println!("{}", serde_json::to_string(&summary_record)?),
        }
    } else {
        collected.push(summary_record);
        match &args.output {
            Some(path) => {
                let file = File::create(path)?;
                let mut writer = OutputWriter::new(BufWriter::new(file), format, false);
                writer.write_all(&collected)?;
                writer.flush()?;
            }
            None => println!("{}", serde_json::to_string_pretty(&collected)?),
        }
    }
    if let Some(path) = &args.output {
        tracing::info!("Results written to {:?}", path);
    }

    if let Some(path) = &args.class_output {
        write_json_file(path, &pools)?;
        tracing::info!(
            "Per-class pools ({} predictions) written to {:?}",
            pools.total_predictions(),
            path
        );
    }

    print_summary(&summary);
    Ok(())
}

/// One model call with retries, scored against the ground truth.
async fn score_single(
    provider: &dyn LlmProvider,
    config: &Config,
    request: &LlmRequest,
    style: PromptStyle,
    index: usize,
    ground_truth: &str,
) -> Result<PredictionRecord, linnea_core::EvalError> {
    let response = generate_with_retry(
        provider,
        request,
        config.eval.retry_attempts,
        config.eval.retry_delay_ms,
    )
    .await?;

    let (prediction, raw_output) = if style.needs_extraction() {
        match extract_answer(&response.text) {
            Some(answer) => (answer, Some(response.text.clone())),
            None => (String::new(), Some(response.text.clone())),
        }
    } else {
        (response.text.clone(), None)
    };

    Ok(PredictionRecord {
        index,
        prediction,
        ground_truth: ground_truth.to_string(),
        correct: false, // scored by the caller
        raw_output,
        completions: None,
        latency_ms: response.latency_ms,
    })
}

/// Label collection mode: sample `n` completions and keep them all.
async fn collect_completions(
    provider: &dyn LlmProvider,
    request: &LlmRequest,
    n: u32,
    index: usize,
    ground_truth: &str,
) -> Result<PredictionRecord, linnea_core::EvalError> {
    let start = Instant::now();
    let completions = provider.generate_many(request, n).await?;
    let prediction = completions.first().cloned().unwrap_or_default();

    Ok(PredictionRecord {
        index,
        prediction,
        ground_truth: ground_truth.to_string(),
        correct: false, // scored by the caller
        raw_output: None,
        completions: Some(completions),
        latency_ms: start.elapsed().as_millis() as u64,
    })
}

/// Write or buffer one prediction record.
fn emit(
    record: &PredictionRecord,
    stream: bool,
    file_writer: &mut Option<OutputWriter<BufWriter<File>>>,
    collected: &mut Vec<RunRecord>,
) -> anyhow::Result<()> {
    let record = RunRecord::Prediction(record.clone());
    if stream {
        match file_writer {
            Some(writer) => writer.write(&record)?,
            None => println!("{}", serde_json::to_string(&record)?),
        }
    } else {
        // JSON needs the whole array; written after the loop
        collected.push(record);
    }
    Ok(())
}

/// Create a progress bar for the evaluation loop.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(summary: &EvalSummary) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Dataset:      {:>12}", summary.dataset);
    eprintln!("    Prompt:       {:>12}", summary.prompt_style);
    eprintln!("    Evaluated:    {:>12}", summary.total);
    eprintln!("    Correct:      {:>12}", summary.correct);
    if summary.invalid > 0 {
        eprintln!("    Invalid:      {:>12}", summary.invalid);
    }
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>12}", summary.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Accuracy:     {:>11.1}%", summary.accuracy * 100.0);
    eprintln!("    Duration:     {:>11.1}s", summary.elapsed_seconds);
    eprintln!("  ====================================");
}
