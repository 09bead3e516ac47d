//! Batch processing command for multiple document images.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use docroi_core::{
    create_recognizer, load_components, DocumentType, ExtractedRecord, Side,
    StructuredExtractor, Subtype,
};

use super::extract::{format_record, OutputFormat};
use super::load_config;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Document type (id-card, report)
    #[arg(short = 't', long)]
    doc_type: DocumentType,

    /// Layout subtype (TYPE_1, TYPE_2, TYPE_3)
    #[arg(short, long, default_value = "TYPE_1")]
    subtype: Subtype,

    /// Card side shown in every input image (ID cards only)
    #[arg(long)]
    side: Option<Side>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Give up on a document after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    record: Option<ExtractedRecord>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let (registry, validator) = load_components(&config)?;

    // Every file shares one template; reject a bad key up front
    registry.lookup(args.doc_type, args.subtype, args.side)?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(
                ext.to_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp"
            )
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let recognizer = create_recognizer(&config)?;

    let extractor = Arc::new(StructuredExtractor::new(registry, validator, recognizer));

    // Create output directory if specified
    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let timeout = args.timeout.map(Duration::from_secs);

    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            let semaphore = Arc::clone(&semaphore);
            let (doc_type, subtype, side) = (args.doc_type, args.subtype, args.side);

            tokio::spawn(async move {
                let permit = semaphore.acquire_owned().await;
                let file_start = Instant::now();

                let worker_path = path.clone();
                let work = tokio::task::spawn_blocking(move || {
                    // Held by the OCR work itself so a timed-out document still
                    // occupies its job slot until the engine returns
                    let _permit = permit;
                    let image = image::open(&worker_path)?;
                    let record = extractor.extract(&image, doc_type, subtype, side)?;
                    anyhow::Ok(record)
                });

                let outcome = match timeout {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(joined) => flatten(joined),
                        // The blocking OCR call cannot be interrupted; it finishes in the
                        // background and its result is discarded
                        Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
                    },
                    None => flatten(work.await),
                };

                let processing_time_ms = file_start.elapsed().as_millis() as u64;
                match outcome {
                    Ok(record) => FileResult {
                        path,
                        record: Some(record),
                        error: None,
                        processing_time_ms,
                    },
                    Err(error) => FileResult {
                        path,
                        record: None,
                        error: Some(error),
                        processing_time_ms,
                    },
                }
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let result = handle.await?;

        if let Some(ref error_msg) = result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                overall_pb.abandon();
                anyhow::bail!("Processing failed: {}", error_msg);
            }
        }

        overall_pb.inc(1);
        results.push(result);
    }

    overall_pb.finish_with_message("Complete");

    // Write outputs
    if let Some(ref output_dir) = args.output_dir {
        for result in &results {
            if let Some(ref record) = result.record {
                let output_path = output_path_for(output_dir, &result.path, args.format);
                fs::write(&output_path, format_record(record, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    if failed > 0 {
        println!("{} {} files failed", style("✗").red(), failed);
    }

    Ok(())
}

fn flatten(
    joined: Result<anyhow::Result<ExtractedRecord>, tokio::task::JoinError>,
) -> Result<ExtractedRecord, String> {
    match joined {
        Ok(Ok(record)) => Ok(record),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("worker failed: {}", e)),
    }
}

fn output_path_for(output_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let output_name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    output_dir.join(format!("{}.{}", output_name, format.extension()))
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "field_count",
        "fields",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.record {
            Some(record) => wtr.write_record([
                filename,
                "success",
                &record.len().to_string(),
                &record.field_names().collect::<Vec<_>>().join(";"),
                &result.processing_time_ms.to_string(),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "error",
                "0",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
