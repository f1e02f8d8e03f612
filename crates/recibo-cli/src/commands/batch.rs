//! Batch command - register every receipt image under a directory or glob.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use recibo_core::{MatchedOn, ReceiptRegistrar, RegistrationError, SqliteIndex};

use super::{Context, load_config, open_registrar};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "tiff", "tif", "gif"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Directory or glob pattern
    #[arg(required = true)]
    input: String,

    /// Number of concurrent registrations
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Write a per-file CSV summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// Outcome of registering a single file.
enum Outcome {
    Registered { visual_fingerprint: String },
    Duplicate { matched_on: Option<MatchedOn>, existing: String },
    Failed(String),
}

struct FileResult {
    path: PathBuf,
    outcome: Outcome,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, ctx: Context<'_>) -> anyhow::Result<()> {
    let start = Instant::now();

    if args.jobs == 0 {
        anyhow::bail!("--jobs must be at least 1");
    }

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!("{} Found {} files to register", style("ℹ").blue(), files.len());

    let config = load_config(ctx.config_path)?;
    let (index, registrar) = open_registrar(&config, ctx.database).await?;
    let registrar = Arc::new(registrar);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs));
    let mut handles = Vec::with_capacity(files.len());

    for path in files {
        let semaphore = Arc::clone(&semaphore);
        let registrar = Arc::clone(&registrar);
        let pb = pb.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = register_file(path, &registrar).await;
            pb.inc(1);
            result
        }));
    }

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await?);
    }
    pb.finish_and_clear();

    index.close().await;

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    let registered = results.iter().filter(|r| matches!(r.outcome, Outcome::Registered { .. })).count();
    let duplicates = results.iter().filter(|r| matches!(r.outcome, Outcome::Duplicate { .. })).count();
    let failed: Vec<_> = results.iter().filter(|r| matches!(r.outcome, Outcome::Failed(_))).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} registered, {} duplicates, {} failed",
        style(registered).green(),
        style(duplicates).yellow(),
        style(failed.len()).red()
    );

    if duplicates > 0 {
        println!();
        println!("{}", style("Duplicates:").yellow());
        for result in &results {
            if let Outcome::Duplicate { existing, .. } = &result.outcome {
                println!("  - {} (already registered as {})", result.path.display(), existing);
            }
        }
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Outcome::Failed(message) = &result.outcome {
                println!("  - {}: {}", result.path.display(), message);
            }
        }
        anyhow::bail!("{} files could not be registered", failed.len());
    }

    Ok(())
}

/// Expand a directory or glob pattern to the image files it names, sorted.
fn collect_files(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let pattern = if Path::new(input).is_dir() {
        Path::new(input).join("*").to_string_lossy().into_owned()
    } else {
        input.to_string()
    };

    let mut files: Vec<PathBuf> = glob(&pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    files.sort();

    Ok(files)
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

async fn register_file(path: PathBuf, registrar: &ReceiptRegistrar<SqliteIndex>) -> FileResult {
    let file_start = Instant::now();

    let outcome = match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let filename = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();

            match registrar.register_receipt(&bytes, &filename).await {
                Ok(record) => Outcome::Registered {
                    visual_fingerprint: record.visual_fingerprint,
                },
                Err(RegistrationError::Duplicate { matched_on, existing }) => Outcome::Duplicate {
                    matched_on: Some(matched_on),
                    existing: existing.visual_fingerprint,
                },
                Err(RegistrationError::RaceDuplicate { visual_fingerprint }) => Outcome::Duplicate {
                    matched_on: None,
                    existing: visual_fingerprint,
                },
                Err(e) => {
                    warn!("Failed to register {}: {}", path.display(), e);
                    Outcome::Failed(e.to_string())
                }
            }
        }
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            Outcome::Failed(e.to_string())
        }
    };

    let processing_time_ms = file_start.elapsed().as_millis() as u64;
    debug!("{} done in {}ms", path.display(), processing_time_ms);

    FileResult {
        path,
        outcome,
        processing_time_ms,
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "visual_fingerprint",
        "matched_on",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.to_string_lossy();
        let time = result.processing_time_ms.to_string();

        match &result.outcome {
            Outcome::Registered { visual_fingerprint } => {
                wtr.write_record([&*filename, "registered", visual_fingerprint.as_str(), "", time.as_str(), ""])?;
            }
            Outcome::Duplicate { matched_on, existing } => {
                let matched_on = matched_on.map(|m| m.to_string()).unwrap_or_else(|| "race".to_string());
                wtr.write_record([&*filename, "duplicate", existing.as_str(), matched_on.as_str(), time.as_str(), ""])?;
            }
            Outcome::Failed(message) => {
                wtr.write_record([&*filename, "error", "", "", time.as_str(), message.as_str()])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
