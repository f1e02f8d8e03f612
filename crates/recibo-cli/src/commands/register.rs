//! Register command - submit one or more receipt images.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use recibo_core::models::receipt::ReceiptRecord;
use recibo_core::{RegistrationError, default_filename};

use super::{Context, OutputFormat, load_config, open_registrar};

/// Arguments for the register command.
#[derive(Args)]
pub struct RegisterArgs {
    /// Receipt image files; `-` reads one image from stdin
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Filename to record instead of the input's own name (single input only)
    #[arg(short, long)]
    name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: RegisterArgs, ctx: Context<'_>) -> anyhow::Result<()> {
    let start = Instant::now();

    if args.name.is_some() && args.inputs.len() > 1 {
        anyhow::bail!("--name can only be used with a single input");
    }

    let config = load_config(ctx.config_path)?;
    let (index, registrar) = open_registrar(&config, ctx.database).await?;

    let mut rejected = 0usize;
    for input in &args.inputs {
        let (bytes, filename) = match read_input(input, args.name.as_deref()) {
            Ok(read) => read,
            Err(e) => {
                eprintln!("{} {}: {}", style("✗").red(), input.display(), e);
                rejected += 1;
                continue;
            }
        };

        info!("Registering {} as {}", input.display(), filename);

        match registrar.register_receipt(&bytes, &filename).await {
            Ok(record) => println!("{}", format_record(&record, args.format)?),
            Err(e) => {
                report_rejection(&filename, &e);
                rejected += 1;
            }
        }
    }

    index.close().await;
    debug!("Total registration time: {:?}", start.elapsed());

    if rejected > 0 {
        anyhow::bail!("{} of {} receipts were not registered", rejected, args.inputs.len());
    }

    Ok(())
}

/// Read an input's bytes and pick the filename to record for it.
fn read_input(input: &Path, name: Option<&str>) -> anyhow::Result<(Vec<u8>, String)> {
    if input == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        let filename = name
            .map(str::to_string)
            .unwrap_or_else(|| default_filename(&chrono::Local::now()));
        return Ok((bytes, filename));
    }

    if !input.exists() {
        anyhow::bail!("Input file not found");
    }

    let bytes = std::fs::read(input)?;
    let filename = match name {
        Some(name) => name.to_string(),
        None => input
            .file_name()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| default_filename(&chrono::Local::now())),
    };
    Ok((bytes, filename))
}

/// Print a rejected submission to stderr.
pub fn report_rejection(filename: &str, error: &RegistrationError) {
    match error {
        RegistrationError::Duplicate {
            matched_on,
            existing,
        } => {
            eprintln!(
                "{} {}: {} (matched on {}, registered {} as {})",
                style("⚠").yellow(),
                filename,
                error.user_message(),
                matched_on,
                existing.registered_at.format("%Y-%m-%d %H:%M:%S"),
                existing.visual_fingerprint
            );
        }
        RegistrationError::RaceDuplicate { .. } => {
            eprintln!("{} {}: {}", style("⚠").yellow(), filename, error.user_message());
        }
        RegistrationError::Unexpected(_) | RegistrationError::Aborted(_) => {
            eprintln!("{} {}: {}", style("✗").red(), filename, error.user_message());
        }
        _ => {
            eprintln!("{} {}: {}", style("✗").red(), filename, error);
        }
    }
}

pub fn format_record(record: &ReceiptRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Text => Ok(format_record_text(record)),
    }
}

fn format_record_text(record: &ReceiptRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {}\n", style("Receipt").bold(), record.visual_fingerprint));
    output.push_str(&format!("  Registered:  {}\n", record.registered_at.format("%Y-%m-%d %H:%M:%S")));
    output.push_str(&format!("  File:        {}\n", record.source_filename));
    output.push_str(&format!("  Bank:        {}\n", record.bank.as_deref().unwrap_or("-")));
    output.push_str(&format!(
        "  Amount:      {}\n",
        record.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!("  Date:        {}\n", record.document_date.as_deref().unwrap_or("-")));
    output.push_str(&format!("  Reference:   {}\n", record.reference_code.as_deref().unwrap_or("-")));
    output.push_str(&format!("  Metadata:    {}", record.metadata_fingerprint));

    output
}
