//! Hash command - fingerprint a receipt without registering it.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use console::style;

use recibo_core::models::receipt::Analysis;
use recibo_core::{MemoryIndex, ReceiptRegistrar};

use super::{Context, OutputFormat, load_config};

/// Arguments for the hash command.
#[derive(Args)]
pub struct HashArgs {
    /// Receipt image file
    input: PathBuf,

    /// Filename to fingerprint instead of the input's own name
    #[arg(short, long)]
    name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: HashArgs, ctx: Context<'_>) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let config = load_config(ctx.config_path)?;
    let registrar = ReceiptRegistrar::from_config(Arc::new(MemoryIndex::new()), &config)?;

    let bytes = tokio::fs::read(&args.input).await?;
    let filename = match args.name {
        Some(name) => name,
        None => args
            .input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string(),
    };

    let analysis = registrar.fingerprint_only(&bytes, &filename)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => print_analysis(&analysis),
    }

    Ok(())
}

fn print_analysis(analysis: &Analysis) {
    println!("{} {}", style("Visual:  ").bold(), analysis.visual_fingerprint);
    println!("{} {}", style("Metadata:").bold(), analysis.metadata_fingerprint);
    println!("  File:       {}", analysis.source_filename);
    println!("  OCR chars:  {}", analysis.text_length);
    println!("  Bank:       {}", analysis.fields.bank.as_deref().unwrap_or("-"));
    println!(
        "  Amount:     {}",
        analysis.fields.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("  Date:       {}", analysis.fields.document_date.as_deref().unwrap_or("-"));
    println!("  Reference:  {}", analysis.fields.reference_code.as_deref().unwrap_or("-"));
}
