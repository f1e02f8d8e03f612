//! List command - show the newest registered receipts.

use clap::Args;
use console::style;

use recibo_core::DuplicateIndex;
use recibo_core::models::receipt::ReceiptRecord;

use super::{Context, OutputFormat, load_config, open_index};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Maximum number of records to show
    #[arg(short, long, default_value = "20")]
    limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: ListArgs, ctx: Context<'_>) -> anyhow::Result<()> {
    let config = load_config(ctx.config_path)?;
    let index = open_index(&config, ctx.database).await?;

    let records = index.list(args.limit).await?;
    let total = index.count().await?;
    index.close().await;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => print_table(&records, total),
    }

    Ok(())
}

fn print_table(records: &[ReceiptRecord], total: u64) {
    if records.is_empty() {
        println!("{} No receipts registered yet.", style("ℹ").blue());
        return;
    }

    println!(
        "{}",
        style(format!(
            "{:<16}  {:<19}  {:<12}  {:>12}  {:<10}  {}",
            "FINGERPRINT", "REGISTERED", "BANK", "AMOUNT", "DATE", "FILE"
        ))
        .bold()
    );

    for record in records {
        println!(
            "{:<16}  {:<19}  {:<12}  {:>12}  {:<10}  {}",
            record.visual_fingerprint,
            record.registered_at.format("%Y-%m-%d %H:%M:%S"),
            record.bank.as_deref().unwrap_or("-"),
            record.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string()),
            record.document_date.as_deref().unwrap_or("-"),
            record.source_filename,
        );
    }

    println!();
    println!("{}", style(format!("Showing {} of {} receipts", records.len(), total)).dim());
}
