//! Show command - print a single registered receipt.

use clap::Args;

use recibo_core::{DuplicateIndex, VisualFingerprint};

use super::register::format_record;
use super::{Context, OutputFormat, load_config, open_index};

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Visual fingerprint (16 hex characters)
    fingerprint: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub async fn run(args: ShowArgs, ctx: Context<'_>) -> anyhow::Result<()> {
    let fingerprint = VisualFingerprint::from_hex(&args.fingerprint)
        .ok_or_else(|| anyhow::anyhow!("Not a visual fingerprint: {}", args.fingerprint))?;

    let config = load_config(ctx.config_path)?;
    let index = open_index(&config, ctx.database).await?;
    let record = index.get(&fingerprint.to_hex()).await;
    index.close().await;

    match record? {
        Some(record) => {
            println!("{}", format_record(&record, args.format)?);
            Ok(())
        }
        None => anyhow::bail!("No receipt registered with fingerprint {}", fingerprint),
    }
}
