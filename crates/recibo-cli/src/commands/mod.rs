//! Subcommands and the state they share.

pub mod batch;
pub mod config;
pub mod hash;
pub mod list;
pub mod register;
pub mod show;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use recibo_core::models::config::ReciboConfig;
use recibo_core::{ReceiptRegistrar, SqliteIndex};

/// Output format for records.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    #[default]
    Json,
    /// Plain text summary
    Text,
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recibo")
        .join("config.json")
}

/// Load configuration from `--config`, else the default path, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ReciboConfig> {
    if let Some(path) = config_path {
        return Ok(ReciboConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(ReciboConfig::from_file(&default_path)?)
    } else {
        Ok(ReciboConfig::default())
    }
}

/// Open the duplicate index, honoring a `--database` override.
pub async fn open_index(config: &ReciboConfig, database: Option<&str>) -> anyhow::Result<SqliteIndex> {
    let url = database.unwrap_or(&config.store.database_url);
    let index = SqliteIndex::open(url, config.store.max_connections).await?;
    Ok(index)
}

/// Open the duplicate index and build a registrar over it. The index is
/// closed again if the registrar cannot be built.
pub async fn open_registrar(
    config: &ReciboConfig,
    database: Option<&str>,
) -> anyhow::Result<(Arc<SqliteIndex>, ReceiptRegistrar<SqliteIndex>)> {
    let index = Arc::new(open_index(config, database).await?);
    match ReceiptRegistrar::from_config(Arc::clone(&index), config) {
        Ok(registrar) => Ok((index, registrar)),
        Err(e) => {
            index.close().await;
            Err(e.into())
        }
    }
}

/// Global options every subcommand receives.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub config_path: Option<&'a str>,
    pub database: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use recibo_core::DuplicateIndex;

    #[tokio::test]
    async fn test_invalid_rules_close_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("recibo.db").display());

        let mut config = ReciboConfig::default();
        config.extraction.banks.clear();

        let err = open_registrar(&config, Some(&url)).await.err().unwrap();
        assert!(err.to_string().contains("bank list is empty"));

        let index = open_index(&ReciboConfig::default(), Some(&url)).await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        index.close().await;
    }

    #[tokio::test]
    async fn test_open_registrar_shares_the_index() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("recibo.db").display());

        let (index, registrar) = open_registrar(&ReciboConfig::default(), Some(&url)).await.unwrap();
        assert!(Arc::ptr_eq(&index, registrar.index()));
        index.close().await;
    }
}
