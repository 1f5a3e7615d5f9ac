//! Standalone `cq-tui` binary.
//!
//! Loads `.coveriq/config.toml` from the current directory and opens the TUI.

use anyhow::{Context, Result};
use cq_core::config::load_config;
use cq_tui::run_app;

#[tokio::main]
async fn main() -> Result<()> {
    let root = std::env::current_dir().context("failed to read current directory")?;
    let config = load_config(&root).await?;
    run_app(config).await
}
