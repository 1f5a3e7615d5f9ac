//! `coveriq` command-line entry point.
//!
//! Without a subcommand the interactive TUI is launched. Subcommands run
//! the same core headless and print progress to the terminal.

mod headless;
mod logging;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use cq_core::config::{load_config, AppConfig, CONFIG_DIR};
use cq_protocol::ArtifactKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coveriq", version, about = "AI-assisted QA pipeline client")]
struct Cli {
    /// Backend base URL (overrides config and COVERIQ_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Per-stage timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run all five stages and save the resulting artifacts
    Run {
        /// Figma design URL
        #[arg(long)]
        url: String,

        /// Optional feature description
        #[arg(long, default_value = "")]
        description: String,

        /// Directory to write artifacts to
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Download the backend's latest artifact
    Download {
        /// design, feature, plan, plan-md, cases, cases-md, features or code
        artifact: ArtifactKind,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Save API credentials locally and on the backend
    Keys {
        #[arg(long)]
        figma_token: String,

        #[arg(long)]
        gemini_key: String,
    },

    /// Upload feature files, generate E2E test code and download it
    Automate {
        /// Gherkin .feature files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(url) = &self.backend_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(eyre!("--backend-url must be an http(s) URL, got '{url}'"));
            }
            config.global.backend_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err(eyre!("--timeout must be greater than zero"));
            }
            config.global.request_timeout_secs = timeout;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let root = std::env::current_dir().wrap_err("failed to read current directory")?;
    let mut config = load_config(&root).await?;
    cli.apply(&mut config)?;

    let Some(command) = cli.command else {
        logging::init_file(&root.join(CONFIG_DIR).join("coveriq.log"))?;
        // When `coveriq` is called without any arguments, launch the TUI
        return cq_tui::run_app(config).await.map_err(|e| eyre!(e));
    };

    logging::init_stderr();
    match command {
        Command::Run {
            url,
            description,
            out,
        } => {
            let out = out.unwrap_or_else(|| config.global.download_dir.clone());
            headless::run_pipeline(config, url, description, &out).await
        }
        Command::Download { artifact, out } => {
            let out = out.unwrap_or_else(|| config.global.download_dir.clone());
            headless::download(config, artifact, &out).await
        }
        Command::Keys {
            figma_token,
            gemini_key,
        } => headless::save_keys(config, figma_token, gemini_key).await,
        Command::Automate { files, out } => {
            let out = out.unwrap_or_else(|| config.global.download_dir.clone());
            headless::automate(config, &files, &out).await
        }
    }
}
