//! Headless subcommands.
//!
//! These drive the same coordinator and automation flow as the TUI, printing
//! progress instead of rendering it.

use color_eyre::eyre::{eyre, Result, WrapErr};
use colored::Colorize;
use cq_core::artifacts::{self, fetch_artifact, save_artifact};
use cq_core::automation::E2eAutomation;
use cq_core::config::{AppConfig, CredentialStore};
use cq_core::coordinator::Coordinator;
use cq_core::service::{HttpStageService, StageService};
use cq_core::session::{save_credentials, Session};
use cq_protocol::{ArtifactKind, Credentials, Event, Stage, StageStatus, UserInput};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

fn connect(config: &AppConfig) -> Result<Arc<dyn StageService>> {
    let service = HttpStageService::new(config.global.backend_url.clone())
        .wrap_err("failed to create backend client")?;
    info!(backend = %service.base_url(), "using backend");
    Ok(Arc::new(service))
}

/// Print stage progress until every sender is dropped.
///
/// Rejections are not printed; they come back as the command's error.
fn spawn_progress_printer(mut events_rx: mpsc::Receiver<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                Event::StageStatusUpdate {
                    stage,
                    status: StageStatus::InProgress,
                } => println!("{} {stage}...", "▶".cyan()),
                Event::StageCompleted { stage, .. } => println!("{} {stage}", "✓".green()),
                Event::StageFailed { stage, error } => {
                    println!("{} {stage}: {}", "✗".red(), error.red())
                }
                _ => {}
            }
        }
    })
}

fn print_saved(artifact: ArtifactKind, path: &Path) {
    println!(
        "{} saved {} to {}",
        "✓".green(),
        artifact.to_string().bold(),
        path.display()
    );
}

/// Run every stage in order, then save the pipeline artifacts to `out`.
pub async fn run_pipeline(
    config: AppConfig,
    url: String,
    description: String,
    out: &Path,
) -> Result<()> {
    let service = connect(&config)?;
    let (events_tx, events_rx) = Session::channel();
    let printer = spawn_progress_printer(events_rx);

    let coordinator = Coordinator::with_input(
        service,
        events_tx,
        config.request_timeout(),
        UserInput {
            design_url: url,
            feature_description: description,
        },
    );

    let result = run_all_stages(&coordinator, out).await;
    drop(coordinator);
    let _ = printer.await;
    result
}

async fn run_all_stages(coordinator: &Coordinator, out: &Path) -> Result<()> {
    for stage in Stage::ALL {
        let record = coordinator.run_stage(stage).await?;
        if record.status != StageStatus::Ready {
            let error = record.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(eyre!("{stage} failed: {error}"));
        }
    }

    for artifact in ArtifactKind::ALL {
        if artifact == ArtifactKind::CodeArchive {
            continue;
        }
        match fetch_artifact(coordinator, artifact).await {
            Ok(fetched) => {
                let path = save_artifact(&fetched, out).await?;
                print_saved(artifact, &path);
            }
            // Only the feature archive is required.
            Err(e) if artifact != ArtifactKind::FeatureArchive => {
                warn!(%artifact, error = %e, "skipping artifact");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Download the backend's latest copy of `artifact`.
///
/// A fresh process has no session state, so no gate applies here.
pub async fn download(config: AppConfig, artifact: ArtifactKind, out: &Path) -> Result<()> {
    let service = connect(&config)?;
    let fetched = artifacts::download(service.as_ref(), artifact, artifact.file_name(None)).await?;
    let path = save_artifact(&fetched, out).await?;
    print_saved(artifact, &path);
    Ok(())
}

pub async fn save_keys(config: AppConfig, figma_token: String, gemini_key: String) -> Result<()> {
    let service = connect(&config)?;
    let store = CredentialStore::default_location();
    let credentials = Credentials {
        design_token: figma_token,
        llm_key: gemini_key,
    };

    save_credentials(service.as_ref(), store.as_ref(), &credentials).await?;
    println!("{} API keys saved successfully!", "✓".green());
    if let Some(store) = store {
        println!("  stored in {}", store.path().display());
    }
    Ok(())
}

/// Upload feature files, generate E2E code and save the archive to `out`.
pub async fn automate(config: AppConfig, files: &[PathBuf], out: &Path) -> Result<()> {
    if !config.credentials.is_complete() {
        warn!("API keys are incomplete; run `coveriq keys` if generation is rejected");
    }
    let service = connect(&config)?;
    let mut automation = E2eAutomation::new(service);

    let message = automation.upload(files).await?;
    println!("{} {message}", "✓".green());

    println!("{} Generating E2E test code...", "▶".cyan());
    automation.generate(&config.credentials.llm_key).await?;

    let archive = automation.download().await?;
    let path = save_artifact(&archive, out).await?;
    print_saved(ArtifactKind::CodeArchive, &path);
    Ok(())
}
