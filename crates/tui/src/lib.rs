//! # cq-tui
//!
//! Terminal user interface for the CoverIQ pipeline.
//!
//! The TUI talks to a `cq-core` [`Session`] over channels using the `Op`
//! and `Event` protocol from `cq-protocol`. It keeps no pipeline state of
//! its own beyond the last snapshot it was sent.

pub mod app;
pub mod event;
pub mod event_handler;
pub mod tui;
pub mod widgets;

pub use app::App;
pub use tui::Tui;

use anyhow::{Context, Result};
use cq_core::config::{AppConfig, CredentialStore};
use cq_core::service::HttpStageService;
use cq_core::session::Session;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Start a session against the configured backend and run the TUI until
/// the user quits.
pub async fn run_app(config: AppConfig) -> Result<()> {
    let service = HttpStageService::new(config.global.backend_url.clone())
        .context("failed to create backend client")?;
    let store = CredentialStore::default_location();

    let (events_tx, events_rx) = Session::channel();
    let (op_tx, op_rx) = mpsc::unbounded_channel();
    let session = Session::new(config, Arc::new(service), store, events_tx);
    let session_task = tokio::spawn(session.run(op_rx));

    let mut tui = Tui::init()?;
    let mut app = App::new(op_tx, events_rx);
    let result = app.run(&mut tui).await;
    tui.restore()?;

    drop(app);
    let _ = session_task.await;
    result
}
