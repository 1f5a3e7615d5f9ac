//! # cq-protocol
//!
//! Core protocol definitions and data models for the CoverIQ pipeline client.
//!
//! This crate defines all shared data structures used for:
//! - The five-stage pipeline and per-stage status
//! - Stage payloads and their typed preview views
//! - Configuration and persisted credentials
//! - Communication between a user interface and the core session loop
//!
//! ## Modules
//!
//! - [`stage_models`]: Stages, statuses and per-stage records
//! - [`payload_models`]: Cached stage results and typed views
//! - [`session_models`]: User input and pipeline snapshots
//! - [`artifact_models`]: Downloadable artifacts
//! - [`config_models`]: `config.toml` settings and credentials
//! - [`ipc`]: Operations and Events between UI and core
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: all types derive `TS` for web clients
//! - Independent compilation: no dependencies on other workspace crates

pub mod artifact_models;
pub mod config_models;
pub mod ipc;
pub mod payload_models;
pub mod session_models;
pub mod stage_models;

// Re-export all public types for convenience
pub use artifact_models::*;
pub use config_models::*;
pub use ipc::*;
pub use payload_models::*;
pub use session_models::*;
pub use stage_models::*;
