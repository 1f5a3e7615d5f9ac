//! # cq-core
//!
//! Pipeline state coordination and backend access for the CoverIQ client.
//!
//! This crate provides:
//! - The five-stage pipeline state machine and its async coordinator
//! - The backend service trait and its HTTP implementation
//! - Stage runners that re-fetch upstream data before generating
//! - Artifact downloads and the E2E automation flow
//! - Configuration and credential loading from disk
//!
//! ## Modules
//!
//! - [`coordinator`]: Pipeline state and the `Coordinator`
//! - [`service`]: `StageService` trait and `HttpStageService`
//! - [`engine`]: Per-stage request sequences
//! - [`artifacts`]: Artifact downloads
//! - [`automation`]: Feature-file upload and test code generation
//! - [`config`]: `.coveriq/config.toml` and the credential store
//! - [`session`]: Op/Event loop shared by the UIs
//! - [`validation`]: Input checks made before any request

pub mod artifacts;
pub mod automation;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod service;
pub mod session;
pub mod validation;
