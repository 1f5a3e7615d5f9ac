//! Backend service abstraction.
//!
//! This module provides the `StageService` trait (Adapter Pattern) that the
//! coordinator and stage runners call, and `HttpStageService`, the reqwest
//! implementation talking to the CoverIQ backend.

pub mod base;
pub mod http;

pub use base::{ServiceError, ServiceResult, SpecFile, StageService};
pub use http::HttpStageService;
