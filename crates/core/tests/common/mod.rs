//! Shared helpers for cq-core integration tests.
//!
//! - Fixtures: sample backend documents and configs
//! - Assertions: helpers over collected events
//! - Mock services: a deterministic in-memory `StageService`

pub mod assertions;
pub mod fixtures;
pub mod mock_services;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_services::*;
