//! Shared types for the CEAPS expense pipeline.
//!
//! Holds the error taxonomy, record and aggregate models, the CEAPS column
//! schema, CLI settings and the resolved pipeline configuration, and the
//! boundary types for the external forecasting collaborator.

pub mod error;
pub mod models;
pub mod schema;
pub mod settings;

pub use error::{PipelineError, Result};
