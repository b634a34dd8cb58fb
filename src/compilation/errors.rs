//! Export and compilation errors.

use thiserror::Error;

use crate::core::ProjectError;

/// Failures while exporting a library.
///
/// Declines and resolver misses are not errors; they surface as `Ok(None)`.
/// Everything here aborts the export that hit it.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("library `{library}` ({kind}) has no path")]
    MissingPath { library: String, kind: String },

    #[error("cannot export `{library}`: no {capability} configured")]
    NotConfigured {
        capability: &'static str,
        library: String,
    },

    #[error("compilation of `{name}` was cancelled")]
    Cancelled { name: String },

    #[error("project `{name}` could not be found")]
    ProjectNotFound { name: String },

    #[error("package `{name}` has no resolved version")]
    MissingVersion { name: String },

    #[error("package `{name}` v{version} is no longer installed")]
    PackageNotInstalled { name: String, version: String },

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl ExportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExportError::Cancelled { .. })
    }
}
