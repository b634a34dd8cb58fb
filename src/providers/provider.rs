//! Dependency provider trait - common interface for all library sources.

use anyhow::Result;

use crate::core::{FrameworkName, LibraryRange, RuntimeLibrary};

/// A source of resolved libraries.
///
/// `get_description` returns `Ok(None)` when the provider does not own the
/// requested name so the chain can move on. Errors are reserved for real
/// I/O or parse failures.
pub trait DependencyProvider: Send + Sync {
    /// Get the provider name for display.
    fn name(&self) -> &str;

    /// Resolve one request, or decline.
    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> Result<Option<RuntimeLibrary>>;

    /// Receive the final flattened library set after the graph is resolved.
    fn initialize(
        &self,
        libraries: &[RuntimeLibrary],
        framework: &FrameworkName,
        runtime_identifier: Option<&str>,
    );

    /// Where this provider looked, as path templates containing `{name}`.
    fn attempted_paths(&self, framework: &FrameworkName) -> Vec<String>;
}
