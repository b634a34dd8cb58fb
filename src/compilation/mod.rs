//! Exports and compilation.
//!
//! The exporter turns resolved libraries into metadata and source
//! references. Project libraries are compiled through a
//! [`CompilationEngine`]; results are memoized in the [`CompilationCache`].

pub mod cache;
pub mod engine;
pub mod errors;
pub mod exporter;
pub mod fingerprint;

pub use cache::{CacheKey, CompilationCache};
pub use engine::{
    CancellationToken, CompilationEngine, CompiledUnit, InputChangedCallback, ProjectSourceEngine,
};
pub use errors::ExportError;
pub use exporter::LibraryExporter;
pub use fingerprint::SourceFingerprint;
