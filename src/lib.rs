//! Quay - multi-source library resolution and export for managed projects
//!
//! This crate resolves a project's dependency closure across local
//! projects, installed packages, framework reference assemblies and the
//! global assembly cache, and turns each resolved library into the
//! metadata and source references a compiler consumes.

pub mod compilation;
pub mod core;
pub mod ops;
pub mod providers;
pub mod resolver;
pub mod util;

pub use compilation::{CompilationCache, LibraryExporter};
pub use core::{
    CompilationTarget, FrameworkName, LibraryExport, LibraryIdentity, LibraryKind, LibraryRange,
    RuntimeLibrary,
};
pub use providers::{DependencyProvider, ProviderChain};
pub use resolver::{LibraryGraph, LibraryManager};
pub use util::context::GlobalContext;
