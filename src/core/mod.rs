//! Core data structures.
//!
//! This module contains the value types shared by providers and exporters:
//! - Library ranges, identities and resolved libraries
//! - Target frameworks and version ranges
//! - Project definitions
//! - Compilation targets and exports

pub mod export;
pub mod framework;
pub mod library;
pub mod project;
pub mod target;
pub mod version;

pub use export::{LibraryExport, MetadataReference, SourceReference};
pub use framework::FrameworkName;
pub use library::{
    LibraryDependency, LibraryIdentity, LibraryInfo, LibraryKind, LibraryRange, LibraryRangeError,
    RuntimeLibrary,
};
pub use project::{Project, ProjectError, TargetFrameworkInfo};
pub use target::CompilationTarget;
pub use version::VersionRange;
