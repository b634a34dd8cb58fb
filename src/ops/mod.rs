//! High-level operations.
//!
//! This module contains the implementation of Quay commands.

pub mod export;
pub mod resolve;
pub mod validate;

pub use export::{export, ExportOptions};
pub use resolve::{default_search_paths, ResolveContext, ResolveOptions};
pub use validate::{first_not_found, validate};
