//! Dependency providers.
//!
//! Providers turn a requested library range into a resolved library, or
//! decline so the next provider in the chain can try.

pub mod chain;
pub mod package;
pub mod project;
pub mod provider;
pub mod reference;
pub mod unresolved;

pub use chain::{ProviderChain, ProviderChainBuilder};
pub use package::{PackageFolder, PackageInfo, PackageProvider, PackageStore};
pub use project::{FileSystemProjectResolver, ProjectReferenceProvider, ProjectResolver};
pub use provider::DependencyProvider;
pub use reference::{
    FrameworkReferenceResolver, GacFallbackResolver, ReferenceAssemblyFolder,
    ReferenceAssemblyProvider, ResolvedAssembly,
};
pub use unresolved::UnresolvedProvider;
