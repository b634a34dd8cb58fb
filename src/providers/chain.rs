//! Provider chain - ordered resolution across all providers.
//!
//! Providers are consulted in a fixed precedence order:
//!
//! 1. project references
//! 2. packages
//! 3. framework / global assembly cache references
//! 4. unresolved placeholder
//!
//! The first provider that does not decline wins. The unresolved provider
//! always answers, so resolution is total.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::{FrameworkName, LibraryRange, RuntimeLibrary};
use crate::providers::{DependencyProvider, UnresolvedProvider};

/// Ordered set of dependency providers.
pub struct ProviderChain {
    providers: Vec<Arc<dyn DependencyProvider>>,
    fallback: UnresolvedProvider,
}

impl ProviderChain {
    pub fn builder() -> ProviderChainBuilder {
        ProviderChainBuilder::default()
    }

    /// Resolve a request. Never declines; unknown names become
    /// `Unresolved` libraries.
    pub fn resolve(&self, range: &LibraryRange, framework: &FrameworkName) -> Result<RuntimeLibrary> {
        for provider in &self.providers {
            let description = provider
                .get_description(range, framework)
                .with_context(|| format!("{} provider failed to resolve `{}`", provider.name(), range))?;

            if let Some(library) = description {
                tracing::debug!("`{}` resolved by the {} provider", range, provider.name());
                return Ok(library);
            }
        }

        tracing::debug!("`{}` is unresolved", range);
        Ok(self.fallback.describe(range))
    }

    /// Hand the final library set to every provider.
    pub fn initialize(
        &self,
        libraries: &[RuntimeLibrary],
        framework: &FrameworkName,
        runtime_identifier: Option<&str>,
    ) {
        for provider in self.providers() {
            provider.initialize(libraries, framework, runtime_identifier);
        }
    }

    /// Every location searched, in precedence order.
    pub fn attempted_paths(&self, framework: &FrameworkName) -> Vec<String> {
        self.providers()
            .flat_map(|provider| provider.attempted_paths(framework))
            .collect()
    }

    /// Providers in precedence order, the unresolved fallback last.
    pub fn providers(&self) -> impl Iterator<Item = &dyn DependencyProvider> {
        self.providers
            .iter()
            .map(|p| p.as_ref())
            .chain(std::iter::once(&self.fallback as &dyn DependencyProvider))
    }
}

/// Builds a [`ProviderChain`]. Registration order does not matter; the
/// precedence is fixed.
#[derive(Default)]
pub struct ProviderChainBuilder {
    project: Option<Arc<dyn DependencyProvider>>,
    package: Option<Arc<dyn DependencyProvider>>,
    reference: Option<Arc<dyn DependencyProvider>>,
}

impl ProviderChainBuilder {
    pub fn project(mut self, provider: Arc<dyn DependencyProvider>) -> Self {
        self.project = Some(provider);
        self
    }

    pub fn package(mut self, provider: Arc<dyn DependencyProvider>) -> Self {
        self.package = Some(provider);
        self
    }

    pub fn reference(mut self, provider: Arc<dyn DependencyProvider>) -> Self {
        self.reference = Some(provider);
        self
    }

    pub fn build(self) -> ProviderChain {
        ProviderChain {
            providers: [self.project, self.package, self.reference]
                .into_iter()
                .flatten()
                .collect(),
            fallback: UnresolvedProvider::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LibraryIdentity, LibraryKind, VersionRange};

    /// Answers every non-platform request with a fixed kind.
    struct Fixed {
        name: &'static str,
        kind: LibraryKind,
        owns: fn(&LibraryRange) -> bool,
    }

    impl DependencyProvider for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn get_description(
            &self,
            range: &LibraryRange,
            _framework: &FrameworkName,
        ) -> Result<Option<RuntimeLibrary>> {
            Ok((self.owns)(range).then(|| {
                RuntimeLibrary::new(
                    range.clone(),
                    LibraryIdentity::new(range.name(), None, range.is_framework_reference()),
                    self.kind.clone(),
                )
            }))
        }

        fn initialize(&self, _: &[RuntimeLibrary], _: &FrameworkName, _: Option<&str>) {}

        fn attempted_paths(&self, _framework: &FrameworkName) -> Vec<String> {
            vec![format!("/{}/{{name}}", self.name)]
        }
    }

    fn fixed(name: &'static str, kind: LibraryKind, owns: fn(&LibraryRange) -> bool) -> Arc<dyn DependencyProvider> {
        Arc::new(Fixed { name, kind, owns })
    }

    fn fx() -> FrameworkName {
        FrameworkName::parse("dnx451").unwrap()
    }

    #[test]
    fn test_precedence_is_fixed() {
        let chain = ProviderChain::builder()
            .reference(fixed("reference", LibraryKind::ReferenceAssembly, |_| true))
            .package(fixed("package", LibraryKind::Package, |_| true))
            .project(fixed("project", LibraryKind::Project, |_| true))
            .build();

        let names: Vec<_> = chain.providers().map(|p| p.name()).collect();
        assert_eq!(names, vec!["project", "package", "reference", "unresolved"]);

        let lib = chain.resolve(&LibraryRange::new("Shared"), &fx()).unwrap();
        assert_eq!(lib.kind(), &LibraryKind::Project);
    }

    #[test]
    fn test_first_non_declining_provider_wins() {
        let chain = ProviderChain::builder()
            .project(fixed("project", LibraryKind::Project, |r| r.name() == "App"))
            .package(fixed("package", LibraryKind::Package, |r| !r.is_framework_reference()))
            .reference(fixed("reference", LibraryKind::ReferenceAssembly, |r| {
                r.is_framework_reference()
            }))
            .build();

        let kind = |range: LibraryRange| chain.resolve(&range, &fx()).unwrap().kind().clone();
        assert_eq!(kind(LibraryRange::new("App")), LibraryKind::Project);
        assert_eq!(kind(LibraryRange::new("Newtonsoft.Json")), LibraryKind::Package);
        assert_eq!(kind(LibraryRange::framework_reference("System")), LibraryKind::ReferenceAssembly);
    }

    #[test]
    fn test_unmatched_request_is_unresolved() {
        let chain = ProviderChain::builder()
            .project(fixed("project", LibraryKind::Project, |_| false))
            .build();

        let range = LibraryRange::new("Newtonsoft.Json")
            .with_version_range(VersionRange::parse("6.0").unwrap());
        let lib = chain.resolve(&range, &fx()).unwrap();

        assert_eq!(lib.name(), "Newtonsoft.Json");
        assert_eq!(lib.kind(), &LibraryKind::Unresolved);
        assert!(!lib.is_resolved());
    }

    #[test]
    fn test_attempted_paths_follow_precedence() {
        let chain = ProviderChain::builder()
            .package(fixed("package", LibraryKind::Package, |_| false))
            .project(fixed("project", LibraryKind::Project, |_| false))
            .build();

        assert_eq!(
            chain.attempted_paths(&fx()),
            vec!["/project/{name}".to_string(), "/package/{name}".to_string()]
        );
    }
}
