//! Resolution operations.
//!
//! A [`ResolveContext`] turns configuration into a provider chain and, once
//! a graph is resolved, into an exporter sharing the same project, package
//! and reference lookups.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::compilation::{CompilationCache, LibraryExporter, ProjectSourceEngine};
use crate::core::{FrameworkName, LibraryRange};
use crate::providers::{
    FileSystemProjectResolver, FrameworkReferenceResolver, GacFallbackResolver, PackageFolder,
    PackageProvider, ProjectReferenceProvider, ProviderChain, ReferenceAssemblyFolder,
    ReferenceAssemblyProvider,
};
use crate::resolver::{resolve_closure, LibraryManager};
use crate::util::Config;

/// Command-line overrides for configured values.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub framework: Option<String>,
    pub configuration: Option<String>,
}

/// Everything needed to resolve and export libraries under one project root.
pub struct ResolveContext {
    root: PathBuf,
    framework: FrameworkName,
    configuration: String,
    runtime: Option<String>,
    projects: Arc<FileSystemProjectResolver>,
    packages: Option<Arc<PackageFolder>>,
    /// Reference assemblies with the global assembly cache as fallback
    references: Option<Arc<dyn FrameworkReferenceResolver>>,
    chain: ProviderChain,
    cache: Arc<CompilationCache>,
}

impl ResolveContext {
    pub fn new(root: &Path, config: &Config, opts: &ResolveOptions) -> Result<Self> {
        let moniker = opts.framework.as_deref().unwrap_or_else(|| config.framework());
        let framework = FrameworkName::parse(moniker)
            .with_context(|| format!("invalid target framework `{}`", moniker))?;
        let configuration = opts
            .configuration
            .clone()
            .unwrap_or_else(|| config.configuration().to_string());

        let search_paths = if config.resolve.search_paths.is_empty() {
            default_search_paths(root)
        } else {
            config.resolve.search_paths.clone()
        };

        let projects = Arc::new(FileSystemProjectResolver::new(search_paths));
        let packages = config
            .resolve
            .packages
            .as_ref()
            .map(|dir| Arc::new(PackageFolder::new(dir)));
        let folder = config
            .resolve
            .reference_assemblies
            .as_ref()
            .map(|dir| Arc::new(ReferenceAssemblyFolder::new(dir)));

        let mut builder =
            ProviderChain::builder().project(Arc::new(ProjectReferenceProvider::new(projects.clone())));
        if let Some(packages) = &packages {
            builder = builder.package(Arc::new(PackageProvider::new(packages.clone())));
        }
        if let Some(folder) = &folder {
            builder = builder.reference(Arc::new(
                ReferenceAssemblyProvider::new(folder.clone())
                    .with_gac_paths(config.resolve.gac.clone()),
            ));
        }
        let references = folder.map(|folder| {
            Arc::new(GacFallbackResolver::new(folder, config.resolve.gac.clone()))
                as Arc<dyn FrameworkReferenceResolver>
        });

        tracing::debug!(
            "resolving under {} for {} ({})",
            root.display(),
            framework,
            configuration
        );

        Ok(ResolveContext {
            root: root.to_path_buf(),
            framework,
            configuration,
            runtime: config.resolve.runtime.clone(),
            projects,
            packages,
            references,
            chain: builder.build(),
            cache: Arc::new(CompilationCache::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn framework(&self) -> &FrameworkName {
        &self.framework
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    pub fn cache(&self) -> &Arc<CompilationCache> {
        &self.cache
    }

    /// Resolve `name` and its transitive dependencies.
    pub fn resolve(&self, name: &str) -> Result<LibraryManager> {
        resolve_closure(
            &self.chain,
            &LibraryRange::new(name),
            &self.framework,
            self.runtime.as_deref(),
        )
        .with_context(|| format!("failed to resolve `{}`", name))
    }

    /// Every location the chain searches.
    pub fn attempted_paths(&self) -> Vec<String> {
        self.chain.attempted_paths(&self.framework)
    }

    /// An exporter over `libraries`, wired to this context's lookups.
    ///
    /// The cache is subscribed to the engine so changed sources invalidate
    /// earlier project exports.
    pub fn exporter(&self, libraries: Arc<LibraryManager>) -> LibraryExporter {
        let engine = Arc::new(ProjectSourceEngine::new(self.projects.clone()));
        self.cache.subscribe(engine.as_ref());

        let mut exporter = LibraryExporter::new(
            self.framework.clone(),
            self.configuration.as_str(),
            libraries,
            Arc::clone(&self.cache),
        )
        .with_compilation_engine(engine);

        if let Some(packages) = &self.packages {
            exporter = exporter.with_package_store(packages.clone());
        }
        if let Some(references) = &self.references {
            exporter = exporter.with_reference_resolver(references.clone());
        }
        exporter
    }
}

/// `root`, `root/src` and `root/test`.
pub fn default_search_paths(root: &Path) -> Vec<PathBuf> {
    vec![root.to_path_buf(), root.join("src"), root.join("test")]
}
