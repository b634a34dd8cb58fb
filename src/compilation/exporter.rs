//! Library exporter - turns resolved libraries into compilation inputs.
//!
//! Each [`LibraryKind`] has its own export routine:
//!
//! - `ReferenceAssembly` / `GlobalAssemblyCache`: the assembly path for the
//!   *requested* framework, looked up again through the reference resolver.
//!   A resolver miss is an absent export, not an error.
//! - `Package`: metadata references to the package's assemblies.
//! - `Project`: a compile through the [`CompilationEngine`], yielding the
//!   binary if one exists and the project's sources otherwise.
//! - `Unresolved` and incompatible libraries export nothing.
//!
//! Package and project exports are memoized in the [`CompilationCache`].

use std::sync::Arc;

use rayon::prelude::*;

use crate::compilation::cache::{CacheKey, CompilationCache};
use crate::compilation::engine::{CancellationToken, CompilationEngine};
use crate::compilation::errors::ExportError;
use crate::core::library::assembly_name;
use crate::core::{
    CompilationTarget, FrameworkName, LibraryExport, LibraryKind, MetadataReference,
    RuntimeLibrary,
};
use crate::providers::{FrameworkReferenceResolver, PackageStore};
use crate::resolver::LibraryGraph;

/// How project libraries contribute to an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectMode {
    /// The compiled binary when one exists, else the sources.
    Compiled,
    /// Always the sources.
    Sources,
}

/// Exports libraries of one resolved graph for one framework and
/// configuration.
pub struct LibraryExporter {
    framework: FrameworkName,
    configuration: String,
    libraries: Arc<dyn LibraryGraph>,
    cache: Arc<CompilationCache>,
    reference_resolver: Option<Arc<dyn FrameworkReferenceResolver>>,
    package_store: Option<Arc<dyn PackageStore>>,
    engine: Option<Arc<dyn CompilationEngine>>,
    cancel: CancellationToken,
}

impl LibraryExporter {
    pub fn new(
        framework: FrameworkName,
        configuration: impl Into<String>,
        libraries: Arc<dyn LibraryGraph>,
        cache: Arc<CompilationCache>,
    ) -> Self {
        LibraryExporter {
            framework,
            configuration: configuration.into(),
            libraries,
            cache,
            reference_resolver: None,
            package_store: None,
            engine: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_reference_resolver(mut self, resolver: Arc<dyn FrameworkReferenceResolver>) -> Self {
        self.reference_resolver = Some(resolver);
        self
    }

    pub fn with_package_store(mut self, store: Arc<dyn PackageStore>) -> Self {
        self.package_store = Some(store);
        self
    }

    pub fn with_compilation_engine(mut self, engine: Arc<dyn CompilationEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Token handed to the engine for every project compile.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn framework(&self) -> &FrameworkName {
        &self.framework
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    /// Export of the library `name` alone. `Ok(None)` if the graph has no
    /// such library or the export is absent.
    pub fn get_library_export(&self, name: &str) -> Result<Option<LibraryExport>, ExportError> {
        self.get_library_export_for_aspect(name, None)
    }

    pub fn get_library_export_for_aspect(
        &self,
        name: &str,
        aspect: Option<&str>,
    ) -> Result<Option<LibraryExport>, ExportError> {
        let Some(library) = self.libraries.get_library(name) else {
            return Ok(None);
        };

        let target = self.target(library.name(), aspect);
        self.export(library, &target, ProjectMode::Compiled)
    }

    /// Merged export of `name` and its transitive dependencies.
    pub fn get_all_exports(&self, name: &str) -> Result<Option<LibraryExport>, ExportError> {
        self.all_exports(name, None, ProjectMode::Compiled)
    }

    /// Like [`get_all_exports`](Self::get_all_exports), with `aspect`
    /// applied to the root library only.
    pub fn get_all_exports_for_aspect(
        &self,
        name: &str,
        aspect: Option<&str>,
    ) -> Result<Option<LibraryExport>, ExportError> {
        self.all_exports(name, aspect, ProjectMode::Compiled)
    }

    /// With `include_projects`, project libraries contribute their sources
    /// instead of their compiled output.
    pub fn get_all_exports_with_projects(
        &self,
        name: &str,
        include_projects: bool,
    ) -> Result<Option<LibraryExport>, ExportError> {
        let mode = if include_projects {
            ProjectMode::Sources
        } else {
            ProjectMode::Compiled
        };
        self.all_exports(name, None, mode)
    }

    /// Export one library for `target`.
    pub fn export_library(
        &self,
        library: &RuntimeLibrary,
        target: &CompilationTarget,
    ) -> Result<Option<LibraryExport>, ExportError> {
        self.export(library, target, ProjectMode::Compiled)
    }

    fn target(&self, name: &str, aspect: Option<&str>) -> CompilationTarget {
        CompilationTarget::new(name, self.framework.clone(), self.configuration.as_str())
            .with_aspect(aspect)
    }

    fn all_exports(
        &self,
        name: &str,
        aspect: Option<&str>,
        mode: ProjectMode,
    ) -> Result<Option<LibraryExport>, ExportError> {
        let closure = self.libraries.get_library_dependencies(name);
        let Some(root) = closure.first() else {
            return Ok(None);
        };
        let root_name = root.name();

        let exports = closure
            .par_iter()
            .map(|library| {
                let aspect = if library.name() == root_name { aspect } else { None };
                let target = self.target(library.name(), aspect);
                self.export(library, &target, mode)
            })
            .collect::<Result<Vec<_>, ExportError>>()?;

        let mut merged = LibraryExport::empty();
        for export in exports.into_iter().flatten() {
            merged.merge(export);
        }

        tracing::debug!(
            "exported {} librar{} for `{}`",
            closure.len(),
            if closure.len() == 1 { "y" } else { "ies" },
            name
        );
        Ok(Some(merged))
    }

    fn export(
        &self,
        library: &RuntimeLibrary,
        target: &CompilationTarget,
        mode: ProjectMode,
    ) -> Result<Option<LibraryExport>, ExportError> {
        if !library.is_resolved() || !library.is_compatible() {
            return Ok(Some(LibraryExport::empty()));
        }

        match library.kind() {
            LibraryKind::Unresolved => Ok(Some(LibraryExport::empty())),
            LibraryKind::ReferenceAssembly => self.export_reference_assembly(library, target),
            LibraryKind::GlobalAssemblyCache => match self.reference_resolver {
                Some(_) => self.export_reference_assembly(library, target),
                None => self.export_recorded_path(library).map(Some),
            },
            LibraryKind::Package => self.export_package(library, target).map(Some),
            LibraryKind::Project => self.export_project(library, target, mode).map(Some),
            LibraryKind::Other(kind) => {
                tracing::debug!("no exporter for `{}` of kind `{}`", library.name(), kind);
                Ok(Some(LibraryExport::empty()))
            }
        }
    }

    /// Platform assemblies are looked up for the target's framework rather
    /// than trusting the path recorded during resolution.
    fn export_reference_assembly(
        &self,
        library: &RuntimeLibrary,
        target: &CompilationTarget,
    ) -> Result<Option<LibraryExport>, ExportError> {
        let Some(resolver) = &self.reference_resolver else {
            return self.export_recorded_path(library).map(Some);
        };

        let name = assembly_name(library.name());
        match resolver.try_get_assembly(name, target.framework()) {
            Some(assembly) => Ok(Some(LibraryExport::from_metadata(MetadataReference::new(
                name,
                assembly.path,
            )))),
            None => {
                tracing::debug!(
                    "{} has no reference assembly `{}`",
                    target.framework().short_name(),
                    name
                );
                Ok(None)
            }
        }
    }

    fn export_recorded_path(&self, library: &RuntimeLibrary) -> Result<LibraryExport, ExportError> {
        let path = library.path().ok_or_else(|| missing_path(library))?;
        Ok(LibraryExport::from_metadata(MetadataReference::new(
            library.identity().name(),
            path,
        )))
    }

    fn export_package(
        &self,
        library: &RuntimeLibrary,
        target: &CompilationTarget,
    ) -> Result<LibraryExport, ExportError> {
        let key = CacheKey::new(library.identity().clone(), target.clone());
        let export = self.cache.get_or_compute(&key, || {
            let Some(store) = &self.package_store else {
                return self.export_flat_package(library);
            };

            let version = library.identity().version().ok_or_else(|| ExportError::MissingVersion {
                name: library.name().to_string(),
            })?;
            let package = store.package(library.name(), version)?.ok_or_else(|| {
                ExportError::PackageNotInstalled {
                    name: library.name().to_string(),
                    version: version.to_string(),
                }
            })?;

            let mut export = LibraryExport::empty();
            for path in package.assemblies_for(target.framework()).unwrap_or_default() {
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| library.name().to_string());
                export.add_metadata(MetadataReference::new(name, path));
            }
            Ok(export)
        })?;

        Ok((*export).clone())
    }

    /// Without a store, assemblies are expected directly in the package
    /// directory as `{path}/{assembly}.dll`.
    fn export_flat_package(&self, library: &RuntimeLibrary) -> Result<LibraryExport, ExportError> {
        let root = library.path().ok_or_else(|| missing_path(library))?;

        let mut export = LibraryExport::empty();
        for assembly in library.assemblies() {
            export.add_metadata(MetadataReference::new(
                assembly.as_str(),
                root.join(format!("{}.dll", assembly)),
            ));
        }
        Ok(export)
    }

    fn export_project(
        &self,
        library: &RuntimeLibrary,
        target: &CompilationTarget,
        mode: ProjectMode,
    ) -> Result<LibraryExport, ExportError> {
        let engine = self.engine.as_ref().ok_or_else(|| ExportError::NotConfigured {
            capability: "compilation engine",
            library: library.name().to_string(),
        })?;

        // The cached value carries both the binary and the sources so both
        // modes share one compile.
        let key = CacheKey::new(library.identity().clone(), target.clone());
        let full = self.cache.get_or_compute(&key, || {
            let unit = engine.compile_and_load(target, &self.cancel)?;

            let mut export = LibraryExport::empty();
            if let Some(output) = unit.output {
                export.add_metadata(MetadataReference::new(unit.name, output));
            }
            for source in unit.sources {
                export.add_source(source);
            }
            Ok::<_, ExportError>(export)
        })?;

        let export = (*full).clone();
        Ok(match mode {
            ProjectMode::Compiled if export.has_metadata() => export.into_metadata_only(),
            ProjectMode::Compiled | ProjectMode::Sources => export.into_sources_only(),
        })
    }
}

fn missing_path(library: &RuntimeLibrary) -> ExportError {
    ExportError::MissingPath {
        library: library.name().to_string(),
        kind: library.kind().to_string(),
    }
}
