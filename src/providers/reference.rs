//! Reference assembly provider - platform and global assembly cache references.
//!
//! Only platform-flagged requests are handled here. Framework reference
//! assemblies are looked up per target framework; on desktop frameworks the
//! configured global assembly cache directories are consulted next.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Result;
use semver::Version;

use crate::core::version::parse_version_lenient;
use crate::core::{FrameworkName, LibraryIdentity, LibraryKind, LibraryRange, RuntimeLibrary};
use crate::providers::DependencyProvider;

/// Optional per-framework file mapping assembly names to versions.
pub const VERSIONS_FILE: &str = "versions.json";

/// A platform assembly located for a framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssembly {
    pub path: PathBuf,
    pub version: Option<Version>,
}

/// Maps an assembly name and framework to a concrete reference assembly.
pub trait FrameworkReferenceResolver: Send + Sync {
    /// `None` when the framework does not ship this assembly.
    fn try_get_assembly(&self, name: &str, framework: &FrameworkName) -> Option<ResolvedAssembly>;

    /// The directory holding reference assemblies for `framework`.
    fn reference_directory(&self, framework: &FrameworkName) -> Option<PathBuf>;
}

/// Reference assemblies laid out as `{root}/{identifier}/v{version}/{name}.dll`,
/// with profiles under `Profile/{profile}`.
pub struct ReferenceAssemblyFolder {
    root: PathBuf,
    versions: RwLock<HashMap<PathBuf, Arc<HashMap<String, Version>>>>,
}

impl ReferenceAssemblyFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ReferenceAssemblyFolder {
            root: root.into(),
            versions: RwLock::new(HashMap::new()),
        }
    }

    fn framework_dir(&self, framework: &FrameworkName) -> PathBuf {
        let mut dir = self
            .root
            .join(framework.identifier())
            .join(format!("v{}", framework.version_string()));
        if let Some(profile) = framework.profile() {
            dir = dir.join("Profile").join(profile);
        }
        dir
    }

    /// Assembly versions listed for a framework directory.
    ///
    /// A missing or unreadable `versions.json` leaves assemblies versionless.
    fn versions(&self, dir: &Path) -> Arc<HashMap<String, Version>> {
        if let Some(versions) = self.versions.read().unwrap().get(dir) {
            return Arc::clone(versions);
        }

        let path = dir.join(VERSIONS_FILE);
        let versions = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(raw) => raw
                    .into_iter()
                    .filter_map(|(name, v)| parse_version_lenient(&v).map(|v| (name, v)))
                    .collect(),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        let versions = Arc::new(versions);
        self.versions
            .write()
            .unwrap()
            .insert(dir.to_path_buf(), Arc::clone(&versions));
        versions
    }
}

impl FrameworkReferenceResolver for ReferenceAssemblyFolder {
    fn try_get_assembly(&self, name: &str, framework: &FrameworkName) -> Option<ResolvedAssembly> {
        let dir = self.framework_dir(framework);
        let path = dir.join(format!("{}.dll", name));
        if !path.is_file() {
            return None;
        }

        let version = self.versions(&dir).get(name).cloned();
        Some(ResolvedAssembly { path, version })
    }

    fn reference_directory(&self, framework: &FrameworkName) -> Option<PathBuf> {
        Some(self.framework_dir(framework))
    }
}

/// Reference assemblies first, then the global assembly cache on desktop
/// frameworks.
///
/// Exporting re-resolves platform references for the target framework, so
/// the exporter needs the same fallback the provider applied when it found
/// the library.
pub struct GacFallbackResolver {
    references: Arc<dyn FrameworkReferenceResolver>,
    gac_paths: Vec<PathBuf>,
}

impl GacFallbackResolver {
    pub fn new(references: Arc<dyn FrameworkReferenceResolver>, gac_paths: Vec<PathBuf>) -> Self {
        GacFallbackResolver {
            references,
            gac_paths,
        }
    }
}

impl FrameworkReferenceResolver for GacFallbackResolver {
    fn try_get_assembly(&self, name: &str, framework: &FrameworkName) -> Option<ResolvedAssembly> {
        if let Some(assembly) = self.references.try_get_assembly(name, framework) {
            return Some(assembly);
        }
        if !framework.is_desktop() {
            return None;
        }
        find_in_gac(&self.gac_paths, name).map(|path| ResolvedAssembly {
            path,
            version: None,
        })
    }

    fn reference_directory(&self, framework: &FrameworkName) -> Option<PathBuf> {
        self.references.reference_directory(framework)
    }
}

fn find_in_gac(paths: &[PathBuf], name: &str) -> Option<PathBuf> {
    paths
        .iter()
        .map(|dir| dir.join(format!("{}.dll", name)))
        .find(|path| path.is_file())
}

/// Resolves platform references to framework reference assemblies or, on
/// desktop frameworks, to the global assembly cache.
pub struct ReferenceAssemblyProvider {
    resolver: Arc<dyn FrameworkReferenceResolver>,
    gac_paths: Vec<PathBuf>,
}

impl ReferenceAssemblyProvider {
    pub fn new(resolver: Arc<dyn FrameworkReferenceResolver>) -> Self {
        ReferenceAssemblyProvider {
            resolver,
            gac_paths: Vec::new(),
        }
    }

    /// Directories searched for `{name}.dll` after the reference assemblies.
    pub fn with_gac_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.gac_paths = paths;
        self
    }
}

impl DependencyProvider for ReferenceAssemblyProvider {
    fn name(&self) -> &str {
        "reference"
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> Result<Option<RuntimeLibrary>> {
        if !range.is_framework_reference() {
            return Ok(None);
        }

        let name = range.assembly_name();

        if let Some(assembly) = self.resolver.try_get_assembly(name, framework) {
            tracing::debug!("reference assembly `{}` found at {}", name, assembly.path.display());
            let library = RuntimeLibrary::new(
                range.clone(),
                LibraryIdentity::new(name, assembly.version, true),
                LibraryKind::ReferenceAssembly,
            )
            .with_assemblies(vec![name.to_string()])
            .with_framework(Some(framework.clone()))
            .with_path(assembly.path);
            return Ok(Some(library));
        }

        // The global assembly cache only serves desktop frameworks
        if !framework.is_desktop() {
            return Ok(None);
        }

        Ok(find_in_gac(&self.gac_paths, name).map(|path| {
            tracing::debug!("`{}` found in the global assembly cache at {}", name, path.display());
            RuntimeLibrary::new(
                range.clone(),
                LibraryIdentity::new(name, None, true),
                LibraryKind::GlobalAssemblyCache,
            )
            .with_assemblies(vec![name.to_string()])
            .with_framework(Some(framework.clone()))
            .with_path(path)
        }))
    }

    fn initialize(&self, _libraries: &[RuntimeLibrary], _framework: &FrameworkName, _rid: Option<&str>) {}

    fn attempted_paths(&self, framework: &FrameworkName) -> Vec<String> {
        let mut paths: Vec<String> = self
            .resolver
            .reference_directory(framework)
            .into_iter()
            .map(|dir| dir.join("{name}.dll").display().to_string())
            .collect();

        if framework.is_desktop() {
            paths.extend(
                self.gac_paths
                    .iter()
                    .map(|dir| dir.join("{name}.dll").display().to_string()),
            );
        }

        paths
    }
}
