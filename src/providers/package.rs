//! Package provider - libraries from an installed package folder.
//!
//! Packages live under `{root}/{name}/{version}/`. Each may carry a
//! `package.json` describing dependencies and a `lib/{tfm}/` folder per
//! supported framework holding its assemblies:
//!
//! ```text
//! packages/
//!   Newtonsoft.Json/
//!     6.0.8/
//!       package.json
//!       lib/net45/Newtonsoft.Json.dll
//!       lib/dotnet/Newtonsoft.Json.dll
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use semver::Version;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::core::framework::select_nearest;
use crate::core::version::parse_version_lenient;
use crate::core::{
    FrameworkName, LibraryDependency, LibraryIdentity, LibraryKind, LibraryRange, RuntimeLibrary,
    VersionRange,
};
use crate::providers::DependencyProvider;

/// Package manifest file name.
pub const PACKAGE_FILE: &str = "package.json";

/// An installed package.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub name: String,
    pub version: Version,
    pub path: PathBuf,
    dependencies: Vec<LibraryDependency>,
    framework_dependencies: Vec<(FrameworkName, Vec<LibraryDependency>)>,
    lib_groups: Vec<(FrameworkName, Vec<PathBuf>)>,
}

impl PackageInfo {
    /// Dependencies for `framework`: the nearest framework group, else the
    /// framework-agnostic list.
    pub fn dependencies_for(&self, framework: &FrameworkName) -> Vec<LibraryDependency> {
        let groups = self.framework_dependencies.iter().map(|(f, deps)| (f, deps));
        select_nearest(framework, groups)
            .cloned()
            .unwrap_or_else(|| self.dependencies.clone())
    }

    /// Assembly files for `framework`.
    ///
    /// `None` when the package ships assemblies but none for a compatible
    /// framework; an empty list when it ships none at all.
    pub fn assemblies_for(&self, framework: &FrameworkName) -> Option<Vec<PathBuf>> {
        if self.lib_groups.is_empty() {
            return Some(Vec::new());
        }

        let groups = self.lib_groups.iter().map(|(f, files)| (f, files));
        select_nearest(framework, groups).cloned()
    }
}

/// Lookup of installed packages.
pub trait PackageStore: Send + Sync {
    /// The lowest installed version of `name` inside `range`.
    fn find_package(&self, name: &str, range: Option<&VersionRange>) -> Result<Option<PackageInfo>>;

    /// A specific installed version.
    fn package(&self, name: &str, version: &Version) -> Result<Option<PackageInfo>>;

    /// Path templates searched, containing `{name}`.
    fn search_paths(&self) -> Vec<String>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackage {
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default)]
    frameworks: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawPackageGroup {
    #[serde(default)]
    dependencies: Map<String, Value>,
}

/// A [`PackageStore`] over a directory of installed packages.
pub struct PackageFolder {
    root: PathBuf,
}

impl PackageFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PackageFolder { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The package directory for `name`, matched case-insensitively.
    fn package_dir(&self, name: &str) -> Result<Option<PathBuf>> {
        let exact = self.root.join(name);
        if exact.is_dir() {
            return Ok(Some(exact));
        }
        if !self.root.is_dir() {
            return Ok(None);
        }

        for entry in std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to read package folder {}", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_name().to_string_lossy().eq_ignore_ascii_case(name) && entry.path().is_dir() {
                return Ok(Some(entry.path()));
            }
        }

        Ok(None)
    }

    fn installed_versions(&self, dir: &Path) -> Result<Vec<(Version, PathBuf)>> {
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("failed to read package directory {}", dir.display()))?
        {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(version) = parse_version_lenient(&entry.file_name().to_string_lossy()) {
                versions.push((version, entry.path()));
            }
        }
        versions.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(versions)
    }

    fn load(&self, dir: &Path, version: Version) -> Result<PackageInfo> {
        let name = dir
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let manifest_path = dir.join(PACKAGE_FILE);
        let raw: RawPackage = if manifest_path.is_file() {
            let contents = std::fs::read_to_string(&manifest_path)
                .with_context(|| format!("failed to read {}", manifest_path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse {}", manifest_path.display()))?
        } else {
            RawPackage::default()
        };

        let dependencies = parse_ranges(raw.dependencies, &manifest_path)?;
        let mut framework_dependencies = Vec::new();
        for (moniker, value) in raw.frameworks {
            let framework = FrameworkName::parse(&moniker)
                .with_context(|| format!("in {}", manifest_path.display()))?;
            let group: RawPackageGroup = serde_json::from_value(value)
                .with_context(|| format!("failed to parse {}", manifest_path.display()))?;
            framework_dependencies.push((framework, parse_ranges(group.dependencies, &manifest_path)?));
        }

        Ok(PackageInfo {
            name,
            version,
            path: dir.to_path_buf(),
            dependencies,
            framework_dependencies,
            lib_groups: lib_groups(&dir.join("lib"))?,
        })
    }
}

impl PackageStore for PackageFolder {
    fn find_package(&self, name: &str, range: Option<&VersionRange>) -> Result<Option<PackageInfo>> {
        let Some(dir) = self.package_dir(name)? else {
            return Ok(None);
        };

        // Lowest applicable version wins
        let candidate = self
            .installed_versions(&dir)?
            .into_iter()
            .find(|(version, _)| range.map_or(true, |r| r.matches(version)));

        candidate
            .map(|(version, path)| self.load(&path, version))
            .transpose()
    }

    fn package(&self, name: &str, version: &Version) -> Result<Option<PackageInfo>> {
        let Some(dir) = self.package_dir(name)? else {
            return Ok(None);
        };

        self.installed_versions(&dir)?
            .into_iter()
            .find(|(v, _)| v == version)
            .map(|(version, path)| self.load(&path, version))
            .transpose()
    }

    fn search_paths(&self) -> Vec<String> {
        vec![self.root.join("{name}").join("{version}").display().to_string()]
    }
}

fn parse_ranges(specs: Map<String, Value>, manifest: &Path) -> Result<Vec<LibraryDependency>> {
    specs
        .into_iter()
        .map(|(name, value)| {
            let mut range = LibraryRange::try_new(&name).with_context(|| {
                format!("invalid dependency in {}", manifest.display())
            })?;
            if let Some(version) = value.as_str().filter(|v| !v.trim().is_empty()) {
                let parsed = VersionRange::parse(version).with_context(|| {
                    format!("invalid range for `{}` in {}", name, manifest.display())
                })?;
                range = range.with_version_range(parsed);
            }
            Ok(LibraryDependency::new(range))
        })
        .collect()
}

fn lib_groups(lib_dir: &Path) -> Result<Vec<(FrameworkName, Vec<PathBuf>)>> {
    if !lib_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut groups = Vec::new();
    for entry in std::fs::read_dir(lib_dir)
        .with_context(|| format!("failed to read {}", lib_dir.display()))?
    {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        let Ok(framework) = FrameworkName::parse(&entry.file_name().to_string_lossy()) else {
            tracing::debug!("skipping unknown framework folder {}", entry.path().display());
            continue;
        };

        let mut files = Vec::new();
        for file in std::fs::read_dir(entry.path())? {
            let path = file?.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("dll")) {
                files.push(path);
            }
        }
        files.sort();
        groups.push((framework, files));
    }

    groups.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(groups)
}

/// Resolves libraries to installed packages.
pub struct PackageProvider {
    store: Arc<dyn PackageStore>,
}

impl PackageProvider {
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        PackageProvider { store }
    }
}

impl DependencyProvider for PackageProvider {
    fn name(&self) -> &str {
        "package"
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> Result<Option<RuntimeLibrary>> {
        if range.is_framework_reference() {
            return Ok(None);
        }

        let Some(package) = self.store.find_package(range.name(), range.version_range())? else {
            return Ok(None);
        };

        let assemblies = package.assemblies_for(framework);
        let compatible = assemblies.is_some();
        let assemblies = assemblies
            .unwrap_or_default()
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();

        tracing::debug!(
            "package `{}` v{} resolved for {} (compatible: {})",
            package.name,
            package.version,
            framework.short_name(),
            compatible
        );

        let mut library = RuntimeLibrary::new(
            range.clone(),
            LibraryIdentity::new(package.name.as_str(), Some(package.version.clone()), false),
            LibraryKind::Package,
        )
        .with_dependencies(package.dependencies_for(framework))
        .with_assemblies(assemblies)
        .with_framework(Some(framework.clone()))
        .with_path(&package.path);

        library.set_compatible(compatible);
        Ok(Some(library))
    }

    fn initialize(&self, _libraries: &[RuntimeLibrary], _framework: &FrameworkName, _rid: Option<&str>) {}

    fn attempted_paths(&self, _framework: &FrameworkName) -> Vec<String> {
        self.store.search_paths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install(root: &Path, name: &str, version: &str, libs: &[&str], manifest: Option<&str>) {
        let dir = root.join(name).join(version);
        std::fs::create_dir_all(&dir).unwrap();
        for tfm in libs {
            let lib = dir.join("lib").join(tfm);
            std::fs::create_dir_all(&lib).unwrap();
            std::fs::write(lib.join(format!("{}.dll", name)), b"MZ").unwrap();
        }
        if let Some(manifest) = manifest {
            std::fs::write(dir.join(PACKAGE_FILE), manifest).unwrap();
        }
    }

    fn fx(s: &str) -> FrameworkName {
        FrameworkName::parse(s).unwrap()
    }

    #[test]
    fn test_lowest_matching_version_wins() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "Newtonsoft.Json", "5.0.1", &["net45"], None);
        install(tmp.path(), "Newtonsoft.Json", "6.0.8", &["net45"], None);
        install(tmp.path(), "Newtonsoft.Json", "7.0.1", &["net45"], None);

        let store = PackageFolder::new(tmp.path());
        let range = VersionRange::parse("6.0").unwrap();
        let package = store.find_package("Newtonsoft.Json", Some(&range)).unwrap().unwrap();
        assert_eq!(package.version, Version::new(6, 0, 8));

        let any = store.find_package("newtonsoft.json", None).unwrap().unwrap();
        assert_eq!(any.version, Version::new(5, 0, 1));

        let too_high = VersionRange::parse("8.0").unwrap();
        assert!(store.find_package("Newtonsoft.Json", Some(&too_high)).unwrap().is_none());
    }

    #[test]
    fn test_floating_range_selects_prerelease() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "System.Runtime", "4.0.20-beta-22816", &["dnxcore50"], None);

        let store = PackageFolder::new(tmp.path());
        let range = VersionRange::parse("4.0.20-*").unwrap();
        let package = store.find_package("System.Runtime", Some(&range)).unwrap().unwrap();
        assert_eq!(package.version, Version::parse("4.0.20-beta-22816").unwrap());
    }

    #[test]
    fn test_blank_dependency_name_is_an_error() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "Pkg", "1.0.0", &[], Some(r#"{ "dependencies": { "": "1.0" } }"#));

        let store = PackageFolder::new(tmp.path());
        let err = store.find_package("Pkg", None).unwrap_err();
        assert!(format!("{:#}", err).contains("library name cannot be empty"));
    }

    #[test]
    fn test_provider_resolves_package() {
        let tmp = TempDir::new().unwrap();
        install(
            tmp.path(),
            "Logging",
            "1.2.0",
            &["net45", "dotnet"],
            Some(r#"{ "dependencies": { "Abstractions": "1.0" } }"#),
        );

        let provider = PackageProvider::new(Arc::new(PackageFolder::new(tmp.path())));
        let lib = provider
            .get_description(&LibraryRange::new("Logging"), &fx("dnx451"))
            .unwrap()
            .unwrap();

        assert_eq!(lib.kind(), &LibraryKind::Package);
        assert_eq!(lib.identity().version(), Some(&Version::new(1, 2, 0)));
        assert_eq!(lib.assemblies(), ["Logging".to_string()]);
        assert_eq!(lib.dependencies()[0].name(), "Abstractions");
        assert!(lib.is_resolved());
        assert!(lib.is_compatible());
    }

    #[test]
    fn test_package_without_compatible_lib_is_incompatible() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "DesktopOnly", "1.0.0", &["net45"], None);

        let provider = PackageProvider::new(Arc::new(PackageFolder::new(tmp.path())));
        let lib = provider
            .get_description(&LibraryRange::new("DesktopOnly"), &fx("dnxcore50"))
            .unwrap()
            .unwrap();

        assert!(lib.is_resolved());
        assert!(!lib.is_compatible());
        assert!(lib.assemblies().is_empty());
    }

    #[test]
    fn test_framework_specific_dependency_groups() {
        let tmp = TempDir::new().unwrap();
        install(
            tmp.path(),
            "Http",
            "2.0.0",
            &[],
            Some(
                r#"{
                    "dependencies": { "Common": "" },
                    "frameworks": { "dnxcore50": { "dependencies": { "System.Runtime": "4.0" } } }
                }"#,
            ),
        );

        let store = PackageFolder::new(tmp.path());
        let package = store.package("Http", &Version::new(2, 0, 0)).unwrap().unwrap();

        let core: Vec<_> = package.dependencies_for(&fx("dnxcore50"));
        assert_eq!(core[0].name(), "System.Runtime");

        let desktop = package.dependencies_for(&fx("net45"));
        assert_eq!(desktop[0].name(), "Common");
    }

    #[test]
    fn test_declines_platform_references_and_missing_packages() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "System.Xml", "4.0.0", &["net45"], None);
        let provider = PackageProvider::new(Arc::new(PackageFolder::new(tmp.path())));

        let platform = LibraryRange::framework_reference("System.Xml");
        assert!(provider.get_description(&platform, &fx("net45")).unwrap().is_none());

        let missing = LibraryRange::new("Missing");
        assert!(provider.get_description(&missing, &fx("net45")).unwrap().is_none());
    }
}
