//! Project provider - libraries backed by local `project.json` files.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::Result;

use crate::core::project::PROJECT_FILE;
use crate::core::{
    FrameworkName, LibraryDependency, LibraryIdentity, LibraryKind, LibraryRange, Project,
    RuntimeLibrary,
};
use crate::providers::DependencyProvider;

/// Assemblies every desktop compilation sees without declaring them.
pub const IMPLICIT_DESKTOP_ASSEMBLIES: [&str; 4] =
    ["mscorlib", "System", "System.Core", "Microsoft.CSharp"];

/// Finds project definitions by name.
pub trait ProjectResolver: Send + Sync {
    /// Look up a project. `Ok(None)` means no project has this name.
    fn try_resolve_project(&self, name: &str) -> Result<Option<Arc<Project>>>;

    /// Directories searched for `{name}/project.json`.
    fn search_paths(&self) -> &[PathBuf];
}

/// Resolves projects from `{search path}/{name}/project.json`.
///
/// Loaded projects are cached; misses are not.
pub struct FileSystemProjectResolver {
    search_paths: Vec<PathBuf>,
    projects: RwLock<HashMap<String, Arc<Project>>>,
}

impl FileSystemProjectResolver {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        FileSystemProjectResolver {
            search_paths,
            projects: RwLock::new(HashMap::new()),
        }
    }
}

impl ProjectResolver for FileSystemProjectResolver {
    fn try_resolve_project(&self, name: &str) -> Result<Option<Arc<Project>>> {
        if let Some(project) = self.projects.read().unwrap().get(name) {
            return Ok(Some(Arc::clone(project)));
        }

        for search_path in &self.search_paths {
            let candidate = search_path.join(name).join(PROJECT_FILE);
            if !candidate.is_file() {
                continue;
            }

            let project = Arc::new(Project::load(&candidate)?);
            tracing::debug!("loaded project `{}` from {}", name, candidate.display());

            self.projects
                .write()
                .unwrap()
                .insert(name.to_string(), Arc::clone(&project));
            return Ok(Some(project));
        }

        Ok(None)
    }

    fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

/// Resolves libraries to local projects.
pub struct ProjectReferenceProvider {
    resolver: Arc<dyn ProjectResolver>,
    libraries: RwLock<Vec<RuntimeLibrary>>,
}

impl ProjectReferenceProvider {
    pub fn new(resolver: Arc<dyn ProjectResolver>) -> Self {
        ProjectReferenceProvider {
            resolver,
            libraries: RwLock::new(Vec::new()),
        }
    }

    /// The library set recorded by the last `initialize`.
    pub fn dependencies(&self) -> Vec<RuntimeLibrary> {
        self.libraries.read().unwrap().clone()
    }
}

impl DependencyProvider for ProjectReferenceProvider {
    fn name(&self) -> &str {
        "project"
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        framework: &FrameworkName,
    ) -> Result<Option<RuntimeLibrary>> {
        if range.is_framework_reference() {
            return Ok(None);
        }

        // Can't find a project with the name so bail
        let Some(project) = self.resolver.try_resolve_project(range.name())? else {
            return Ok(None);
        };

        let framework_info = project.target_framework(framework);

        let mut dependencies: Vec<LibraryDependency> = project
            .dependencies()
            .iter()
            .chain(&framework_info.dependencies)
            .cloned()
            .collect();

        if framework.is_desktop() {
            dependencies.extend(
                IMPLICIT_DESKTOP_ASSEMBLIES
                    .iter()
                    .map(|name| LibraryDependency::new(LibraryRange::framework_reference(*name))),
            );
        }

        let assemblies = if project.is_loadable() {
            vec![project.name().to_string()]
        } else {
            Vec::new()
        };

        // Declared frameworks, none of which fit the request
        let unresolved = framework_info.framework_name.is_none()
            && project.target_frameworks().next().is_some();

        tracing::debug!(
            "project `{}` resolved for {} (unresolved: {})",
            project.name(),
            framework.short_name(),
            unresolved
        );

        let mut library = RuntimeLibrary::new(
            range.clone(),
            LibraryIdentity::new(project.name(), Some(project.version().clone()), false),
            LibraryKind::Project,
        )
        .with_dependencies(dependencies)
        .with_assemblies(assemblies)
        .with_framework(framework_info.framework_name.clone())
        .with_path(project.project_file_path());

        library.set_compatible(!unresolved);
        library.set_resolved(!unresolved);

        Ok(Some(library))
    }

    fn initialize(
        &self,
        libraries: &[RuntimeLibrary],
        _framework: &FrameworkName,
        _runtime_identifier: Option<&str>,
    ) {
        *self.libraries.write().unwrap() = libraries.to_vec();
    }

    fn attempted_paths(&self, _framework: &FrameworkName) -> Vec<String> {
        self.resolver
            .search_paths()
            .iter()
            .map(|p| p.join("{name}").join(PROJECT_FILE).display().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_project(root: &Path, name: &str, json: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PROJECT_FILE), json).unwrap();
    }

    fn provider(root: &Path) -> ProjectReferenceProvider {
        let resolver = FileSystemProjectResolver::new(vec![root.to_path_buf()]);
        ProjectReferenceProvider::new(Arc::new(resolver))
    }

    fn fx(s: &str) -> FrameworkName {
        FrameworkName::parse(s).unwrap()
    }

    #[test]
    fn test_declines_platform_references() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "System.Xml", "{}");
        let provider = provider(tmp.path());

        let range = LibraryRange::framework_reference("System.Xml");
        assert!(provider.get_description(&range, &fx("net45")).unwrap().is_none());
        assert!(provider.get_description(&range, &fx("dnxcore50")).unwrap().is_none());
    }

    #[test]
    fn test_declines_unknown_names() {
        let tmp = TempDir::new().unwrap();
        let provider = provider(tmp.path());

        let range = LibraryRange::new("Newtonsoft.Json");
        assert!(provider.get_description(&range, &fx("net45")).unwrap().is_none());
    }

    #[test]
    fn test_desktop_project_gets_implicit_platform_dependencies() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            "App",
            r#"{ "dependencies": { "Utils": "" }, "frameworks": { "dnx451": {} } }"#,
        );
        let provider = provider(tmp.path());

        let lib = provider
            .get_description(&LibraryRange::new("App"), &fx("dnx451"))
            .unwrap()
            .unwrap();

        let names: Vec<_> = lib.dependencies().iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec!["Utils", "mscorlib", "System", "System.Core", "Microsoft.CSharp"]
        );
        assert!(!lib.dependencies()[0].range().is_framework_reference());
        assert!(lib.dependencies()[1..]
            .iter()
            .all(|d| d.range().is_framework_reference()));

        assert_eq!(lib.kind(), &LibraryKind::Project);
        assert_eq!(lib.assemblies(), ["App".to_string()]);
        assert_eq!(lib.path(), Some(tmp.path().join("App").join(PROJECT_FILE).as_path()));
        assert_eq!(lib.framework(), Some(&fx("dnx451")));
        assert!(lib.is_resolved());
        assert!(lib.is_compatible());
    }

    #[test]
    fn test_core_project_gets_no_implicit_dependencies() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            "App",
            r#"{ "dependencies": { "Utils": "" }, "frameworks": { "dnxcore50": {} } }"#,
        );
        let provider = provider(tmp.path());

        let lib = provider
            .get_description(&LibraryRange::new("App"), &fx("dnxcore50"))
            .unwrap()
            .unwrap();

        let names: Vec<_> = lib.dependencies().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Utils"]);
    }

    #[test]
    fn test_framework_agnostic_project_always_resolves() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "Utils", "{}");
        let provider = provider(tmp.path());

        for framework in ["net45", "dnxcore50", "dotnet"] {
            let lib = provider
                .get_description(&LibraryRange::new("Utils"), &fx(framework))
                .unwrap()
                .unwrap();
            assert!(lib.is_resolved());
            assert!(lib.is_compatible());
            assert!(lib.framework().is_none());
        }
    }

    #[test]
    fn test_unmatched_framework_is_unresolved() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "CoreOnly", r#"{ "frameworks": { "dnxcore50": {} } }"#);
        let provider = provider(tmp.path());

        let lib = provider
            .get_description(&LibraryRange::new("CoreOnly"), &fx("net45"))
            .unwrap()
            .unwrap();

        assert_eq!(lib.kind(), &LibraryKind::Project);
        assert!(!lib.is_resolved());
        assert!(!lib.is_compatible());
    }

    #[test]
    fn test_non_loadable_project_has_no_assemblies() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "Shared", r#"{ "loadable": false }"#);
        let provider = provider(tmp.path());

        let lib = provider
            .get_description(&LibraryRange::new("Shared"), &fx("dnxcore50"))
            .unwrap()
            .unwrap();
        assert!(lib.assemblies().is_empty());
    }

    #[test]
    fn test_malformed_project_is_an_error() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "Broken", "{ not json");
        let provider = provider(tmp.path());

        assert!(provider
            .get_description(&LibraryRange::new("Broken"), &fx("net45"))
            .is_err());
    }

    #[test]
    fn test_attempted_paths_and_initialize() {
        let tmp = TempDir::new().unwrap();
        let provider = provider(tmp.path());

        let paths = provider.attempted_paths(&fx("net45"));
        assert_eq!(
            paths,
            vec![tmp.path().join("{name}").join(PROJECT_FILE).display().to_string()]
        );

        let lib = RuntimeLibrary::new(
            LibraryRange::new("A"),
            LibraryIdentity::new("A", None, false),
            LibraryKind::Project,
        );
        provider.initialize(&[lib], &fx("net45"), None);
        assert_eq!(provider.dependencies().len(), 1);
    }
}
