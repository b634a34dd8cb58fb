//! Local project definitions (`project.json`).
//!
//! A project declares shared dependencies, per-framework dependency groups
//! and the globs that select its source files.
//!
//! ```json
//! {
//!   "version": "1.0.0-*",
//!   "dependencies": { "Utils": "", "Newtonsoft.Json": "6.0.8" },
//!   "frameworks": {
//!     "dnx451": { "frameworkAssemblies": { "System.Xml": "" } },
//!     "dnxcore50": { "dependencies": { "System.Runtime": "4.0.20-*" } }
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use glob::Pattern;
use semver::Version;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::framework::{select_nearest, FrameworkError, FrameworkName};
use crate::core::library::{LibraryDependency, LibraryRange};
use crate::core::version::{parse_version_lenient, VersionRange};

/// Project file name inside a project directory.
pub const PROJECT_FILE: &str = "project.json";

const DEFAULT_COMPILE: &[&str] = &["**/*.cs"];
const DEFAULT_EXCLUDE: &[&str] = &["bin/**", "obj/**"];

/// Errors loading a project definition.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read project file `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse project file `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid version `{version}` in `{}`", path.display())]
    InvalidVersion { path: PathBuf, version: String },

    #[error("invalid version range for `{name}` in `{}`: `{range}`", path.display())]
    InvalidRange {
        path: PathBuf,
        name: String,
        range: String,
    },

    #[error("invalid framework in `{}`", path.display())]
    InvalidFramework {
        path: PathBuf,
        #[source]
        source: FrameworkError,
    },

    #[error("dependency with an empty name in `{}`", path.display())]
    EmptyDependencyName { path: PathBuf },

    #[error("invalid glob `{pattern}` in `{}`", path.display())]
    InvalidGlob { path: PathBuf, pattern: String },
}

/// Dependency specification as it appears in project.json.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DependencySpec {
    /// Simple version string: `"Utils": "1.0.0"` (empty means any)
    Simple(String),

    /// Detailed specification
    Detailed {
        #[serde(default)]
        version: Option<String>,
    },
}

impl DependencySpec {
    fn version(&self) -> Option<&str> {
        match self {
            DependencySpec::Simple(v) => Some(v.as_str()),
            DependencySpec::Detailed { version } => version.as_deref(),
        }
        .map(str::trim)
        .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    loadable: Option<bool>,
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default)]
    frameworks: Map<String, Value>,
    #[serde(default)]
    compile: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFramework {
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default)]
    framework_assemblies: Map<String, Value>,
}

/// Dependencies declared for one target framework.
#[derive(Debug, Clone)]
pub struct TargetFrameworkInfo {
    /// `None` when the project has nothing for the requested framework.
    pub framework_name: Option<FrameworkName>,
    pub dependencies: Vec<LibraryDependency>,
}

static NO_FRAMEWORK: TargetFrameworkInfo = TargetFrameworkInfo {
    framework_name: None,
    dependencies: Vec::new(),
};

/// A parsed project definition.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    version: Version,
    project_file_path: PathBuf,
    loadable: bool,
    dependencies: Vec<LibraryDependency>,
    frameworks: Vec<TargetFrameworkInfo>,
    compile: Vec<String>,
    exclude: Vec<String>,
}

impl Project {
    /// Load a project from its `project.json`.
    ///
    /// The project name defaults to the name of the containing directory.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let default_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::parse(&contents, &default_name, path)
    }

    /// Parse project.json contents.
    pub fn parse(contents: &str, default_name: &str, path: &Path) -> Result<Self, ProjectError> {
        let raw: RawProject = serde_json::from_str(contents).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let version = match raw.version.as_deref() {
            Some(v) => parse_version_lenient(v).ok_or_else(|| ProjectError::InvalidVersion {
                path: path.to_path_buf(),
                version: v.to_string(),
            })?,
            None => Version::new(1, 0, 0),
        };

        let dependencies = parse_dependencies(raw.dependencies, false, path)?;

        let mut frameworks = Vec::with_capacity(raw.frameworks.len());
        for (moniker, value) in raw.frameworks {
            let framework_name =
                FrameworkName::parse(&moniker).map_err(|source| ProjectError::InvalidFramework {
                    path: path.to_path_buf(),
                    source,
                })?;
            let group: RawFramework = if value.is_null() {
                RawFramework::default()
            } else {
                serde_json::from_value(value).map_err(|source| ProjectError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            };

            let mut deps = parse_dependencies(group.dependencies, false, path)?;
            deps.extend(parse_dependencies(group.framework_assemblies, true, path)?);

            frameworks.push(TargetFrameworkInfo {
                framework_name: Some(framework_name),
                dependencies: deps,
            });
        }

        let compile = raw
            .compile
            .unwrap_or_else(|| DEFAULT_COMPILE.iter().map(|s| s.to_string()).collect());
        let exclude = raw
            .exclude
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());

        Ok(Project {
            name: raw.name.unwrap_or_else(|| default_name.to_string()),
            version,
            project_file_path: path.to_path_buf(),
            loadable: raw.loadable.unwrap_or(true),
            dependencies,
            frameworks,
            compile,
            exclude,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn project_file_path(&self) -> &Path {
        &self.project_file_path
    }

    pub fn project_directory(&self) -> &Path {
        self.project_file_path.parent().unwrap_or(Path::new("."))
    }

    /// Whether the project's own assembly can be loaded in-process.
    pub fn is_loadable(&self) -> bool {
        self.loadable
    }

    /// Dependencies shared by every framework.
    pub fn dependencies(&self) -> &[LibraryDependency] {
        &self.dependencies
    }

    /// Every framework the project declares.
    pub fn target_frameworks(&self) -> impl Iterator<Item = &FrameworkName> {
        self.frameworks.iter().filter_map(|f| f.framework_name.as_ref())
    }

    /// Framework-specific information for `framework`.
    ///
    /// Never fails: when nothing matches, the returned info has no framework
    /// name and no dependencies.
    pub fn target_framework(&self, framework: &FrameworkName) -> &TargetFrameworkInfo {
        let candidates = self
            .frameworks
            .iter()
            .filter_map(|info| info.framework_name.as_ref().map(|name| (name, info)));

        select_nearest(framework, candidates).unwrap_or(&NO_FRAMEWORK)
    }

    /// Source files selected by the compile globs, sorted.
    pub fn source_files(&self) -> Result<Vec<PathBuf>, ProjectError> {
        let compile = self.patterns(&self.compile)?;
        let exclude = self.patterns(&self.exclude)?;
        let root = self.project_directory();

        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(root).ok()?.to_path_buf();
                let included = compile.iter().any(|p| p.matches_path(&relative));
                let excluded = exclude.iter().any(|p| p.matches_path(&relative));
                (included && !excluded).then(|| e.into_path())
            })
            .collect();

        files.sort();
        Ok(files)
    }

    fn patterns(&self, globs: &[String]) -> Result<Vec<Pattern>, ProjectError> {
        globs
            .iter()
            .map(|g| {
                Pattern::new(g).map_err(|_| ProjectError::InvalidGlob {
                    path: self.project_file_path.clone(),
                    pattern: g.clone(),
                })
            })
            .collect()
    }
}

fn parse_dependencies(
    specs: Map<String, Value>,
    framework_reference: bool,
    path: &Path,
) -> Result<Vec<LibraryDependency>, ProjectError> {
    specs
        .into_iter()
        .map(|(name, value)| {
            if name.trim().is_empty() {
                return Err(ProjectError::EmptyDependencyName {
                    path: path.to_path_buf(),
                });
            }

            let spec: DependencySpec =
                serde_json::from_value(value).map_err(|source| ProjectError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;

            let mut range = if framework_reference {
                LibraryRange::framework_reference(name.trim())
            } else {
                LibraryRange::new(name.trim())
            };

            if let Some(version) = spec.version() {
                let parsed = VersionRange::parse(version).map_err(|_| ProjectError::InvalidRange {
                    path: path.to_path_buf(),
                    name: name.clone(),
                    range: version.to_string(),
                })?;
                range = range.with_version_range(parsed);
            }

            Ok(LibraryDependency::new(range))
        })
        .collect()
}
