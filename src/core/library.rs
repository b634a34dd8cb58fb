//! Library identity model - WHAT was requested and WHAT it resolved to.
//!
//! A [`LibraryRange`] is a request, a [`LibraryIdentity`] is the concrete
//! answer, and a [`RuntimeLibrary`] is the resolved graph node that carries
//! both plus everything the exporter needs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use semver::Version;
use serde::Serialize;
use thiserror::Error;

use crate::core::framework::FrameworkName;
use crate::core::version::VersionRange;

/// Prefix marking a framework assembly request (`fx/System.Xml`).
const FRAMEWORK_PREFIX: &str = "fx/";

/// Error building a library request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryRangeError {
    #[error("library name cannot be empty")]
    EmptyName,
}

/// A requested dependency: name, acceptable versions and whether it is a
/// platform (framework or global assembly cache) reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryRange {
    name: String,
    version_range: Option<VersionRange>,
    framework_reference: bool,
}

impl LibraryRange {
    /// Create a request for any version of `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "library ranges need a name");
        LibraryRange {
            name,
            version_range: None,
            framework_reference: false,
        }
    }

    /// Create a request for `name`, rejecting empty or blank names.
    ///
    /// Surrounding whitespace is trimmed.
    pub fn try_new(name: &str) -> Result<Self, LibraryRangeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LibraryRangeError::EmptyName);
        }
        Ok(LibraryRange::new(name))
    }

    /// Create a platform reference. These never resolve through project
    /// or package sources.
    pub fn framework_reference(name: impl Into<String>) -> Self {
        LibraryRange {
            framework_reference: true,
            ..LibraryRange::new(name)
        }
    }

    /// Restrict the acceptable versions.
    pub fn with_version_range(mut self, range: VersionRange) -> Self {
        self.version_range = Some(range);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version_range(&self) -> Option<&VersionRange> {
        self.version_range.as_ref()
    }

    pub fn is_framework_reference(&self) -> bool {
        self.framework_reference
    }

    /// The assembly name behind this request, without any `fx/` prefix.
    pub fn assembly_name(&self) -> &str {
        assembly_name(&self.name)
    }
}

impl fmt::Display for LibraryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(range) = &self.version_range {
            write!(f, " {}", range)?;
        }
        Ok(())
    }
}

/// Strip the framework prefix from a library name.
pub fn assembly_name(name: &str) -> &str {
    name.strip_prefix(FRAMEWORK_PREFIX).unwrap_or(name)
}

/// A resolved identity. Platform references may be versionless.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LibraryIdentity {
    name: String,
    version: Option<Version>,
    framework_reference: bool,
}

impl LibraryIdentity {
    pub fn new(name: impl Into<String>, version: Option<Version>, framework_reference: bool) -> Self {
        LibraryIdentity {
            name: name.into(),
            version,
            framework_reference,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn is_framework_reference(&self) -> bool {
        self.framework_reference
    }
}

impl fmt::Display for LibraryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} v{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One edge of the dependency graph before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryDependency {
    range: LibraryRange,
}

impl LibraryDependency {
    pub fn new(range: LibraryRange) -> Self {
        LibraryDependency { range }
    }

    pub fn range(&self) -> &LibraryRange {
        &self.range
    }

    pub fn name(&self) -> &str {
        self.range.name()
    }
}

impl From<LibraryRange> for LibraryDependency {
    fn from(range: LibraryRange) -> Self {
        LibraryDependency::new(range)
    }
}

/// The kind of source a library was resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LibraryKind {
    Package,
    Project,
    ReferenceAssembly,
    GlobalAssemblyCache,
    Unresolved,
    /// A kind recorded by some other tool. Exports as nothing.
    Other(String),
}

impl LibraryKind {
    pub fn as_str(&self) -> &str {
        match self {
            LibraryKind::Package => "Package",
            LibraryKind::Project => "Project",
            LibraryKind::ReferenceAssembly => "ReferenceAssembly",
            LibraryKind::GlobalAssemblyCache => "GlobalAssemblyCache",
            LibraryKind::Unresolved => "Unresolved",
            LibraryKind::Other(kind) => kind,
        }
    }
}

impl FromStr for LibraryKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Package" => LibraryKind::Package,
            "Project" => LibraryKind::Project,
            "ReferenceAssembly" => LibraryKind::ReferenceAssembly,
            "GlobalAssemblyCache" => LibraryKind::GlobalAssemblyCache,
            "Unresolved" => LibraryKind::Unresolved,
            other => LibraryKind::Other(other.to_string()),
        })
    }
}

impl fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LibraryKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A resolved node of the dependency graph.
///
/// `Unresolved` libraries are never marked resolved; the setters enforce it.
#[derive(Debug, Clone)]
pub struct RuntimeLibrary {
    requested_range: LibraryRange,
    identity: LibraryIdentity,
    kind: LibraryKind,
    dependencies: Vec<LibraryDependency>,
    assemblies: Vec<String>,
    framework: Option<FrameworkName>,
    path: Option<PathBuf>,
    resolved: bool,
    compatible: bool,
}

impl RuntimeLibrary {
    /// Create a library with no dependencies, assemblies or framework.
    pub fn new(requested_range: LibraryRange, identity: LibraryIdentity, kind: LibraryKind) -> Self {
        let resolved = kind != LibraryKind::Unresolved;
        RuntimeLibrary {
            requested_range,
            identity,
            kind,
            dependencies: Vec::new(),
            assemblies: Vec::new(),
            framework: None,
            path: None,
            resolved,
            compatible: true,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<LibraryDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_assemblies(mut self, assemblies: Vec<String>) -> Self {
        self.assemblies = assemblies;
        self
    }

    pub fn with_framework(mut self, framework: Option<FrameworkName>) -> Self {
        self.framework = framework;
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn requested_range(&self) -> &LibraryRange {
        &self.requested_range
    }

    pub fn identity(&self) -> &LibraryIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn kind(&self) -> &LibraryKind {
        &self.kind
    }

    pub fn dependencies(&self) -> &[LibraryDependency] {
        &self.dependencies
    }

    pub fn assemblies(&self) -> &[String] {
        &self.assemblies
    }

    pub fn framework(&self) -> Option<&FrameworkName> {
        self.framework.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Providers that find the identity before the artifact fill this in late.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn set_resolved(&mut self, resolved: bool) {
        self.resolved = resolved && self.kind != LibraryKind::Unresolved;
    }

    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    pub fn set_compatible(&mut self, compatible: bool) {
        self.compatible = compatible;
    }

    /// A serializable summary for reporting.
    pub fn to_library(&self) -> LibraryInfo {
        LibraryInfo {
            name: self.identity.name().to_string(),
            version: self.identity.version().map(|v| v.to_string()),
            path: self.path.clone(),
            kind: self.kind.clone(),
            dependencies: self.dependencies.iter().map(|d| d.name().to_string()).collect(),
            assemblies: self.assemblies.clone(),
            resolved: self.resolved,
            compatible: self.compatible,
        }
    }
}

impl fmt::Display for RuntimeLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.identity, self.kind)
    }
}

/// Flattened view of a [`RuntimeLibrary`].
#[derive(Debug, Clone, Serialize)]
pub struct LibraryInfo {
    pub name: String,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    #[serde(rename = "type")]
    pub kind: LibraryKind,
    pub dependencies: Vec<String>,
    pub assemblies: Vec<String>,
    pub resolved: bool,
    pub compatible: bool,
}
