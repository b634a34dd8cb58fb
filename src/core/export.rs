//! Library exports - what a resolved library contributes to a compilation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// A compiled binary a compiler or loader can reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MetadataReference {
    pub name: String,
    pub path: PathBuf,
}

impl MetadataReference {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        MetadataReference {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// A source file to compile directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceReference {
    pub path: PathBuf,
}

impl SourceReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SourceReference { path: path.into() }
    }
}

/// The references one library (or a whole closure) contributes.
///
/// Both sets are deduplicated. An empty export means "nothing to
/// contribute" and is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryExport {
    metadata_references: BTreeSet<MetadataReference>,
    source_references: BTreeSet<SourceReference>,
}

impl LibraryExport {
    pub fn empty() -> Self {
        LibraryExport::default()
    }

    /// An export holding a single binary reference.
    pub fn from_metadata(reference: MetadataReference) -> Self {
        let mut export = LibraryExport::empty();
        export.add_metadata(reference);
        export
    }

    pub fn add_metadata(&mut self, reference: MetadataReference) {
        self.metadata_references.insert(reference);
    }

    pub fn add_source(&mut self, path: impl Into<PathBuf>) {
        self.source_references.insert(SourceReference::new(path));
    }

    /// Fold another export into this one.
    pub fn merge(&mut self, other: LibraryExport) {
        self.metadata_references.extend(other.metadata_references);
        self.source_references.extend(other.source_references);
    }

    pub fn metadata_references(&self) -> impl Iterator<Item = &MetadataReference> {
        self.metadata_references.iter()
    }

    pub fn source_references(&self) -> impl Iterator<Item = &Path> {
        self.source_references.iter().map(|s| s.path.as_path())
    }

    pub fn has_metadata(&self) -> bool {
        !self.metadata_references.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata_references.is_empty() && self.source_references.is_empty()
    }

    /// Keep only the binary references.
    pub fn into_metadata_only(self) -> Self {
        LibraryExport {
            metadata_references: self.metadata_references,
            source_references: BTreeSet::new(),
        }
    }

    /// Keep only the source references.
    pub fn into_sources_only(self) -> Self {
        LibraryExport {
            metadata_references: BTreeSet::new(),
            source_references: self.source_references,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_are_deduplicated() {
        let mut export = LibraryExport::empty();
        export.add_metadata(MetadataReference::new("System", "/fx/System.dll"));
        export.add_metadata(MetadataReference::new("System", "/fx/System.dll"));
        export.add_source("/src/a.cs");
        export.add_source("/src/a.cs");

        assert_eq!(export.metadata_references().count(), 1);
        assert_eq!(export.source_references().count(), 1);
    }

    #[test]
    fn test_merge() {
        let mut left = LibraryExport::from_metadata(MetadataReference::new("A", "/a.dll"));
        let mut right = LibraryExport::from_metadata(MetadataReference::new("B", "/b.dll"));
        right.add_metadata(MetadataReference::new("A", "/a.dll"));
        right.add_source("/b/src.cs");

        left.merge(right);
        assert_eq!(left.metadata_references().count(), 2);
        assert_eq!(left.source_references().collect::<Vec<_>>(), vec![Path::new("/b/src.cs")]);
    }

    #[test]
    fn test_empty_export() {
        let export = LibraryExport::empty();
        assert!(export.is_empty());
        assert!(!export.has_metadata());
    }
}
