//! Unresolved provider - the terminal fallback of the chain.

use anyhow::Result;

use crate::core::{FrameworkName, LibraryIdentity, LibraryKind, LibraryRange, RuntimeLibrary};
use crate::providers::DependencyProvider;

/// Answers every request with an `Unresolved` placeholder so the graph can
/// always be built. Missing dependencies are reported by a later
/// validation pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnresolvedProvider;

impl UnresolvedProvider {
    pub fn new() -> Self {
        UnresolvedProvider
    }

    /// Infallible form of `get_description`.
    pub fn describe(&self, range: &LibraryRange) -> RuntimeLibrary {
        let identity = LibraryIdentity::new(
            range.name(),
            range.version_range().and_then(|r| r.min_version()),
            range.is_framework_reference(),
        );

        RuntimeLibrary::new(range.clone(), identity, LibraryKind::Unresolved)
    }
}

impl DependencyProvider for UnresolvedProvider {
    fn name(&self) -> &str {
        "unresolved"
    }

    fn get_description(
        &self,
        range: &LibraryRange,
        _framework: &FrameworkName,
    ) -> Result<Option<RuntimeLibrary>> {
        Ok(Some(self.describe(range)))
    }

    fn initialize(&self, _libraries: &[RuntimeLibrary], _framework: &FrameworkName, _rid: Option<&str>) {}

    fn attempted_paths(&self, _framework: &FrameworkName) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VersionRange;
    use semver::Version;

    #[test]
    fn test_never_declines() {
        let provider = UnresolvedProvider::new();
        let framework = FrameworkName::parse("dnx451").unwrap();

        for range in [
            LibraryRange::new("Newtonsoft.Json"),
            LibraryRange::framework_reference("System.Xml"),
            LibraryRange::new("Utils").with_version_range(VersionRange::parse("[1.0,2.0)").unwrap()),
        ] {
            let lib = provider.get_description(&range, &framework).unwrap().unwrap();
            assert_eq!(lib.kind(), &LibraryKind::Unresolved);
            assert!(!lib.is_resolved());
            assert!(lib.assemblies().is_empty());
            assert!(lib.path().is_none());
            assert_eq!(lib.name(), range.name());
            assert_eq!(lib.identity().is_framework_reference(), range.is_framework_reference());
        }

        assert!(provider.attempted_paths(&framework).is_empty());
    }

    #[test]
    fn test_identity_uses_minimum_version() {
        let range = LibraryRange::new("Newtonsoft.Json")
            .with_version_range(VersionRange::parse("6.0").unwrap());
        let lib = UnresolvedProvider::new().describe(&range);

        assert_eq!(lib.identity().version(), Some(&Version::new(6, 0, 0)));
        assert_eq!(lib.requested_range(), &range);
    }
}
