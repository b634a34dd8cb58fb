//! Dependency resolution.
//!
//! The walker drives the provider chain breadth first from a root request
//! and records every library it meets in a [`LibraryManager`]. A name is
//! resolved once; later requests for the same name reuse the first result.
//! There is no version conflict arbitration.

pub mod resolve;

pub use resolve::{LibraryGraph, LibraryManager};

use std::collections::{HashMap, VecDeque};

use anyhow::Result;

use crate::core::{FrameworkName, LibraryRange};
use crate::providers::ProviderChain;

/// Resolve `root` and its transitive dependencies for `framework`.
///
/// The final library set is handed to every provider through
/// [`ProviderChain::initialize`].
pub fn resolve_closure(
    chain: &ProviderChain,
    root: &LibraryRange,
    framework: &FrameworkName,
    runtime_identifier: Option<&str>,
) -> Result<LibraryManager> {
    let mut manager = LibraryManager::new();
    // Requested name (lowercased) -> name of the library it resolved to
    let mut visited: HashMap<String, String> = HashMap::new();
    let mut queue: VecDeque<(Option<String>, LibraryRange)> = VecDeque::new();
    queue.push_back((None, root.clone()));

    while let Some((parent, range)) = queue.pop_front() {
        let key = range.name().to_ascii_lowercase();
        let target = match visited.get(&key) {
            Some(name) => name.clone(),
            None => {
                let name = if manager.contains(range.name()) {
                    range.name().to_string()
                } else {
                    let library = chain.resolve(&range, framework)?;
                    let name = library.name().to_string();
                    if !manager.contains(&name) {
                        for dependency in library.dependencies() {
                            queue.push_back((Some(name.clone()), dependency.range().clone()));
                        }
                        manager.add_library(library);
                    }
                    name
                };
                visited.insert(key, name.clone());
                name
            }
        };

        if let Some(parent) = parent.filter(|p| !p.eq_ignore_ascii_case(&target)) {
            manager.add_edge(&parent, &target);
        }
    }

    tracing::debug!(
        "resolved {} librar{} for `{}` on {}",
        manager.len(),
        if manager.len() == 1 { "y" } else { "ies" },
        root,
        framework.short_name()
    );

    chain.initialize(manager.libraries(), framework, runtime_identifier);
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LibraryKind;
    use crate::providers::{FileSystemProjectResolver, ProjectReferenceProvider};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_project(root: &std::path::Path, name: &str, json: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("project.json"), json).unwrap();
    }

    #[test]
    fn test_resolve_closure() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            "App",
            r#"{ "dependencies": { "Utils": "1.0.0", "Newtonsoft.Json": "6.0" },
                 "frameworks": { "dnxcore50": {} } }"#,
        );
        write_project(
            tmp.path(),
            "Utils",
            r#"{ "dependencies": { "Newtonsoft.Json": "6.0" }, "frameworks": { "dnxcore50": {} } }"#,
        );

        let resolver = FileSystemProjectResolver::new(vec![tmp.path().to_path_buf()]);
        let provider = Arc::new(ProjectReferenceProvider::new(Arc::new(resolver)));
        let chain = ProviderChain::builder().project(provider.clone()).build();
        let framework = FrameworkName::parse("dnxcore50").unwrap();

        let manager = resolve_closure(&chain, &LibraryRange::new("App"), &framework, None).unwrap();

        let names: Vec<_> = manager.libraries().iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["App", "Utils", "Newtonsoft.Json"]);
        assert_eq!(
            manager.get_library("Newtonsoft.Json").unwrap().kind(),
            &LibraryKind::Unresolved
        );
        assert_eq!(manager.deps("Utils").len(), 1);
        assert_eq!(provider.dependencies().len(), 3);
    }

    #[test]
    fn test_renamed_project_is_resolved_once() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            "App",
            r#"{ "dependencies": { "Core": "" }, "frameworks": { "dnxcore50": {} } }"#,
        );
        // Depends on its own directory name under a different project name
        write_project(
            tmp.path(),
            "Core",
            r#"{ "name": "Core.Impl", "dependencies": { "Core": "" }, "frameworks": { "dnxcore50": {} } }"#,
        );

        let resolver = FileSystemProjectResolver::new(vec![tmp.path().to_path_buf()]);
        let provider = Arc::new(ProjectReferenceProvider::new(Arc::new(resolver)));
        let chain = ProviderChain::builder().project(provider).build();
        let framework = FrameworkName::parse("dnxcore50").unwrap();

        let manager = resolve_closure(&chain, &LibraryRange::new("App"), &framework, None).unwrap();

        let names: Vec<_> = manager.libraries().iter().map(|l| l.name()).collect();
        assert_eq!(names, vec!["App", "Core.Impl"]);
        let deps: Vec<_> = manager.deps("App").iter().map(|l| l.name()).collect();
        assert_eq!(deps, vec!["Core.Impl"]);
        assert!(manager.deps("Core.Impl").is_empty());
    }
}
