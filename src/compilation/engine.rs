//! Compilation engines.
//!
//! An engine turns a [`CompilationTarget`] into a [`CompiledUnit`]: either a
//! binary on disk or the set of sources a caller should compile itself.
//! Engines also report input file changes so cached exports can be dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::compilation::errors::ExportError;
use crate::compilation::fingerprint::SourceFingerprint;
use crate::core::{CompilationTarget, Project};
use crate::providers::ProjectResolver;

/// Callback invoked with the path of a changed input file.
pub type InputChangedCallback = Box<dyn Fn(&Path) + Send + Sync>;

/// Cooperative cancellation flag shared between a caller and an engine.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The result of compiling a project for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    pub name: String,
    /// The compiled binary, when one exists.
    pub output: Option<PathBuf>,
    pub sources: Vec<PathBuf>,
}

/// Compiles projects on demand.
pub trait CompilationEngine: Send + Sync {
    /// Compile `target`. Returns `ExportError::Cancelled` if `cancel` fires
    /// before the unit is complete.
    fn compile_and_load(
        &self,
        target: &CompilationTarget,
        cancel: &CancellationToken,
    ) -> Result<CompiledUnit, ExportError>;

    /// Register a callback for input file changes.
    fn on_input_file_changed(&self, callback: InputChangedCallback);
}

struct Tracked {
    project: Arc<Project>,
    fingerprint: SourceFingerprint,
}

/// An engine that never invokes a compiler.
///
/// It reports the prebuilt binary at
/// `{project}/bin/{configuration}/{tfm}/{name}.dll` when present, otherwise
/// only the project's sources. Changes are detected by polling with
/// [`ProjectSourceEngine::refresh`].
pub struct ProjectSourceEngine {
    resolver: Arc<dyn ProjectResolver>,
    tracked: Mutex<HashMap<CompilationTarget, Tracked>>,
    listeners: Mutex<Vec<InputChangedCallback>>,
}

impl ProjectSourceEngine {
    pub fn new(resolver: Arc<dyn ProjectResolver>) -> Self {
        ProjectSourceEngine {
            resolver,
            tracked: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Where the binary for `target` is expected.
    pub fn output_path(project: &Project, target: &CompilationTarget) -> PathBuf {
        let file_name = match target.aspect() {
            Some(aspect) => format!("{}.{}.dll", project.name(), aspect),
            None => format!("{}.dll", project.name()),
        };

        project
            .project_directory()
            .join("bin")
            .join(target.configuration())
            .join(target.framework().short_name())
            .join(file_name)
    }

    /// Re-fingerprint every compiled target and notify listeners of each
    /// changed file. Returns the changed files.
    pub fn refresh(&self) -> Result<Vec<PathBuf>, ExportError> {
        let mut changed = Vec::new();

        {
            let mut tracked = self.tracked.lock().unwrap();
            for (target, entry) in tracked.iter_mut() {
                let sources = entry.project.source_files()?;
                let current = SourceFingerprint::compute(sources.iter().map(PathBuf::as_path))?;
                let files = entry.fingerprint.changed_files(&current);
                if !files.is_empty() {
                    tracing::debug!("{} input file(s) of {} changed", files.len(), target);
                    entry.fingerprint = current;
                    changed.extend(files);
                }
            }
        }

        changed.sort();
        changed.dedup();

        let listeners = self.listeners.lock().unwrap();
        for path in &changed {
            for listener in listeners.iter() {
                listener(path);
            }
        }

        Ok(changed)
    }
}

impl CompilationEngine for ProjectSourceEngine {
    fn compile_and_load(
        &self,
        target: &CompilationTarget,
        cancel: &CancellationToken,
    ) -> Result<CompiledUnit, ExportError> {
        let cancelled = || ExportError::Cancelled {
            name: target.name().to_string(),
        };

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let project = self
            .resolver
            .try_resolve_project(target.name())?
            .ok_or_else(|| ExportError::ProjectNotFound {
                name: target.name().to_string(),
            })?;

        let sources = project.source_files()?;
        let fingerprint = SourceFingerprint::compute(sources.iter().map(PathBuf::as_path))?;

        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let output = Some(Self::output_path(&project, target)).filter(|p| p.is_file());
        tracing::debug!(
            "compiled {}: {} source(s), binary: {}",
            target,
            sources.len(),
            output.is_some()
        );

        self.tracked.lock().unwrap().insert(
            target.clone(),
            Tracked {
                project: Arc::clone(&project),
                fingerprint,
            },
        );

        Ok(CompiledUnit {
            name: project.name().to_string(),
            output,
            sources,
        })
    }

    fn on_input_file_changed(&self, callback: InputChangedCallback) {
        self.listeners.lock().unwrap().push(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameworkName;
    use crate::providers::FileSystemProjectResolver;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ProjectSourceEngine, CompilationTarget) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Utils");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("project.json"), r#"{ "frameworks": { "net45": {} } }"#).unwrap();
        std::fs::write(dir.join("Strings.cs"), "class Strings {}").unwrap();

        let resolver = FileSystemProjectResolver::new(vec![tmp.path().to_path_buf()]);
        let engine = ProjectSourceEngine::new(Arc::new(resolver));
        let target = CompilationTarget::new("Utils", FrameworkName::parse("net45").unwrap(), "Debug");
        (tmp, engine, target)
    }

    #[test]
    fn test_sources_without_binary() {
        let (tmp, engine, target) = setup();

        let unit = engine.compile_and_load(&target, &CancellationToken::new()).unwrap();
        assert_eq!(unit.name, "Utils");
        assert_eq!(unit.output, None);
        assert_eq!(unit.sources, vec![tmp.path().join("Utils/Strings.cs")]);
    }

    #[test]
    fn test_prebuilt_binary() {
        let (tmp, engine, target) = setup();
        let bin = tmp.path().join("Utils/bin/Debug/net45");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("Utils.dll"), b"MZ").unwrap();

        let unit = engine.compile_and_load(&target, &CancellationToken::new()).unwrap();
        assert_eq!(unit.output, Some(bin.join("Utils.dll")));

        let test_target = target.with_aspect(Some("test"));
        let unit = engine.compile_and_load(&test_target, &CancellationToken::new()).unwrap();
        assert_eq!(unit.output, None);
    }

    #[test]
    fn test_cancelled() {
        let (_tmp, engine, target) = setup();
        let token = CancellationToken::new();
        token.cancel();

        let err = engine.compile_and_load(&target, &token).unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_missing_project() {
        let (_tmp, engine, target) = setup();
        let missing = CompilationTarget::new("Nope", target.framework().clone(), "Debug");

        let err = engine.compile_and_load(&missing, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, ExportError::ProjectNotFound { .. }));
    }

    #[test]
    fn test_refresh_notifies_changes() {
        let (tmp, engine, target) = setup();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        engine.on_input_file_changed(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        engine.compile_and_load(&target, &CancellationToken::new()).unwrap();
        assert!(engine.refresh().unwrap().is_empty());

        std::fs::write(tmp.path().join("Utils/Strings.cs"), "class Strings { }").unwrap();
        let changed = engine.refresh().unwrap();
        assert_eq!(changed, vec![tmp.path().join("Utils/Strings.cs")]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
