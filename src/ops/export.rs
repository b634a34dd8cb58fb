//! Export operations.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::LibraryExport;
use crate::ops::resolve::ResolveContext;

/// Which export of a library to produce.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Include the transitive dependency closure
    pub all: bool,

    /// Projects contribute sources instead of compiled output (implies `all`)
    pub include_projects: bool,

    /// Build variant of the root project
    pub aspect: Option<String>,
}

/// Resolve `name` and export it.
///
/// `Ok(None)` when the export is absent, such as a platform assembly the
/// target framework does not ship.
pub fn export(ctx: &ResolveContext, name: &str, opts: &ExportOptions) -> Result<Option<LibraryExport>> {
    let libraries = Arc::new(ctx.resolve(name)?);
    let exporter = ctx.exporter(libraries);
    let aspect = opts.aspect.as_deref();

    let export = if opts.include_projects {
        if aspect.is_some() {
            tracing::warn!("--aspect is ignored with --include-projects");
        }
        exporter.get_all_exports_with_projects(name, true)
    } else if opts.all {
        exporter.get_all_exports_for_aspect(name, aspect)
    } else {
        exporter.get_library_export_for_aspect(name, aspect)
    };

    export.with_context(|| format!("failed to export `{}`", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::resolve::ResolveOptions;
    use crate::util::Config;
    use std::path::Path;
    use tempfile::TempDir;

    fn workspace() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for (name, json) in [
            ("App", r#"{ "dependencies": { "Utils": "" }, "frameworks": { "dnxcore50": {} } }"#),
            ("Utils", r#"{ "frameworks": { "dnxcore50": {} } }"#),
        ] {
            let dir = tmp.path().join("src").join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("project.json"), json).unwrap();
            std::fs::write(dir.join(format!("{}.cs", name)), "class C {}").unwrap();
        }

        let bin = tmp.path().join("src/Utils/bin/Debug/dnxcore50");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("Utils.dll"), b"MZ").unwrap();
        tmp
    }

    fn context(root: &Path) -> ResolveContext {
        let opts = ResolveOptions {
            framework: Some("dnxcore50".to_string()),
            ..Default::default()
        };
        ResolveContext::new(root, &Config::default(), &opts).unwrap()
    }

    #[test]
    fn test_single_and_all() {
        let tmp = workspace();
        let ctx = context(tmp.path());

        let single = export(&ctx, "App", &ExportOptions::default()).unwrap().unwrap();
        assert_eq!(single.metadata_references().count(), 0);
        assert_eq!(
            single.source_references().collect::<Vec<_>>(),
            vec![tmp.path().join("src/App/App.cs").as_path()]
        );

        let all = ExportOptions {
            all: true,
            ..Default::default()
        };
        let merged = export(&ctx, "App", &all).unwrap().unwrap();
        let metadata: Vec<_> = merged.metadata_references().map(|r| r.path.clone()).collect();
        assert_eq!(metadata, vec![tmp.path().join("src/Utils/bin/Debug/dnxcore50/Utils.dll")]);
        assert_eq!(merged.source_references().count(), 1);
    }

    #[test]
    fn test_include_projects() {
        let tmp = workspace();
        let ctx = context(tmp.path());
        let opts = ExportOptions {
            include_projects: true,
            ..Default::default()
        };

        let merged = export(&ctx, "App", &opts).unwrap().unwrap();
        assert!(!merged.has_metadata());
        assert_eq!(merged.source_references().count(), 2);
    }
}
