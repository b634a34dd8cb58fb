//! Post-resolution validation.
//!
//! Resolution never fails on a missing or incompatible library; this pass
//! reports them, along with every location the providers searched.

use crate::core::{LibraryKind, RuntimeLibrary};
use crate::ops::resolve::ResolveContext;
use crate::resolver::LibraryManager;
use crate::util::diagnostic::{suggestions, Diagnostic, LibraryNotFoundError};

/// One diagnostic per unresolved or incompatible library.
///
/// Unresolved libraries are errors; incompatible ones are warnings.
pub fn validate(ctx: &ResolveContext, libraries: &LibraryManager) -> Vec<Diagnostic> {
    let attempted = ctx.attempted_paths();
    let framework = ctx.framework().short_name();

    libraries
        .problems()
        .map(|library| {
            if is_unresolved(library) {
                let mut diag = Diagnostic::error(format!(
                    "could not find `{}` for {}",
                    library.requested_range(),
                    framework
                ));
                for path in &attempted {
                    diag = diag.with_context(format!("searched {}", path));
                }
                diag.with_suggestion(suggestions::LIBRARY_NOT_FOUND)
            } else {
                let mut diag = Diagnostic::warning(format!(
                    "`{}` does not support {}",
                    library.identity(),
                    framework
                ));
                if let Some(path) = library.path() {
                    diag = diag.with_location(path);
                }
                diag.with_suggestion(suggestions::INCOMPATIBLE)
            }
        })
        .collect()
}

/// A miette error for the first unresolved library, if any.
pub fn first_not_found(ctx: &ResolveContext, libraries: &LibraryManager) -> Option<LibraryNotFoundError> {
    libraries
        .problems()
        .find(|library| is_unresolved(library))
        .map(|library| {
            LibraryNotFoundError::new(
                library.name(),
                ctx.framework().short_name(),
                &ctx.attempted_paths(),
            )
        })
}

/// Unresolved placeholders and projects without a matching framework.
fn is_unresolved(library: &RuntimeLibrary) -> bool {
    !library.is_resolved() && library.kind() != &LibraryKind::Project
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::resolve::ResolveOptions;
    use crate::util::Config;
    use tempfile::TempDir;

    #[test]
    fn test_reports_missing_and_incompatible() {
        let tmp = TempDir::new().unwrap();
        for (name, json) in [
            ("App", r#"{ "dependencies": { "Legacy": "", "Newtonsoft.Json": "6.0" }, "frameworks": { "dnxcore50": {} } }"#),
            ("Legacy", r#"{ "frameworks": { "net45": {} } }"#),
        ] {
            let dir = tmp.path().join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("project.json"), json).unwrap();
        }

        let opts = ResolveOptions {
            framework: Some("dnxcore50".to_string()),
            ..Default::default()
        };
        let ctx = ResolveContext::new(tmp.path(), &Config::default(), &opts).unwrap();
        let libraries = ctx.resolve("App").unwrap();

        let diagnostics = validate(&ctx, &libraries);
        assert_eq!(diagnostics.len(), 2);

        assert!(!diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("`Legacy v1.0.0` does not support dnxcore50"));

        assert!(diagnostics[1].is_error());
        assert!(diagnostics[1].message.contains("Newtonsoft.Json"));
        assert_eq!(diagnostics[1].context.len(), 3);

        let err = first_not_found(&ctx, &libraries).unwrap();
        assert_eq!(err.library, "Newtonsoft.Json");
    }
}
