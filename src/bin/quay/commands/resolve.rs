//! `quay resolve` command

use std::collections::HashSet;

use anyhow::{bail, Result};

use crate::cli::{GlobalArgs, ResolveArgs};
use quay::core::{LibraryInfo, RuntimeLibrary};
use quay::ops::validate;
use quay::resolver::{LibraryGraph, LibraryManager};
use quay::util::diagnostic::emit;

pub fn execute(args: ResolveArgs, global: &GlobalArgs) -> Result<()> {
    let (gctx, ctx) = super::open(global)?;
    let libraries = ctx.resolve(&args.name)?;

    if global.json {
        let infos: Vec<LibraryInfo> = libraries.libraries().iter().map(|l| l.to_library()).collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else if args.flat {
        for library in libraries.get_library_dependencies(&args.name) {
            println!("{}{}", library, status(library));
        }
    } else {
        let mut seen = HashSet::new();
        print_tree(
            &libraries,
            &args.name,
            0,
            args.depth.unwrap_or(usize::MAX),
            &mut seen,
        );
    }

    let diagnostics = validate(&ctx, &libraries);
    for diag in &diagnostics {
        emit(diag, gctx.color());
    }

    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        bail!("{} unresolved librar{} in `{}`", errors, if errors == 1 { "y" } else { "ies" }, args.name);
    }
    Ok(())
}

fn print_tree(
    libraries: &LibraryManager,
    name: &str,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<String>,
) {
    let Some(library) = libraries.get_library(name) else {
        return;
    };
    if depth > max_depth {
        return;
    }

    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    };

    let is_duplicate = !seen.insert(library.name().to_lowercase());
    let dup_marker = if is_duplicate { " (*)" } else { "" };
    println!("{}{}{}{}", prefix, library, status(library), dup_marker);

    if is_duplicate {
        return;
    }
    for dep in libraries.deps(library.name()) {
        print_tree(libraries, dep.name(), depth + 1, max_depth, seen);
    }
}

fn status(library: &RuntimeLibrary) -> &'static str {
    if !library.is_resolved() {
        " (unresolved)"
    } else if !library.is_compatible() {
        " (incompatible)"
    } else {
        ""
    }
}
