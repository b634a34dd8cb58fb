//! `quay paths` command

use anyhow::{bail, Result};

use crate::cli::{GlobalArgs, PathsArgs};
use quay::ops::first_not_found;
use quay::resolver::LibraryGraph;

pub fn execute(args: PathsArgs, global: &GlobalArgs) -> Result<()> {
    let (_gctx, ctx) = super::open(global)?;

    let attempted = ctx.attempted_paths();
    if global.json {
        println!("{}", serde_json::to_string_pretty(&attempted)?);
    } else {
        for path in &attempted {
            println!("{}", path);
        }
    }

    let Some(name) = args.name else {
        return Ok(());
    };

    let libraries = ctx.resolve(&name)?;
    if let Some(err) = first_not_found(&ctx, &libraries) {
        let library = err.library.clone();
        eprintln!("{:?}", miette::Report::new(err));
        bail!("`{}` could not be resolved", library);
    }

    if let Some(library) = libraries.get_library(&name) {
        match library.path() {
            Some(path) => tracing::info!("`{}` resolved to {}", library, path.display()),
            None => tracing::info!("`{}` resolved", library),
        }
    }
    Ok(())
}
