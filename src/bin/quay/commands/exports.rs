//! `quay exports` command

use anyhow::Result;

use crate::cli::{ExportsArgs, GlobalArgs};
use quay::ops::{export, ExportOptions};

pub fn execute(args: ExportsArgs, global: &GlobalArgs) -> Result<()> {
    let (_gctx, ctx) = super::open(global)?;

    let opts = ExportOptions {
        all: args.all,
        include_projects: args.include_projects,
        aspect: args.aspect,
    };
    let export = export(&ctx, &args.name, &opts)?;

    if global.json {
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    let Some(export) = export else {
        println!("`{}` has no export for {}", args.name, ctx.framework());
        return Ok(());
    };

    if export.is_empty() {
        println!("`{}` contributes nothing for {}", args.name, ctx.framework());
        return Ok(());
    }

    if export.has_metadata() {
        println!("metadata:");
        for reference in export.metadata_references() {
            println!("  {} {}", reference.name, reference.path.display());
        }
    }

    let sources: Vec<_> = export.source_references().collect();
    if !sources.is_empty() {
        println!("sources:");
        for path in sources {
            println!("  {}", path.display());
        }
    }

    Ok(())
}
