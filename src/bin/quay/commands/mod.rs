//! Command implementations

pub mod exports;
pub mod paths;
pub mod resolve;

use anyhow::Result;

use crate::cli::GlobalArgs;
use quay::ops::{ResolveContext, ResolveOptions};
use quay::util::GlobalContext;

/// Global context and a resolve context rooted at the project root.
pub fn open(global: &GlobalArgs) -> Result<(GlobalContext, ResolveContext)> {
    let mut gctx = GlobalContext::new()?;
    gctx.set_color(!global.no_color);

    let root = gctx.find_project_root();
    let config = gctx.load_config();
    let opts = ResolveOptions {
        framework: global.framework.clone(),
        configuration: global.configuration.clone(),
    };

    let ctx = ResolveContext::new(&root, &config, &opts)?;
    Ok((gctx, ctx))
}
