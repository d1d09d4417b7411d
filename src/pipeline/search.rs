use crate::pipeline::{align::align, prep::prep, seed::seed};
use crate::Args;

use nale::output::path_buf_ext::PathBufExt;

/// Runs the entire pipeline: prep, seed, align.
pub fn search(args: &Args) -> anyhow::Result<()> {
    // make sure we can write the results before doing any of the
    // expensive upstream work
    args.paths.results.open(true)?;

    tracing::info!("running prep");
    prep(args)?;

    tracing::info!("running seed");
    let (profiles, seed_map) = seed(args)?;

    tracing::info!("running align");
    align(args, Some(profiles), Some(seed_map))?;

    Ok(())
}
