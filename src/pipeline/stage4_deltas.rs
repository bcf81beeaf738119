use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::deltas::{all_pairs, compute_deltas};
use crate::pipeline::Stage;
use crate::sampler::list_samples;

pub struct Stage4Deltas;

impl Stage4Deltas {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Deltas {
    fn name(&self) -> &'static str {
        "stage4_deltas"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.sample_paths.is_empty() {
            ctx.sample_paths = list_samples(
                &ctx.output.samples_dir,
                ctx.options.suffix.as_deref(),
                None,
            )?;
        }
        if let Some(max) = ctx.max_samples {
            ctx.sample_paths.truncate(max);
        }
        info!(
            case = %ctx.case_name,
            samples = ctx.sample_paths.len(),
            "computing deltas"
        );
        let matrix = all_pairs(&ctx.sample_paths, &ctx.registry, ctx.delta_threads)?;
        ctx.deltas = Some(compute_deltas(&matrix));
        ctx.pair_matrix = Some(matrix);
        Ok(())
    }
}
