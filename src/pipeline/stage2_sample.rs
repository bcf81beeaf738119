use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::sampler::generate_samples;

pub struct Stage2Sample;

impl Stage2Sample {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Sample {
    fn name(&self) -> &'static str {
        "stage2_sample"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let annotations = ctx
            .annotations
            .as_ref()
            .context("annotations not discovered")?;
        let paths = generate_samples(
            annotations,
            &ctx.registry,
            &ctx.options,
            &ctx.output.samples_dir,
        )?;
        ctx.sample_paths = paths;
        Ok(())
    }
}
