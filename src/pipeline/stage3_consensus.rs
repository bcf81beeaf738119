use anyhow::{Context, Result};

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::sampler::consensus::write_consensus;

pub struct Stage3Consensus;

impl Stage3Consensus {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Consensus {
    fn name(&self) -> &'static str {
        "stage3_consensus"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.consensus_modes.is_empty() {
            return Ok(());
        }
        let annotations = ctx
            .annotations
            .as_ref()
            .context("annotations not discovered")?;
        let written = write_consensus(annotations, &ctx.registry, &ctx.consensus_modes)?;
        ctx.consensus_paths.extend(written);
        Ok(())
    }
}
