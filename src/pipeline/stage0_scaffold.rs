use anyhow::{Context, Result};
use std::fs;
use tracing::info;

use crate::ctx::Ctx;
use crate::error::EvalError;
use crate::pipeline::Stage;

pub struct Stage0Scaffold;

impl Stage0Scaffold {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Scaffold {
    fn name(&self) -> &'static str {
        "stage0_scaffold"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if !ctx.case_dir.is_dir() {
            return Err(EvalError::config(format!(
                "case directory {} does not exist",
                ctx.case_dir.display()
            ))
            .into());
        }
        fs::create_dir_all(&ctx.output.samples_dir)
            .with_context(|| format!("failed to create {}", ctx.output.samples_dir.display()))?;
        info!(
            samples_dir = %ctx.output.samples_dir.display(),
            "output_dir_ready"
        );
        Ok(())
    }
}
