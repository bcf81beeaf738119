use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::json_writer::write_json;
use crate::pipeline::Stage;
use crate::schema::v1::{DeltaReport, PairReport};

pub struct Stage5Output;

impl Stage5Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Output {
    fn name(&self) -> &'static str {
        "stage5_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let Some(deltas) = ctx.deltas.as_ref() else {
            return Ok(());
        };
        let matrix = ctx.pair_matrix.as_ref().context("pair matrix missing")?;
        let samples: Vec<String> = ctx
            .sample_paths
            .iter()
            .map(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            })
            .collect();

        let report = DeltaReport::new(&ctx.case_name, &ctx.registry, samples.clone(), deltas.clone());
        write_json(&ctx.output.deltas_json, &report)?;
        info!(path = %ctx.output.deltas_json.display(), "deltas written");

        let pairs = PairReport::new(&ctx.case_name, &ctx.registry, samples, matrix.to_rows());
        write_json(&ctx.output.all_pairs_json, &pairs)?;
        info!(path = %ctx.output.all_pairs_json.display(), "all pairs written");
        Ok(())
    }
}
