use anyhow::Result;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::pipeline::Stage;
use crate::sampler::discover::discover_case;

pub struct Stage1Discover;

impl Stage1Discover {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Discover {
    fn name(&self) -> &'static str {
        "stage1_discover"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let annotations = discover_case(&ctx.case_dir, &ctx.registry)?;
        info!(
            case = %annotations.case_name,
            case_id = annotations.case_id,
            structures = annotations.structures.len(),
            delineations = annotations.total_delineations(),
            "annotations discovered"
        );
        for name in &annotations.skipped {
            ctx.warn(format!("skipped unrecognised file {name}"));
        }
        if ctx.options.verbose {
            for anomaly in annotations.annotator_anomalies() {
                warn!("{}", anomaly);
                ctx.warn(anomaly);
            }
        }
        ctx.annotations = Some(annotations);
        Ok(())
    }
}
