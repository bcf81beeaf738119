use crate::ctx::Ctx;
use crate::labels::{LabelRegistry, METRIC_NAMES};
use crate::metrics::HecMetrics;
use crate::ranking::Ranking;

/// HEC x metric table; undefined values print as `nan`.
pub fn format_metrics_table(registry: &LabelRegistry, metrics: &HecMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<20}", "hec"));
    for name in METRIC_NAMES {
        out.push_str(&format!("\t{name:>10}"));
    }
    out.push('\n');
    for (hec, tuple) in registry.hecs().iter().zip(metrics.iter()) {
        out.push_str(&format!("{:<20}", hec.name));
        for value in tuple.values() {
            match value {
                Some(v) => out.push_str(&format!("\t{v:>10.4}")),
                None => out.push_str(&format!("\t{:>10}", "nan")),
            }
        }
        out.push('\n');
    }
    out
}

pub fn format_case_summary(ctx: &Ctx) -> String {
    let version = env!("CARGO_PKG_VERSION");
    let mut out = String::new();
    out.push_str(&format!("kira-segeval v{}\n", version));
    out.push_str(&format!("Case: {}\n", ctx.case_name));
    if let Some(ann) = &ctx.annotations {
        out.push_str(&format!(
            "Delineations: {} across {} structures\n",
            ann.total_delineations(),
            ann.structures.len()
        ));
    }
    if !ctx.sample_paths.is_empty() {
        out.push_str(&format!(
            "Samples: {} (policy={})\n",
            ctx.sample_paths.len(),
            ctx.options.policy.name()
        ));
    }
    for path in &ctx.consensus_paths {
        out.push_str(&format!("Consensus: {}\n", path.display()));
    }
    if let Some(deltas) = &ctx.deltas {
        out.push_str(&format!(
            "Deltas: {} samples -> {}\n",
            deltas.len(),
            ctx.output.deltas_json.display()
        ));
    }
    out
}

pub fn format_ranking(ranking: &Ranking) -> String {
    let mut out = String::new();
    for team in ranking.sorted() {
        out.push_str(&format!(
            "{:>3}  {:<24} mean_rank={:.4} mean_dice={:.4} mean_sd={:.4}\n",
            team.final_rank, team.team, team.mean_rank, team.mean_dice, team.mean_sd
        ));
    }
    if ranking.unresolved_ties.is_empty() {
        out.push_str("Ties: none\n");
    } else {
        for group in &ranking.unresolved_ties {
            out.push_str(&format!("Ties: {}\n", group.join(", ")));
        }
    }
    out
}
