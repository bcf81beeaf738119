use std::path::Path;

use anyhow::{Context, Result};

use crate::error::EvalError;
use crate::ranking::{ParticipantRow, Ranking};

pub const RANKING_HEADER: [&str; 6] = [
    "team_name",
    "final_rank",
    "mean_rank",
    "mean_dice",
    "mean_sd",
    "tumor_dice",
];

/// Summary table: header row, then `team,m1,...,m6` per team. Values are
/// higher-is-better.
pub fn read_summary_csv(path: &Path) -> Result<Vec<ParticipantRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (row_num, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("{}: failed to read row {}", path.display(), row_num + 1))?;
        let mut fields = record.iter();
        let team = fields
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EvalError::config(format!("row {}: missing team name", row_num + 1)))?
            .to_string();
        let metrics = fields
            .map(|f| {
                f.parse::<f64>().map_err(|_| {
                    EvalError::config(format!("row {}: invalid value '{}'", row_num + 1, f))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(ParticipantRow { team, metrics });
    }
    Ok(rows)
}

/// Writes teams sorted by final rank.
pub fn write_ranking_csv(path: &Path, ranking: &Ranking) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(RANKING_HEADER)?;
    for team in ranking.sorted() {
        writer.write_record([
            team.team.clone(),
            team.final_rank.to_string(),
            format!("{:.4}", team.mean_rank),
            format!("{:.8}", team.mean_dice),
            format!("{:.8}", team.mean_sd),
            format!("{:.8}", team.tumor_dice),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
