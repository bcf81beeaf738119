//! Rank-then-aggregate over per-team summary metrics, with tumor Dice as the
//! tie-breaker.

use anyhow::Result;
use tracing::warn;

use crate::error::EvalError;
use crate::math::stats::{mean, median};

pub const SUMMARY_METRICS: usize = 6;
/// Columns `0..3` are overlap-style, `3..6` distance-style.
pub const OVERLAP_COLUMNS: std::ops::Range<usize> = 0..3;
pub const DISTANCE_COLUMNS: std::ops::Range<usize> = 3..6;
/// Tumor Dice.
pub const TIE_BREAK_COLUMN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregator {
    #[default]
    Mean,
    Median,
}

impl Aggregator {
    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Self::Mean => mean(values),
            Self::Median => median(&mut values.to_vec()),
        }
    }
}

/// Competition ranking ("min"): ties share the lowest rank of their block
/// and the next distinct value skips ahead, e.g. `[10, 20, 20, 30]`
/// ascending gives `[1, 2, 2, 4]`.
pub fn rank_min(values: &[f64], order: Order) -> Result<Vec<usize>, EvalError> {
    if let Some(pos) = values.iter().position(|v| v.is_nan()) {
        return Err(EvalError::config(format!("cannot rank NaN at position {pos}")));
    }
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| match order {
        Order::Ascending => values[a].total_cmp(&values[b]),
        Order::Descending => values[b].total_cmp(&values[a]),
    });
    let mut ranks = vec![0usize; values.len()];
    for (pos, &i) in idx.iter().enumerate() {
        ranks[i] = if pos > 0 && values[idx[pos - 1]] == values[i] {
            ranks[idx[pos - 1]]
        } else {
            pos + 1
        };
    }
    Ok(ranks)
}

/// `data[algorithm][metric]`, higher is better. Every column is ranked
/// descending, the ranks are aggregated per algorithm and the aggregates
/// ranked ascending. Returns `(final_rank, aggregated)`.
pub fn rank_then_aggregate(
    data: &[Vec<f64>],
    aggregator: Aggregator,
) -> Result<(Vec<usize>, Vec<f64>), EvalError> {
    let n_cols = data.first().map(|r| r.len()).unwrap_or(0);
    if data.iter().any(|r| r.len() != n_cols) {
        return Err(EvalError::config("rows have differing numbers of metrics"));
    }
    if !data.is_empty() && n_cols == 0 {
        return Err(EvalError::config("nothing to rank: rows have no metrics"));
    }

    let mut per_algo = vec![Vec::with_capacity(n_cols); data.len()];
    for col in 0..n_cols {
        let column: Vec<f64> = data.iter().map(|r| r[col]).collect();
        let ranks = rank_min(&column, Order::Descending)?;
        for (algo, r) in ranks.into_iter().enumerate() {
            per_algo[algo].push(r as f64);
        }
    }
    let aggregated: Vec<f64> = per_algo.iter().map(|r| aggregator.apply(r)).collect();
    let final_rank = rank_min(&aggregated, Order::Ascending)?;
    Ok((final_rank, aggregated))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRow {
    pub team: String,
    pub metrics: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTeam {
    pub team: String,
    pub final_rank: usize,
    pub mean_rank: f64,
    pub mean_dice: f64,
    pub mean_sd: f64,
    pub tumor_dice: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// In input order.
    pub teams: Vec<RankedTeam>,
    /// Groups of teams the tie-breaker could not separate.
    pub unresolved_ties: Vec<Vec<String>>,
}

impl Ranking {
    /// Teams by final rank; equal ranks keep input order.
    pub fn sorted(&self) -> Vec<&RankedTeam> {
        let mut out: Vec<&RankedTeam> = self.teams.iter().collect();
        out.sort_by_key(|t| t.final_rank);
        out
    }
}

pub fn rank_participants(rows: &[ParticipantRow], aggregator: Aggregator) -> Result<Ranking> {
    if rows.is_empty() {
        return Err(EvalError::config("summary has no teams").into());
    }
    let mut seen = std::collections::HashSet::new();
    for row in rows {
        if !seen.insert(row.team.as_str()) {
            return Err(EvalError::config(format!(
                "team name '{}' appears more than once",
                row.team
            ))
            .into());
        }
        if row.metrics.len() != SUMMARY_METRICS {
            return Err(EvalError::config(format!(
                "team '{}': expected {} metrics, got {}",
                row.team,
                SUMMARY_METRICS,
                row.metrics.len()
            ))
            .into());
        }
    }

    let summary: Vec<Vec<f64>> = rows
        .iter()
        .map(|r| vec![mean(&r.metrics[OVERLAP_COLUMNS]), mean(&r.metrics[DISTANCE_COLUMNS])])
        .collect();
    let (mut ranks, aggregated) = rank_then_aggregate(&summary, aggregator)?;
    let tertiary: Vec<f64> = rows.iter().map(|r| r.metrics[TIE_BREAK_COLUMN]).collect();
    let unresolved = break_ties(&mut ranks, &tertiary)?;

    let unresolved_ties = unresolved
        .into_iter()
        .map(|group| {
            let names: Vec<String> = group.iter().map(|&i| rows[i].team.clone()).collect();
            warn!(teams = ?names, "cannot untie teams; tumor Dice is identical");
            names
        })
        .collect();

    let teams = rows
        .iter()
        .enumerate()
        .map(|(i, row)| RankedTeam {
            team: row.team.clone(),
            final_rank: ranks[i],
            mean_rank: aggregated[i],
            mean_dice: summary[i][0],
            mean_sd: summary[i][1],
            tumor_dice: row.metrics[TIE_BREAK_COLUMN],
        })
        .collect();

    Ok(Ranking {
        teams,
        unresolved_ties,
    })
}

/// Walks ranks from 1 upwards. A rank shared by several teams is re-ranked
/// among them by `tertiary` (higher is better) and offset to start at that
/// rank. A partial split rescans the same rank; a group with identical
/// tertiary values is left tied and reported.
pub fn break_ties(ranks: &mut [usize], tertiary: &[f64]) -> Result<Vec<Vec<usize>>, EvalError> {
    let n = ranks.len();
    let mut unresolved = Vec::new();
    let mut rank = 1usize;
    while rank <= n {
        let members: Vec<usize> = (0..n).filter(|&i| ranks[i] == rank).collect();
        if members.len() <= 1 {
            rank += 1;
            continue;
        }
        let values: Vec<f64> = members.iter().map(|&i| tertiary[i]).collect();
        let sub = rank_min(&values, Order::Descending)?;
        let mut distinct = sub.clone();
        distinct.sort_unstable();
        distinct.dedup();

        for (&i, &s) in members.iter().zip(sub.iter()) {
            ranks[i] = s - 1 + rank;
        }
        if distinct.len() == 1 {
            unresolved.push(members);
            rank += 1;
        } else if distinct.len() == members.len() {
            rank += 1;
        }
    }
    Ok(unresolved)
}
