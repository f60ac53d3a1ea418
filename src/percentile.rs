use crate::aggregate::PlayerSeason;
use crate::error::{WarningKind, Warnings};
use crate::model::StatLine;
use crate::registry::{Flavor, Polarity, Role, stats_for};

/// Average-rank percentile of every value in `values`.
///
/// Values are ranked after applying `polarity`, ties share the mean of their
/// ranks, and the result is `100 * (rank - 1) / (n - 1)` with `n` the number
/// of non-null values. A lone value scores 50; null stays null.
pub fn percentile_column(values: &[Option<f64>], polarity: Polarity) -> Vec<Option<f64>> {
    let mut order: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| v.filter(|x| x.is_finite()).map(|x| (idx, polarity.apply(x))))
        .collect();
    let mut out = vec![None; values.len()];
    let n = order.len();
    if n == 0 {
        return out;
    }
    if n == 1 {
        out[order[0].0] = Some(50.0);
        return out;
    }
    order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let denom = (n - 1) as f64;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && order[end].1 == order[start].1 {
            end += 1;
        }
        // 1-based ranks start+1 ..= end share their mean.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let pct = 100.0 * (avg_rank - 1.0) / denom;
        for (idx, _) in &order[start..end] {
            out[*idx] = Some(pct);
        }
        start = end;
    }
    out
}

/// Percentile row for one player; `index` points into the aggregated players.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPercentiles {
    pub index: usize,
    pub role: Role,
    pub centiles: StatLine,
}

/// Players of `role` that belong to its percentile population.
pub fn role_population(players: &[PlayerSeason], role: Role, min_minutes: u32) -> Vec<usize> {
    players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.role == role && p.minutes > 0 && p.minutes >= min_minutes)
        .map(|(idx, _)| idx)
        .collect()
}

/// Ranks every per-90 stat of `flavor` within each role population.
///
/// Output rows keep the order of `players`.
pub fn compute_percentiles(
    players: &[PlayerSeason],
    flavor: Flavor,
    min_minutes: u32,
    scope: &str,
    warnings: &mut Warnings,
) -> Vec<PlayerPercentiles> {
    let mut rows: Vec<PlayerPercentiles> = Vec::new();
    for &role in flavor.roles() {
        let members = role_population(players, role, min_minutes);
        if members.is_empty() {
            warnings.push(
                WarningKind::PopulationEmpty,
                scope,
                None,
                format!("no {role} players with at least {min_minutes} minutes"),
            );
            continue;
        }
        let first = rows.len();
        rows.extend(members.iter().map(|&index| PlayerPercentiles {
            index,
            role,
            centiles: StatLine::new(),
        }));

        let mut column = Vec::with_capacity(members.len());
        for def in stats_for(flavor) {
            column.clear();
            column.extend(members.iter().map(|&idx| players[idx].per90.get(def.id)));
            if column.iter().all(Option::is_none) {
                if role.feature_set().contains(&def.id) {
                    warnings.push(
                        WarningKind::PopulationEmpty,
                        scope,
                        None,
                        format!("{role}: no values for {}", def.name),
                    );
                }
                continue;
            }
            let ranked = percentile_column(&column, def.polarity);
            for (row, pct) in rows[first..].iter_mut().zip(ranked) {
                row.centiles.set(def.id, pct);
            }
        }
    }
    rows.sort_by_key(|r| r.index);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn extremes_map_to_zero_and_hundred() {
        let out = percentile_column(&col(&[3.0, 1.0, 2.0]), Polarity::HigherBetter);
        assert_eq!(out, vec![Some(100.0), Some(0.0), Some(50.0)]);
        let inv = percentile_column(&col(&[3.0, 1.0, 2.0]), Polarity::LowerBetter);
        assert_eq!(inv, vec![Some(0.0), Some(100.0), Some(50.0)]);
    }

    #[test]
    fn ties_share_average_rank() {
        let out = percentile_column(&col(&[5.0, 5.0, 5.0, 10.0]), Polarity::HigherBetter);
        let tied = 100.0 * (2.0 - 1.0) / 3.0;
        assert_eq!(out[0], Some(tied));
        assert_eq!(out[1], Some(tied));
        assert_eq!(out[3], Some(100.0));
    }

    #[test]
    fn nulls_are_skipped_and_singletons_score_fifty() {
        let out = percentile_column(&[None, Some(4.0), None], Polarity::HigherBetter);
        assert_eq!(out, vec![None, Some(50.0), None]);
        let empty = percentile_column(&[None, None], Polarity::LowerBetter);
        assert_eq!(empty, vec![None, None]);
    }

    #[test]
    fn signed_zero_ties_with_zero() {
        let out = percentile_column(&col(&[0.0, -0.0, 1.0]), Polarity::LowerBetter);
        assert_eq!(out[0], out[1]);
    }
}
