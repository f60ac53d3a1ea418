use crate::model::StatLine;
use crate::registry::{Domain, Flavor, Formula, StatKind, stats_for};

/// Minutes a keeper (or team) must play for a zero goals-against to count as a clean sheet.
pub const CLEAN_SHEET_MINUTES: u32 = 60;

fn sum_of(stats: &StatLine, parts: &[crate::registry::StatId]) -> Option<f64> {
    parts.iter().try_fold(0.0, |acc, id| Some(acc + stats.get(*id)?))
}

fn ratio(num: Option<f64>, den: Option<f64>, scale: f64) -> Option<f64> {
    let den = den.filter(|d| *d > 0.0)?;
    Some(num? / den * scale)
}

/// Evaluates one formula against already-filled stats. Missing inputs give `None`.
pub fn evaluate(formula: &Formula, stats: &StatLine, minutes: u32) -> Option<f64> {
    match *formula {
        Formula::Ratio { num, den, scale } => ratio(stats.get(num), stats.get(den), scale),
        Formula::RatioOfSum { num, parts, scale } => {
            ratio(stats.get(num), sum_of(stats, parts), scale)
        }
        Formula::Sum(parts) => sum_of(stats, parts),
        Formula::Difference(a, b) => Some(stats.get(a)? - stats.get(b)?),
        Formula::CleanSheet(goals_against) => {
            let ga = stats.get(goals_against)?;
            Some(if ga == 0.0 && minutes >= CLEAN_SHEET_MINUTES {
                1.0
            } else {
                0.0
            })
        }
    }
}

/// Fills every derived stat of `flavor`, in registry order.
pub fn compute_derived(stats: &mut StatLine, flavor: Flavor, minutes: u32) {
    for def in stats_for(flavor) {
        let StatKind::Derived(formula) = def.kind else {
            continue;
        };
        let value = evaluate(&formula, stats, minutes)
            .filter(|v| v.is_finite())
            .map(|v| match def.domain {
                Domain::Percentage => v.clamp(0.0, 100.0),
                _ => v,
            });
        stats.set(def.id, value);
    }
}
