use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Appearance, StatLine, age_key};
use crate::rating::{Rating, round2};
use crate::registry::{Flavor, Role, stats_for};

/// One player's season inside one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSeason {
    pub player: String,
    pub role: Role,
    pub age: Option<String>,
    pub nation: Option<String>,
    pub matches: u32,
    pub minutes: u32,
    /// Sorted, `", "`-joined.
    pub teams: String,
    pub competitions: String,
    pub average_rating: Option<f64>,
    pub totals: StatLine,
    pub per90: StatLine,
}

/// Season totals and per-90 rates of a set of stat lines.
///
/// Count stats are summed and scaled by the minutes of the lines where they
/// are present; rate stats are a minutes-weighted mean. A stat missing on
/// every line stays missing.
pub fn aggregate_lines<'a>(
    lines: impl IntoIterator<Item = (&'a StatLine, u32)>,
    flavor: Flavor,
) -> (StatLine, StatLine) {
    let lines: Vec<(&StatLine, f64)> = lines
        .into_iter()
        .map(|(line, minutes)| (line, minutes as f64))
        .collect();
    let mut totals = StatLine::new();
    let mut per90 = StatLine::new();
    for def in stats_for(flavor) {
        let mut sum = 0.0;
        let mut weighted = 0.0;
        let mut minutes = 0.0;
        let mut seen = false;
        for (line, m) in &lines {
            let Some(v) = line.get(def.id) else {
                continue;
            };
            seen = true;
            sum += v;
            weighted += v * m;
            minutes += m;
        }
        if !seen {
            continue;
        }
        if def.domain.is_rate() {
            let mean = (minutes > 0.0).then(|| weighted / minutes);
            totals.set(def.id, mean);
            per90.set(def.id, mean);
        } else {
            totals.set(def.id, Some(sum));
            per90.set(def.id, (minutes > 0.0).then(|| sum * 90.0 / minutes));
        }
    }
    (totals, per90)
}

/// Most frequent role; ties go to more minutes, then to the earlier canonical role.
pub fn main_role<'a>(appearances: impl IntoIterator<Item = &'a Appearance>) -> Option<Role> {
    let mut tally: BTreeMap<Role, (u32, u32)> = BTreeMap::new();
    for app in appearances {
        let slot = tally.entry(app.role).or_insert((0, 0));
        slot.0 += 1;
        slot.1 += app.minutes;
    }
    let mut best: Option<(Role, (u32, u32))> = None;
    // BTreeMap iterates in canonical order, so a strict `>` keeps the earlier role on ties.
    for (role, score) in tally {
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((role, score));
        }
    }
    best.map(|(role, _)| role)
}

fn joined(values: BTreeSet<&str>) -> String {
    values.into_iter().collect::<Vec<_>>().join(", ")
}

/// Aggregates appearances of one flavor into per-player seasons, ordered by name.
///
/// `ratings[i]` belongs to `appearances[i]`; missing entries are ignored.
/// Appearances with zero minutes never reach this point.
pub fn aggregate_players(
    appearances: &[Appearance],
    ratings: &[Rating],
    flavor: Flavor,
) -> Vec<PlayerSeason> {
    let mut by_player: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, app) in appearances.iter().enumerate() {
        if app.minutes == 0 {
            continue;
        }
        by_player.entry(app.player.as_str()).or_default().push(idx);
    }

    let mut out = Vec::with_capacity(by_player.len());
    for (player, idxs) in by_player {
        let apps: Vec<&Appearance> = idxs.iter().map(|i| &appearances[*i]).collect();
        let Some(role) = main_role(apps.iter().copied()) else {
            continue;
        };
        let minutes: u32 = apps.iter().map(|a| a.minutes).sum();

        let mut rating_sum = 0.0;
        let mut rating_minutes = 0.0;
        for idx in &idxs {
            if let Some(r) = ratings.get(*idx) {
                let m = appearances[*idx].minutes as f64;
                rating_sum += r.value * m;
                rating_minutes += m;
            }
        }
        let average_rating = (rating_minutes > 0.0).then(|| round2(rating_sum / rating_minutes));

        let age = apps
            .iter()
            .filter_map(|a| a.age.as_deref())
            .filter_map(|raw| age_key(raw).map(|key| (key, raw)))
            .max_by_key(|(key, _)| *key)
            .map(|(_, raw)| raw.to_string());
        let nation = apps.iter().find_map(|a| a.nation.clone());

        let (totals, per90) = aggregate_lines(apps.iter().map(|a| (&a.stats, a.minutes)), flavor);

        out.push(PlayerSeason {
            player: player.to_string(),
            role,
            age,
            nation,
            matches: apps.len() as u32,
            minutes,
            teams: joined(apps.iter().map(|a| a.team.as_str()).collect()),
            competitions: joined(apps.iter().map(|a| a.competition.as_str()).collect()),
            average_rating,
            totals,
            per90,
        });
    }
    tracing::debug!(?flavor, players = out.len(), "players aggregated");
    out
}
