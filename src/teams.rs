use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::aggregate::aggregate_lines;
use crate::derived::compute_derived;
use crate::model::{Appearance, StatLine, age_years};
use crate::percentile::percentile_column;
use crate::registry::{Flavor, StatId, StatKind, stats_for};

/// Team-level minutes of one match.
pub const MATCH_MINUTES: u32 = 90;

/// Sum of every player line of one team in one match.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMatch {
    pub team: String,
    pub competition: String,
    pub matchday: String,
    pub opponent: Option<String>,
    pub stats: StatLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeason {
    pub team: String,
    pub competitions: String,
    pub matches: u32,
    pub minutes: u32,
    /// Minutes-weighted mean age of the players used, in years.
    pub average_age: Option<f64>,
    pub totals: StatLine,
    pub per90: StatLine,
}

fn raw_team_stats() -> impl Iterator<Item = StatId> {
    stats_for(Flavor::Team)
        .filter(|def| matches!(def.kind, StatKind::Raw) && def.id != StatId::OpponentTouches)
        .map(|def| def.id)
}

/// Folds outfield and goalkeeper appearances into one line per (team, competition, matchday).
pub fn team_match_lines(appearances: &[&Appearance]) -> Vec<TeamMatch> {
    let raw: Vec<StatId> = raw_team_stats().collect();
    let mut lines: BTreeMap<(String, String, String), TeamMatch> = BTreeMap::new();
    for app in appearances {
        let key = (app.team.clone(), app.competition.clone(), app.matchday.clone());
        let line = lines.entry(key).or_insert_with(|| TeamMatch {
            team: app.team.clone(),
            competition: app.competition.clone(),
            matchday: app.matchday.clone(),
            opponent: None,
            stats: StatLine::new(),
        });
        if line.opponent.is_none() {
            line.opponent = app.opponent.clone();
        }
        for &stat in &raw {
            if let Some(v) = app.stats.get(stat) {
                let sum = line.stats.get(stat).unwrap_or(0.0) + v;
                line.stats.set(stat, Some(sum));
            }
        }
    }

    let touches: HashMap<(String, String, String), f64> = lines
        .iter()
        .filter_map(|(key, line)| line.stats.get(StatId::Touches).map(|t| (key.clone(), t)))
        .collect();
    let mut out: Vec<TeamMatch> = lines.into_values().collect();
    for line in &mut out {
        if let Some(opponent) = &line.opponent {
            let key = (opponent.clone(), line.competition.clone(), line.matchday.clone());
            line.stats.set(StatId::OpponentTouches, touches.get(&key).copied());
        }
        compute_derived(&mut line.stats, Flavor::Team, MATCH_MINUTES);
    }
    out
}

/// Team seasons across every competition of the tier, ordered by team name.
pub fn aggregate_teams(appearances: &[&Appearance]) -> Vec<TeamSeason> {
    let lines = team_match_lines(appearances);

    let mut ages: HashMap<&str, (f64, f64)> = HashMap::new();
    for app in appearances {
        if let Some(years) = app.age.as_deref().and_then(age_years) {
            let slot = ages.entry(app.team.as_str()).or_insert((0.0, 0.0));
            slot.0 += years * app.minutes as f64;
            slot.1 += app.minutes as f64;
        }
    }

    let mut by_team: BTreeMap<&str, Vec<&TeamMatch>> = BTreeMap::new();
    for line in &lines {
        by_team.entry(line.team.as_str()).or_default().push(line);
    }

    by_team
        .into_iter()
        .map(|(team, matches)| {
            let competitions: BTreeSet<&str> =
                matches.iter().map(|m| m.competition.as_str()).collect();
            let (totals, per90) =
                aggregate_lines(matches.iter().map(|m| (&m.stats, MATCH_MINUTES)), Flavor::Team);
            let average_age = ages
                .get(team)
                .filter(|(_, minutes)| *minutes > 0.0)
                .map(|(sum, minutes)| sum / minutes);
            TeamSeason {
                team: team.to_string(),
                competitions: competitions.into_iter().collect::<Vec<_>>().join(", "),
                matches: matches.len() as u32,
                minutes: matches.len() as u32 * MATCH_MINUTES,
                average_age,
                totals,
                per90,
            }
        })
        .collect()
}

/// Per-90 percentiles of every team stat against all teams of the tier.
pub fn team_percentiles(teams: &[TeamSeason]) -> Vec<StatLine> {
    let mut out = vec![StatLine::new(); teams.len()];
    for def in stats_for(Flavor::Team) {
        let column: Vec<Option<f64>> = teams.iter().map(|t| t.per90.get(def.id)).collect();
        for (line, pct) in out.iter_mut().zip(percentile_column(&column, def.polarity)) {
            line.set(def.id, pct);
        }
    }
    out
}
