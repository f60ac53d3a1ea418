use crate::model::Score;
use crate::pipeline::{FlavorModel, PartitionModel};
use crate::registry::{Flavor, Polarity, Role, StatId, all_stats, header_key};

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderFilter {
    pub role: Option<Role>,
    pub competition: Option<String>,
    pub min_matches: u32,
    /// Minimum `100 * minutes / (matches * 90)`: how much of each appearance was played.
    pub min_minutes_pct: f64,
    pub limit: usize,
}

impl Default for LeaderFilter {
    fn default() -> Self {
        Self {
            role: None,
            competition: None,
            min_matches: 1,
            min_minutes_pct: 0.0,
            limit: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonLeader {
    pub player: String,
    pub role: Role,
    pub average_rating: f64,
    pub matches: u32,
    pub minutes: u32,
    pub teams: String,
    pub competitions: String,
}

fn flavors(role: Option<Role>) -> Vec<Flavor> {
    match role {
        Some(r) => vec![r.flavor()],
        None => vec![Flavor::Outfield, Flavor::Goalkeeper],
    }
}

fn in_competition(listed: &str, wanted: &Option<String>) -> bool {
    match wanted {
        Some(name) => listed.split(", ").any(|c| c.eq_ignore_ascii_case(name)),
        None => true,
    }
}

/// Minutes played as a percentage of the full 90 of every appearance.
pub fn minutes_played_pct(minutes: u32, matches: u32) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    100.0 * minutes as f64 / (matches as f64 * 90.0)
}

/// Best average ratings of the season, highest first.
pub fn season_leaders(model: &PartitionModel, filter: &LeaderFilter) -> Vec<SeasonLeader> {
    let mut out = Vec::new();
    for flavor in flavors(filter.role) {
        let fm = model.flavor(flavor);
        for p in &fm.players {
            let Some(average_rating) = p.average_rating else {
                continue;
            };
            if filter.role.is_some_and(|r| r != p.role)
                || !in_competition(&p.competitions, &filter.competition)
                || p.matches < filter.min_matches
            {
                continue;
            }
            if minutes_played_pct(p.minutes, p.matches) < filter.min_minutes_pct {
                continue;
            }
            out.push(SeasonLeader {
                player: p.player.clone(),
                role: p.role,
                average_rating,
                matches: p.matches,
                minutes: p.minutes,
                teams: p.teams.clone(),
                competitions: p.competitions.clone(),
            });
        }
    }
    out.sort_by(|a, b| {
        b.average_rating
            .total_cmp(&a.average_rating)
            .then(b.minutes.cmp(&a.minutes))
            .then_with(|| a.player.cmp(&b.player))
    });
    out.truncate(filter.limit);
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchPerformance {
    pub player: String,
    pub role: Role,
    pub team: String,
    pub opponent: Option<String>,
    /// Goals for the player's team first.
    pub score: Option<Score>,
    pub competition: String,
    pub matchday: String,
    pub minutes: u32,
    pub value: f64,
    pub rating: f64,
}

fn collect_performances(
    fm: &FlavorModel,
    stat: StatId,
    filter: &LeaderFilter,
    out: &mut Vec<MatchPerformance>,
) {
    for (app, rating) in fm.appearances.iter().zip(&fm.ratings) {
        let Some(value) = app.stats.get(stat) else {
            continue;
        };
        if filter.role.is_some_and(|r| r != app.role)
            || !in_competition(&app.competition, &filter.competition)
        {
            continue;
        }
        out.push(MatchPerformance {
            player: app.player.clone(),
            role: app.role,
            team: app.team.clone(),
            opponent: app.opponent.clone(),
            score: app.score,
            competition: app.competition.clone(),
            matchday: app.matchday.clone(),
            minutes: app.minutes,
            value,
            rating: rating.value,
        });
    }
}

/// Best single-match values of `stat`; "best" follows the stat's polarity.
pub fn top_match_performances(
    model: &PartitionModel,
    stat: StatId,
    filter: &LeaderFilter,
) -> Vec<MatchPerformance> {
    let mut out = Vec::new();
    for flavor in flavors(filter.role) {
        if stat.def().flavors.contains(flavor) {
            collect_performances(model.flavor(flavor), stat, filter, &mut out);
        }
    }
    let polarity = stat.polarity();
    out.sort_by(|a, b| {
        let by_value = match polarity {
            Polarity::HigherBetter => b.value.total_cmp(&a.value),
            Polarity::LowerBetter => a.value.total_cmp(&b.value),
        };
        by_value
            .then(b.rating.total_cmp(&a.rating))
            .then_with(|| a.player.cmp(&b.player))
            .then_with(|| a.matchday.cmp(&b.matchday))
    });
    out.truncate(filter.limit);
    out
}

/// Resolves a stat from its column name or an accepted alias.
pub fn stat_by_name(raw: &str) -> Option<StatId> {
    let key = header_key(raw);
    all_stats()
        .iter()
        .find(|def| {
            header_key(def.name) == key
                || def.team_column.is_some_and(|c| header_key(c) == key)
                || def.aliases.iter().any(|a| header_key(a) == key)
        })
        .map(|def| def.id)
}
