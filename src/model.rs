use std::collections::HashMap;

use crate::population::Tier;
use crate::registry::{Role, StatId};

/// One value slot per registry stat; `None` is a missing value, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StatLine {
    values: Vec<Option<f64>>,
}

impl StatLine {
    pub fn new() -> Self {
        Self {
            values: vec![None; StatId::COUNT],
        }
    }

    pub fn get(&self, id: StatId) -> Option<f64> {
        self.values[id.index()]
    }

    pub fn set(&mut self, id: StatId, value: Option<f64>) {
        self.values[id.index()] = value.filter(|v| v.is_finite());
    }

    pub fn with(mut self, id: StatId, value: f64) -> Self {
        self.set(id, Some(value));
        self
    }
}

impl Default for StatLine {
    fn default() -> Self {
        Self::new()
    }
}

/// A single (player, match) row of a clean table.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    pub player: String,
    pub matchday: String,
    pub team: String,
    /// Canonical competition name from the catalog.
    pub competition: String,
    /// League label exactly as written in the input; names the games file.
    pub league_label: String,
    pub tier: Tier,
    pub role: Role,
    pub minutes: u32,
    pub age: Option<String>,
    pub nation: Option<String>,
    pub opponent: Option<String>,
    pub score: Option<Score>,
    pub stats: StatLine,
}

impl Appearance {
    pub fn new(
        player: &str,
        team: &str,
        competition: &str,
        tier: Tier,
        matchday: &str,
        role: Role,
        minutes: u32,
    ) -> Self {
        Self {
            player: player.to_string(),
            matchday: matchday.to_string(),
            team: team.to_string(),
            competition: competition.to_string(),
            league_label: competition.to_string(),
            tier,
            role,
            minutes,
            age: None,
            nation: None,
            opponent: None,
            score: None,
            stats: StatLine::new(),
        }
    }

    pub fn with_stat(mut self, id: StatId, value: f64) -> Self {
        self.stats.set(id, Some(value));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    /// Accepts `2-1`, `2–1` and `2 : 1`; penalty shoot-out suffixes like `(4)` are ignored.
    pub fn parse(raw: &str) -> Option<Score> {
        let cleaned: String = strip_parenthesized(raw);
        let mut parts = cleaned
            .split(['-', '–', '—', ':'])
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let home = parts.next()?.parse::<u32>().ok()?;
        let away = parts.next()?.parse::<u32>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Score { home, away })
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.home, self.away)
    }

    /// Score from the point of view of the given side.
    pub fn for_side(&self, home_side: bool) -> (u32, u32) {
        if home_side {
            (self.home, self.away)
        } else {
            (self.away, self.home)
        }
    }
}

fn strip_parenthesized(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// One row of a `leagues_games/<League>_games.csv` table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub competition: String,
    pub matchday: String,
    pub home: String,
    pub away: String,
    pub score: Option<Score>,
    pub referee: Option<String>,
    pub venue: Option<String>,
    pub attendance: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchSide<'a> {
    pub opponent: &'a str,
    pub home: bool,
    pub score: Option<Score>,
}

/// Lookup from (competition, matchday, team) to the fixture that team played.
#[derive(Debug, Clone, Default)]
pub struct MatchIndex {
    records: Vec<MatchRecord>,
    by_team: HashMap<(String, String, String), (usize, bool)>,
}

impl MatchIndex {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        let mut by_team = HashMap::new();
        for (idx, rec) in records.iter().enumerate() {
            by_team
                .entry((rec.competition.clone(), rec.matchday.clone(), rec.home.clone()))
                .or_insert((idx, true));
            by_team
                .entry((rec.competition.clone(), rec.matchday.clone(), rec.away.clone()))
                .or_insert((idx, false));
        }
        Self { records, by_team }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn side(&self, competition: &str, matchday: &str, team: &str) -> Option<MatchSide<'_>> {
        let (idx, home) = self.by_team.get(&(
            competition.to_string(),
            matchday.to_string(),
            team.to_string(),
        ))?;
        let rec = self.records.get(*idx)?;
        Some(MatchSide {
            opponent: if *home { &rec.away } else { &rec.home },
            home: *home,
            score: rec.score,
        })
    }

    /// Fills `opponent` and `score` on every appearance with a known fixture.
    pub fn attach(&self, appearances: &mut [Appearance]) -> usize {
        let mut attached = 0usize;
        for app in appearances.iter_mut() {
            let Some(side) = self.side(&app.competition, &app.matchday, &app.team) else {
                continue;
            };
            app.opponent = Some(side.opponent.to_string());
            app.score = side.score.map(|s| {
                let (own, other) = s.for_side(side.home);
                Score {
                    home: own,
                    away: other,
                }
            });
            attached += 1;
        }
        attached
    }
}

/// Sort key for FBref ages written as `years-days` (or plain years).
pub fn age_key(raw: &str) -> Option<(u32, u32)> {
    let mut parts = raw.trim().splitn(2, '-');
    let years = parts.next()?.trim().parse::<u32>().ok()?;
    let days = match parts.next() {
        Some(d) => d.trim().parse::<u32>().ok()?,
        None => 0,
    };
    Some((years, days))
}

/// Age in fractional years, used for team averages.
pub fn age_years(raw: &str) -> Option<f64> {
    age_key(raw).map(|(y, d)| y as f64 + d as f64 / 365.0)
}
