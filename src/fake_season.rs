//! Seeded synthetic season generator.
//!
//! Writes clean appearance tables and fixture tables in the same layout the
//! scraper produces, so the whole pipeline can run without real data.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SeasonPaths;
use crate::error::{PipelineError, PipelineResult};
use crate::registry::{Flavor, Role, StatId, stats_for};

#[derive(Debug, Clone)]
pub struct SynthOptions {
    pub seed: u64,
    pub leagues: Vec<String>,
    pub teams_per_league: usize,
    pub matchdays: usize,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            seed: 7,
            leagues: vec![
                "Ligue 1".to_string(),
                "Premier League".to_string(),
                "Eredivisie".to_string(),
            ],
            teams_per_league: 6,
            matchdays: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SynthReport {
    pub outfield_rows: usize,
    pub goalkeeper_rows: usize,
    pub fixtures: usize,
}

const NATIONS: &[&str] = &["FRA", "ENG", "ESP", "GER", "ITA", "NED", "POR", "BRA", "ARG", "BEL"];
const VENUES: &[&str] = &["Stade Nord", "Arena Park", "Riverside", "Old Ground"];
const REFEREES: &[&str] = &["A. Martin", "B. Keller", "C. Rossi", "D. Silva"];

/// Starting eleven shape plus three substitutes.
const SQUAD: &[Role] = &[
    Role::Goalkeeper,
    Role::Defender,
    Role::Defender,
    Role::Defender,
    Role::Defender,
    Role::Midfielder,
    Role::Midfielder,
    Role::AttackingMidfielder,
    Role::AttackingMidfielder,
    Role::Forward,
    Role::Forward,
    Role::Midfielder,
    Role::Forward,
    Role::Defender,
];
const STARTERS: usize = 11;

struct SquadPlayer {
    name: String,
    role: Role,
    age: String,
    nation: &'static str,
}

struct Team {
    name: String,
    players: Vec<SquadPlayer>,
}

/// Typical per-90 volume of a raw outfield stat for a role.
fn outfield_rate(role: Role, stat: StatId) -> f64 {
    use Role::*;
    use StatId::*;
    let (df, mf, mo, fw) = match stat {
        Shots => (0.5, 1.0, 2.0, 3.0),
        Xg => (0.04, 0.1, 0.25, 0.45),
        Npxg => (0.04, 0.09, 0.22, 0.4),
        Xa => (0.05, 0.12, 0.25, 0.15),
        Sca => (1.2, 2.5, 4.0, 3.0),
        Gca => (0.1, 0.25, 0.5, 0.4),
        KeyPasses => (0.5, 1.2, 2.5, 1.5),
        PassesAttempted => (55.0, 60.0, 45.0, 25.0),
        ProgressivePasses => (4.0, 6.0, 4.0, 1.5),
        PassesFinalThird => (3.0, 5.0, 4.0, 1.0),
        PassesPenaltyArea => (0.5, 1.0, 2.0, 1.0),
        Crosses => (1.5, 1.0, 2.0, 0.8),
        Carries => (30.0, 35.0, 30.0, 20.0),
        ProgressiveCarries => (1.5, 2.5, 4.0, 2.5),
        ProgressiveRuns => (1.0, 2.5, 6.0, 8.0),
        CarriesPenaltyArea => (0.1, 0.4, 1.2, 1.0),
        TakeOnsAttempted => (0.6, 1.5, 3.5, 3.0),
        Tackles => (2.0, 2.5, 1.2, 0.6),
        DribblesChallenged => (1.5, 1.5, 0.8, 0.4),
        Blocks => (1.5, 1.2, 0.6, 0.4),
        Interceptions => (1.8, 1.3, 0.6, 0.3),
        Clearances => (4.5, 1.2, 0.5, 0.5),
        BallRecoveries => (5.0, 6.0, 4.0, 2.5),
        Errors => (0.08, 0.05, 0.03, 0.02),
        Touches => (70.0, 70.0, 55.0, 35.0),
        TouchesMiddleThird => (30.0, 35.0, 25.0, 12.0),
        TouchesAttPenArea => (0.5, 1.5, 3.5, 6.0),
        AerialWon => (2.5, 1.0, 0.5, 2.0),
        AerialLost => (1.2, 1.0, 0.8, 2.5),
        FoulsCommitted => (1.0, 1.3, 1.0, 1.2),
        FoulsDrawn => (0.7, 1.2, 1.8, 1.5),
        Miscontrols => (0.6, 1.2, 2.0, 2.5),
        Dispossessed => (0.4, 1.0, 1.8, 1.6),
        YellowCards => (0.18, 0.2, 0.12, 0.1),
        RedCards => (0.01, 0.01, 0.005, 0.005),
        _ => (0.0, 0.0, 0.0, 0.0),
    };
    match role {
        Defender => df,
        Midfielder => mf,
        AttackingMidfielder => mo,
        Forward => fw,
        Goalkeeper => 0.0,
    }
}

fn is_fractional(stat: StatId) -> bool {
    matches!(
        stat,
        StatId::Xg | StatId::Npxg | StatId::Xa | StatId::PostShotXg
    )
}

/// Draws a value around `rate` scaled to the minutes played.
fn draw(rng: &mut StdRng, stat: StatId, rate: f64, minutes: u32) -> f64 {
    let mean = rate * minutes as f64 / 90.0;
    let v = rng.gen_range(0.0..=2.0 * mean.max(0.0));
    if is_fractional(stat) {
        (v * 100.0).round() / 100.0
    } else {
        v.round()
    }
}

fn build_teams(rng: &mut StdRng, league: &str, count: usize) -> Vec<Team> {
    (0..count)
        .map(|t| {
            let name = format!("{league} Club {}", t + 1);
            let players = SQUAD
                .iter()
                .enumerate()
                .map(|(i, &role)| SquadPlayer {
                    name: format!("{} {} {}", league.split_whitespace().next().unwrap_or("P"), t + 1, i + 1),
                    role,
                    age: format!("{}-{:03}", rng.gen_range(18..36), rng.gen_range(0..365)),
                    nation: NATIONS[rng.gen_range(0..NATIONS.len())],
                })
                .collect();
            Team { name, players }
        })
        .collect()
}

/// Circle-method pairings for one matchday.
fn pairings(teams: usize, round: usize) -> Vec<(usize, usize)> {
    let n = if teams % 2 == 0 { teams } else { teams + 1 };
    if n < 2 {
        return Vec::new();
    }
    let r = round % (n - 1);
    let mut ring: Vec<usize> = (1..n).collect();
    ring.rotate_left(r);
    let mut slots = vec![0];
    slots.extend(ring);
    (0..n / 2)
        .map(|i| (slots[i], slots[n - 1 - i]))
        .filter(|(a, b)| *a < teams && *b < teams)
        .map(|(a, b)| if round % 2 == 0 { (a, b) } else { (b, a) })
        .collect()
}

fn outfield_header() -> Vec<String> {
    let mut h: Vec<String> = ["Player", "Game Week", "Team", "League", "Minutes", "Position", "Age", "Nation"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    h.extend(outfield_raw().map(|s| s.name().to_string()));
    h
}

fn goalkeeper_header() -> Vec<String> {
    let mut h: Vec<String> = ["Player", "Game Week", "Team", "League", "Minutes", "Age", "Nation"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    h.extend(goalkeeper_raw().map(|s| s.name().to_string()));
    h
}

fn outfield_raw() -> impl Iterator<Item = StatId> {
    stats_for(Flavor::Outfield)
        .filter(|d| !d.is_derived())
        .map(|d| d.id)
}

fn goalkeeper_raw() -> impl Iterator<Item = StatId> {
    stats_for(Flavor::Goalkeeper)
        .filter(|d| !d.is_derived())
        .map(|d| d.id)
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v:.2}")
    }
}

struct Side<'a> {
    team: &'a Team,
    goals: u32,
    conceded: u32,
}

/// Minutes of each squad slot in one match.
fn squad_minutes(rng: &mut StdRng) -> Vec<u32> {
    let mut minutes = vec![0u32; SQUAD.len()];
    minutes[0] = 90;
    for m in minutes.iter_mut().take(STARTERS).skip(1) {
        *m = if rng.gen_bool(0.3) { rng.gen_range(55..90) } else { 90 };
    }
    // Substitutes replace starters of the same role when those came off early.
    for sub in STARTERS..SQUAD.len() {
        let role = SQUAD[sub];
        if let Some(starter) = (1..STARTERS).find(|&s| SQUAD[s] == role && minutes[s] < 90) {
            minutes[sub] = 90 - minutes[starter];
        }
    }
    minutes
}

fn outfield_rows(
    rng: &mut StdRng,
    side: &Side<'_>,
    league: &str,
    matchday: &str,
    rows: &mut Vec<Vec<String>>,
) {
    let minutes = squad_minutes(rng);
    let scorers: Vec<usize> = (1..SQUAD.len()).filter(|&i| minutes[i] > 0).collect();
    let mut goals = vec![0u32; SQUAD.len()];
    let mut assists = vec![0u32; SQUAD.len()];
    for _ in 0..side.goals {
        let weighted: Vec<usize> = scorers
            .iter()
            .copied()
            .flat_map(|i| {
                let w = match SQUAD[i] {
                    Role::Forward => 5,
                    Role::AttackingMidfielder => 3,
                    Role::Midfielder => 2,
                    _ => 1,
                };
                std::iter::repeat_n(i, w)
            })
            .collect();
        if weighted.is_empty() {
            break;
        }
        let scorer = weighted[rng.gen_range(0..weighted.len())];
        goals[scorer] += 1;
        if rng.gen_bool(0.7) {
            let helper = scorers[rng.gen_range(0..scorers.len())];
            if helper != scorer {
                assists[helper] += 1;
            }
        }
    }

    for (i, player) in side.team.players.iter().enumerate().skip(1) {
        let m = minutes[i];
        if m == 0 {
            continue;
        }
        let mut row = vec![
            player.name.clone(),
            matchday.to_string(),
            side.team.name.clone(),
            league.to_string(),
            m.to_string(),
            player.role.code().to_string(),
            player.age.clone(),
            player.nation.to_string(),
        ];
        let mut values: Vec<(StatId, f64)> = outfield_raw()
            .map(|stat| (stat, draw(rng, stat, outfield_rate(player.role, stat), m)))
            .collect();
        let get = |values: &[(StatId, f64)], id: StatId| {
            values.iter().find(|(s, _)| *s == id).map_or(0.0, |(_, v)| *v)
        };
        let shots = get(&values, StatId::Shots).max(goals[i] as f64);
        let attempted = get(&values, StatId::PassesAttempted);
        let take_ons = get(&values, StatId::TakeOnsAttempted);
        let tackles = get(&values, StatId::Tackles);
        let challenged = get(&values, StatId::DribblesChallenged);
        for (stat, v) in values.iter_mut() {
            *v = match stat {
                StatId::Goals => goals[i] as f64,
                StatId::Assists => assists[i] as f64,
                StatId::Shots => shots,
                StatId::ShotsOnTarget => (shots * rng.gen_range(0.2..0.6)).round().max(goals[i] as f64).min(shots),
                StatId::PassesCompleted => (attempted * rng.gen_range(0.65..0.93)).round(),
                StatId::TakeOnsWon => (take_ons * rng.gen_range(0.3..0.7)).round(),
                StatId::TacklesWon => (tackles * rng.gen_range(0.4..0.8)).round(),
                StatId::DribblersTackled => (challenged * rng.gen_range(0.3..0.8)).round(),
                _ => *v,
            };
        }
        row.extend(values.iter().map(|(_, v)| fmt_value(*v)));
        rows.push(row);
    }
}

fn goalkeeper_row(
    rng: &mut StdRng,
    side: &Side<'_>,
    league: &str,
    matchday: &str,
) -> Vec<String> {
    let keeper = &side.team.players[0];
    let conceded = side.conceded as f64;
    let sota = conceded + rng.gen_range(0..6) as f64;
    let long_att = rng.gen_range(5..20) as f64;
    let crosses = rng.gen_range(2..12) as f64;
    let pens = if rng.gen_bool(0.1) { 1.0 } else { 0.0 };
    let passes = rng.gen_range(20..45) as f64;
    let mut row = vec![
        keeper.name.clone(),
        matchday.to_string(),
        side.team.name.clone(),
        league.to_string(),
        "90".to_string(),
        keeper.age.clone(),
        keeper.nation.to_string(),
    ];
    for stat in goalkeeper_raw() {
        let v = match stat {
            StatId::GoalsAgainst => conceded,
            StatId::ShotsOnTargetAgainst => sota,
            StatId::Saves => sota - conceded,
            StatId::PostShotXg => ((conceded + rng.gen_range(-0.8..1.2)).max(0.0) * 100.0).round() / 100.0,
            StatId::PenaltiesFaced => pens,
            StatId::PenaltiesSaved => if pens > 0.0 && rng.gen_bool(0.25) { 1.0 } else { 0.0 },
            StatId::LongPassesAttempted => long_att,
            StatId::LongPassesCompleted => (long_att * rng.gen_range(0.3..0.6)).round(),
            StatId::CrossesFaced => crosses,
            StatId::CrossesStopped => (crosses * rng.gen_range(0.0..0.2)).round(),
            StatId::SweeperActions => rng.gen_range(0..4) as f64,
            StatId::PassesAttempted => passes,
            StatId::PassesCompleted => (passes * rng.gen_range(0.6..0.9)).round(),
            StatId::Touches => rng.gen_range(25..50) as f64,
            StatId::Errors => if rng.gen_bool(0.03) { 1.0 } else { 0.0 },
            StatId::YellowCards => if rng.gen_bool(0.03) { 1.0 } else { 0.0 },
            _ => 0.0,
        };
        row.push(fmt_value(v));
    }
    row
}

fn write_csv(path: &Path, header: &[String], rows: &[Vec<String>]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let file_name = path.display().to_string();
    let csv_err = |e: csv::Error| PipelineError::Csv {
        file: file_name.clone(),
        source: e,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(header).map_err(csv_err)?;
    for row in rows {
        wtr.write_record(row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|e| PipelineError::io(path, e))
}

/// Writes a full synthetic season under `season_dir`.
pub fn write_season(season_dir: &Path, options: &SynthOptions) -> PipelineResult<SynthReport> {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let paths = SeasonPaths::new(season_dir);
    let mut outfield: Vec<Vec<String>> = Vec::new();
    let mut keepers: Vec<Vec<String>> = Vec::new();
    let mut report = SynthReport::default();

    for league in &options.leagues {
        let teams = build_teams(&mut rng, league, options.teams_per_league);
        let mut fixtures: Vec<Vec<String>> = Vec::new();
        for round in 0..options.matchdays {
            let matchday = format!("J{}", round + 1);
            for (home, away) in pairings(teams.len(), round) {
                let (hg, ag) = (rng.gen_range(0..4u32), rng.gen_range(0..3u32));
                let home_side = Side { team: &teams[home], goals: hg, conceded: ag };
                let away_side = Side { team: &teams[away], goals: ag, conceded: hg };
                for side in [&home_side, &away_side] {
                    outfield_rows(&mut rng, side, league, &matchday, &mut outfield);
                    keepers.push(goalkeeper_row(&mut rng, side, league, &matchday));
                }
                fixtures.push(vec![
                    matchday.clone(),
                    teams[home].name.clone(),
                    teams[away].name.clone(),
                    format!("{hg}–{ag}"),
                    REFEREES[rng.gen_range(0..REFEREES.len())].to_string(),
                    VENUES[rng.gen_range(0..VENUES.len())].to_string(),
                    rng.gen_range(8_000..60_000u32).to_string(),
                ]);
            }
        }
        let header: Vec<String> = ["Game Week", "Home Team", "Away Team", "Score", "Referee", "Venue", "Attendance"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        report.fixtures += fixtures.len();
        write_csv(&paths.games(league), &header, &fixtures)?;
    }

    write_csv(&paths.clean_players(), &outfield_header(), &outfield)?;
    write_csv(&paths.clean_goalkeepers(), &goalkeeper_header(), &keepers)?;
    report.outfield_rows = outfield.len();
    report.goalkeeper_rows = keepers.len();
    tracing::info!(
        dir = %season_dir.display(),
        seed = options.seed,
        outfield = report.outfield_rows,
        goalkeepers = report.goalkeeper_rows,
        fixtures = report.fixtures,
        "synthetic season written"
    );
    Ok(report)
}
