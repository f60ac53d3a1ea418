use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::SeasonPaths;
use crate::error::{PipelineError, PipelineResult, WarningKind, Warnings};
use crate::model::{Appearance, MatchIndex, MatchRecord, Score};
use crate::population::{CompetitionCatalog, SeasonCode, Tier};
use crate::registry::{Flavor, Role, StatId, header_key, raw_stat_for_header};

const PLAYER_COLS: &[&str] = &["Player"];
const MATCHDAY_COLS: &[&str] = &["Game Week", "Matchday", "Round", "Wk"];
const TEAM_COLS: &[&str] = &["Team", "Squad"];
const LEAGUE_COLS: &[&str] = &["League", "Competition", "Comp"];
const MINUTES_COLS: &[&str] = &["Minutes", "Min"];
const POSITION_COLS: &[&str] = &["Position", "Pos"];
const AGE_COLS: &[&str] = &["Age"];
const NATION_COLS: &[&str] = &["Nation", "Nationality"];

const HOME_COLS: &[&str] = &["Home Team", "Home"];
const AWAY_COLS: &[&str] = &["Away Team", "Away"];
const SCORE_COLS: &[&str] = &["Score"];

/// Longest plausible single appearance, extra time and stoppages included.
const MAX_MATCH_MINUTES: f64 = 150.0;
const REFEREE_COLS: &[&str] = &["Referee"];
const VENUE_COLS: &[&str] = &["Venue"];
const ATTENDANCE_COLS: &[&str] = &["Attendance"];

/// Both clean tables of a season with fixtures attached.
#[derive(Debug, Clone)]
pub struct SeasonInput {
    pub season: SeasonCode,
    pub outfield: Vec<Appearance>,
    pub goalkeepers: Vec<Appearance>,
    pub games: MatchIndex,
}

impl SeasonInput {
    /// Appearances of one tier, outfield then goalkeepers.
    pub fn for_tier(&self, tier: Tier) -> (Vec<Appearance>, Vec<Appearance>) {
        let pick = |rows: &[Appearance]| {
            rows.iter()
                .filter(|a| a.tier == tier)
                .cloned()
                .collect::<Vec<_>>()
        };
        (pick(&self.outfield), pick(&self.goalkeepers))
    }
}

struct Columns {
    player: usize,
    matchday: usize,
    team: usize,
    league: usize,
    minutes: usize,
    position: Option<usize>,
    age: Option<usize>,
    nation: Option<usize>,
    stats: Vec<(usize, StatId)>,
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    let wanted: Vec<String> = names.iter().map(|n| header_key(n)).collect();
    headers
        .iter()
        .position(|h| wanted.iter().any(|w| *w == header_key(h)))
}

fn require_column(
    headers: &csv::StringRecord,
    names: &[&str],
    source: &str,
) -> PipelineResult<usize> {
    find_column(headers, names).ok_or_else(|| {
        PipelineError::schema(source, format!("required column '{}' is absent", names[0]))
    })
}

fn resolve_columns(
    headers: &csv::StringRecord,
    flavor: Flavor,
    source: &str,
) -> PipelineResult<Columns> {
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(PipelineError::schema(source, "missing header row"));
    }
    let position = find_column(headers, POSITION_COLS);
    if position.is_none() && flavor != Flavor::Goalkeeper {
        return Err(PipelineError::schema(source, "required column 'Position' is absent"));
    }

    let mut stats = Vec::new();
    let mut seen = HashSet::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(stat) = raw_stat_for_header(flavor, header) {
            if seen.insert(stat) {
                stats.push((idx, stat));
            } else {
                tracing::debug!(%source, header, "duplicate column for {stat}; keeping the first");
            }
        }
    }

    Ok(Columns {
        player: require_column(headers, PLAYER_COLS, source)?,
        matchday: require_column(headers, MATCHDAY_COLS, source)?,
        team: require_column(headers, TEAM_COLS, source)?,
        league: require_column(headers, LEAGUE_COLS, source)?,
        minutes: require_column(headers, MINUTES_COLS, source)?,
        position,
        age: find_column(headers, AGE_COLS),
        nation: find_column(headers, NATION_COLS),
        stats,
    })
}

/// Outcome of reading one numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Empty,
    Value(f64),
    Invalid,
}

/// Parses a numeric CSV cell; tolerates thousands separators and a `%` suffix.
pub fn parse_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if s.is_empty()
        || s == "-"
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("na")
        || s.eq_ignore_ascii_case("n/a")
    {
        return Cell::Empty;
    }
    let cleaned = s.trim_end_matches('%').replace(',', "");
    match cleaned.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        _ => Cell::Invalid,
    }
}

#[derive(Default, Clone, Copy)]
struct ColumnHealth {
    non_empty: usize,
    valid: usize,
}

impl ColumnHealth {
    fn record(&mut self, cell: Cell) {
        match cell {
            Cell::Empty => {}
            Cell::Value(_) => {
                self.non_empty += 1;
                self.valid += 1;
            }
            Cell::Invalid => self.non_empty += 1,
        }
    }

    fn all_invalid(self) -> bool {
        self.non_empty > 0 && self.valid == 0
    }
}

fn text(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).map(str::trim).unwrap_or("")
}

fn optional_text(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    let value = text(record, idx?);
    (!value.is_empty()).then(|| value.to_string())
}

/// Reads one clean appearance table.
///
/// Fatal problems (absent required columns, a column with no parseable
/// value) return `SchemaViolation`; bad rows and cells become warnings.
pub fn parse_appearances<R: Read>(
    reader: R,
    source: &str,
    flavor: Flavor,
    catalog: &CompetitionCatalog,
    warnings: &mut Warnings,
) -> PipelineResult<Vec<Appearance>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Csv {
            file: source.to_string(),
            source: e,
        })?
        .clone();
    let cols = resolve_columns(&headers, flavor, source)?;

    let mut minutes_health = ColumnHealth::default();
    let mut stat_health = vec![ColumnHealth::default(); cols.stats.len()];
    let mut keys: HashSet<(String, String, String, String)> = HashSet::new();
    let mut out = Vec::new();

    for record in rdr.records() {
        let record = record.map_err(|e| PipelineError::Csv {
            file: source.to_string(),
            source: e,
        })?;
        let line = record.position().map(|p| p.line());
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let stat_cells: Vec<Cell> = cols
            .stats
            .iter()
            .map(|(idx, _)| parse_cell(text(&record, *idx)))
            .collect();
        for (health, cell) in stat_health.iter_mut().zip(&stat_cells) {
            health.record(*cell);
        }
        let minutes_cell = parse_cell(text(&record, cols.minutes));
        minutes_health.record(minutes_cell);

        let player = text(&record, cols.player);
        if player.is_empty() {
            warnings.push(WarningKind::RowDefect, source, line, "empty Player");
            continue;
        }

        let minutes = match minutes_cell {
            Cell::Value(v) if v > MAX_MATCH_MINUTES => {
                warnings.push(
                    WarningKind::RowDefect,
                    source,
                    line,
                    format!("{player}: implausible minutes {v}"),
                );
                continue;
            }
            Cell::Value(v) if v >= 0.0 => v.round() as u32,
            _ => {
                warnings.push(
                    WarningKind::RowDefect,
                    source,
                    line,
                    format!(
                        "{player}: unparseable minutes '{}'",
                        text(&record, cols.minutes)
                    ),
                );
                continue;
            }
        };
        if minutes == 0 {
            continue;
        }

        let role = if flavor == Flavor::Goalkeeper {
            Role::Goalkeeper
        } else {
            let raw = cols.position.map(|idx| text(&record, idx)).unwrap_or("");
            match Role::parse(raw) {
                Some(Role::Goalkeeper) => {
                    tracing::debug!(%source, player, "goalkeeper row in outfield table skipped");
                    continue;
                }
                Some(role) => role,
                None => {
                    warnings.push(
                        WarningKind::RowDefect,
                        source,
                        line,
                        format!("{player}: unknown role '{raw}'"),
                    );
                    continue;
                }
            }
        };

        let league_label = text(&record, cols.league);
        let Some(competition) = catalog.resolve(league_label) else {
            warnings.push(
                WarningKind::RowDefect,
                source,
                line,
                format!("{player}: unknown competition '{league_label}'"),
            );
            continue;
        };

        let matchday = text(&record, cols.matchday);
        let team = text(&record, cols.team);
        let key = (
            player.to_string(),
            competition.name.clone(),
            matchday.to_string(),
            team.to_string(),
        );
        if !keys.insert(key) {
            warnings.push(
                WarningKind::RowDefect,
                source,
                line,
                format!(
                    "{player}: duplicate appearance for {team} in {} {matchday}",
                    competition.name
                ),
            );
            continue;
        }

        let mut app = Appearance::new(
            player,
            team,
            &competition.name,
            competition.tier,
            matchday,
            role,
            minutes,
        );
        app.league_label = league_label.to_string();
        app.age = optional_text(&record, cols.age);
        app.nation = optional_text(&record, cols.nation);
        for ((idx, stat), cell) in cols.stats.iter().zip(&stat_cells) {
            match cell {
                Cell::Value(v) => app.stats.set(*stat, Some(*v)),
                Cell::Empty => {}
                Cell::Invalid => warnings.push(
                    WarningKind::CellDefect,
                    source,
                    line,
                    format!("{player}: unparseable {stat} '{}'", text(&record, *idx)),
                ),
            }
        }
        out.push(app);
    }

    if minutes_health.all_invalid() {
        return Err(PipelineError::schema(
            source,
            "column 'Minutes' has no parseable value",
        ));
    }
    for ((idx, stat), health) in cols.stats.iter().zip(&stat_health) {
        if health.all_invalid() {
            return Err(PipelineError::schema(
                source,
                format!("column '{}' ({stat}) has no parseable value", &headers[*idx]),
            ));
        }
    }

    tracing::debug!(%source, rows = out.len(), "appearances parsed");
    Ok(out)
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open_required(path: &Path) -> PipelineResult<File> {
    if !path.is_file() {
        return Err(PipelineError::InputMissing {
            path: path.to_path_buf(),
        });
    }
    File::open(path).map_err(|e| PipelineError::io(path, e))
}

pub fn read_appearances(
    path: &Path,
    flavor: Flavor,
    catalog: &CompetitionCatalog,
    warnings: &mut Warnings,
) -> PipelineResult<Vec<Appearance>> {
    let file = open_required(path)?;
    parse_appearances(file, &source_name(path), flavor, catalog, warnings)
}

/// Reads one `<League>_games.csv` table; `competition` is the canonical name.
pub fn parse_games<R: Read>(
    reader: R,
    source: &str,
    competition: &str,
    warnings: &mut Warnings,
) -> PipelineResult<Vec<MatchRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| PipelineError::Csv {
            file: source.to_string(),
            source: e,
        })?
        .clone();
    let matchday = require_column(&headers, MATCHDAY_COLS, source)?;
    let home = require_column(&headers, HOME_COLS, source)?;
    let away = require_column(&headers, AWAY_COLS, source)?;
    let score = find_column(&headers, SCORE_COLS);
    let referee = find_column(&headers, REFEREE_COLS);
    let venue = find_column(&headers, VENUE_COLS);
    let attendance = find_column(&headers, ATTENDANCE_COLS);

    let mut out = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| PipelineError::Csv {
            file: source.to_string(),
            source: e,
        })?;
        let line = record.position().map(|p| p.line());
        let (md, h, a) = (
            text(&record, matchday),
            text(&record, home),
            text(&record, away),
        );
        if md.is_empty() || h.is_empty() || a.is_empty() {
            if record.iter().any(|c| !c.trim().is_empty()) {
                warnings.push(
                    WarningKind::RowDefect,
                    source,
                    line,
                    "fixture without matchday or teams",
                );
            }
            continue;
        }
        let attendance = match attendance.map(|idx| parse_cell(text(&record, idx))) {
            Some(Cell::Value(v)) if v >= 0.0 => Some(v.round() as u32),
            _ => None,
        };
        out.push(MatchRecord {
            competition: competition.to_string(),
            matchday: md.to_string(),
            home: h.to_string(),
            away: a.to_string(),
            score: score.and_then(|idx| Score::parse(text(&record, idx))),
            referee: optional_text(&record, referee),
            venue: optional_text(&record, venue),
            attendance,
        });
    }
    Ok(out)
}

/// Loads both clean tables of a season and every games table they reference.
pub fn load_season(
    paths: &SeasonPaths,
    season: &SeasonCode,
    catalog: &CompetitionCatalog,
    warnings: &mut Warnings,
) -> PipelineResult<SeasonInput> {
    let players_path = paths.clean_players();
    let goals_path = paths.clean_goalkeepers();
    // Both required inputs are checked before any parsing.
    for path in [&players_path, &goals_path] {
        if !path.is_file() {
            return Err(PipelineError::InputMissing { path: path.clone() });
        }
    }
    let mut outfield = read_appearances(&players_path, Flavor::Outfield, catalog, warnings)?;
    let mut goalkeepers = read_appearances(&goals_path, Flavor::Goalkeeper, catalog, warnings)?;

    let mut leagues: BTreeMap<String, String> = BTreeMap::new();
    for app in outfield.iter().chain(goalkeepers.iter()) {
        leagues
            .entry(app.league_label.clone())
            .or_insert_with(|| app.competition.clone());
    }

    let mut records = Vec::new();
    let mut loaded = HashSet::new();
    for (label, competition) in &leagues {
        if !loaded.insert(competition.clone()) {
            continue;
        }
        let path = paths.games(label);
        if !path.is_file() {
            warnings.push(
                WarningKind::OptionalInputMissing,
                source_name(&path),
                None,
                format!("no fixtures for {competition}; opponent and score unknown"),
            );
            continue;
        }
        let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
        records.extend(parse_games(file, &source_name(&path), competition, warnings)?);
    }

    let games = MatchIndex::new(records);
    let attached = games.attach(&mut outfield) + games.attach(&mut goalkeepers);
    tracing::info!(
        season = %season,
        outfield = outfield.len(),
        goalkeepers = goalkeepers.len(),
        fixtures = games.len(),
        attached,
        "season loaded"
    );

    Ok(SeasonInput {
        season: season.clone(),
        outfield,
        goalkeepers,
        games,
    })
}
