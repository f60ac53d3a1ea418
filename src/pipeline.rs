use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::aggregate::{PlayerSeason, aggregate_players};
use crate::config::{Config, SeasonPaths};
use crate::error::{PipelineError, PipelineResult, WarningKind, Warnings};
use crate::indices::{PlayerIndices, compose_indices};
use crate::ingest::{SeasonInput, load_season};
use crate::model::{Appearance, StatLine};
use crate::percentile::{PlayerPercentiles, compute_percentiles};
use crate::population::{SeasonCode, Tier, TierSelection};
use crate::rating::{Rating, rate_all};
use crate::registry::{Flavor, indices_for, stats_for};
use crate::table::{Cell, NumberFormat, Table};
use crate::teams::{TeamSeason, aggregate_teams, team_percentiles};

/// Everything derived for one flavor (outfield or goalkeepers) of a partition.
#[derive(Debug, Clone)]
pub struct FlavorModel {
    pub flavor: Flavor,
    pub appearances: Vec<Appearance>,
    pub ratings: Vec<Rating>,
    pub players: Vec<PlayerSeason>,
    pub centiles: Vec<PlayerPercentiles>,
    pub indices: Vec<PlayerIndices>,
}

impl FlavorModel {
    fn build(
        mut appearances: Vec<Appearance>,
        flavor: Flavor,
        min_minutes: u32,
        scope: &str,
        warnings: &mut Warnings,
    ) -> Self {
        let ratings = rate_all(&mut appearances);
        let players = aggregate_players(&appearances, &ratings, flavor);
        let centiles = compute_percentiles(&players, flavor, min_minutes, scope, warnings);
        let indices = compose_indices(&centiles, flavor);
        Self {
            flavor,
            appearances,
            ratings,
            players,
            centiles,
            indices,
        }
    }
}

/// Derived state of one (season, tier) partition.
#[derive(Debug, Clone)]
pub struct PartitionModel {
    pub season: SeasonCode,
    pub tier: Tier,
    pub outfield: FlavorModel,
    pub goalkeepers: FlavorModel,
    pub teams: Vec<TeamSeason>,
    pub team_centiles: Vec<StatLine>,
}

impl PartitionModel {
    pub fn flavor(&self, flavor: Flavor) -> &FlavorModel {
        match flavor {
            Flavor::Goalkeeper => &self.goalkeepers,
            _ => &self.outfield,
        }
    }
}

pub fn build_partition(
    input: &SeasonInput,
    tier: Tier,
    min_minutes: u32,
    warnings: &mut Warnings,
) -> PartitionModel {
    let scope = format!("{} {}", input.season, tier);
    let (outfield, goalkeepers) = input.for_tier(tier);
    if outfield.is_empty() && goalkeepers.is_empty() {
        warnings.push(
            WarningKind::PopulationEmpty,
            scope.as_str(),
            None,
            "no appearances in this tier",
        );
    }
    let outfield = FlavorModel::build(outfield, Flavor::Outfield, min_minutes, &scope, warnings);
    let goalkeepers =
        FlavorModel::build(goalkeepers, Flavor::Goalkeeper, min_minutes, &scope, warnings);

    let all: Vec<&Appearance> = outfield
        .appearances
        .iter()
        .chain(goalkeepers.appearances.iter())
        .collect();
    let teams = aggregate_teams(&all);
    let team_centiles = team_percentiles(&teams);

    tracing::info!(
        season = %input.season,
        tier = %tier,
        players = outfield.players.len(),
        goalkeepers = goalkeepers.players.len(),
        teams = teams.len(),
        "partition computed"
    );

    PartitionModel {
        season: input.season.clone(),
        tier,
        outfield,
        goalkeepers,
        teams,
        team_centiles,
    }
}

const PASS_THROUGH: [&str; 8] = [
    "Player",
    "Role",
    "Age",
    "Nation",
    "Matches Played",
    "Minutes Played",
    "Team(s)",
    "Competition(s)",
];

fn player_cells(p: &PlayerSeason) -> Vec<Cell> {
    vec![
        Cell::text(&p.player),
        Cell::text(p.role.code()),
        Cell::opt_text(p.age.as_deref()),
        Cell::opt_text(p.nation.as_deref()),
        Cell::Int(p.matches as i64),
        Cell::Int(p.minutes as i64),
        Cell::text(&p.teams),
        Cell::text(&p.competitions),
    ]
}

fn stat_headers(flavor: Flavor) -> impl Iterator<Item = String> {
    stats_for(flavor).map(move |def| def.column(flavor).to_string())
}

fn stat_cells(line: &StatLine, flavor: Flavor) -> impl Iterator<Item = Cell> + '_ {
    stats_for(flavor).map(move |def| Cell::opt_num(line.get(def.id)))
}

fn players_table(model: &FlavorModel, per90: bool) -> Table {
    let mut headers: Vec<String> = PASS_THROUGH.iter().map(|h| h.to_string()).collect();
    headers.push("Average Rating".to_string());
    headers.extend(stat_headers(model.flavor));
    let mut table = Table::new(headers, NumberFormat::AGGREGATE);
    for p in &model.players {
        let mut row = player_cells(p);
        row.push(Cell::opt_num(p.average_rating));
        let line = if per90 { &p.per90 } else { &p.totals };
        row.extend(stat_cells(line, model.flavor));
        table.push(row);
    }
    table
}

fn centiles_table(model: &FlavorModel) -> Table {
    let mut headers: Vec<String> = PASS_THROUGH.iter().map(|h| h.to_string()).collect();
    headers.extend(stat_headers(model.flavor));
    let mut table = Table::new(headers, NumberFormat::CENTILE);
    for row in &model.centiles {
        let mut cells = player_cells(&model.players[row.index]);
        cells.extend(stat_cells(&row.centiles, model.flavor));
        table.push(cells);
    }
    table
}

fn metrics_table(model: &FlavorModel) -> Table {
    let mut headers: Vec<String> = PASS_THROUGH.iter().map(|h| h.to_string()).collect();
    headers.extend(indices_for(model.flavor).map(|def| def.name.to_string()));
    let mut table = Table::new(headers, NumberFormat::CENTILE);
    for row in &model.indices {
        let mut cells = player_cells(&model.players[row.index]);
        cells.extend(row.values.iter().map(|v| Cell::opt_num(*v)));
        table.push(cells);
    }
    table
}

fn ratings_table(model: &FlavorModel) -> Table {
    let headers = [
        "Player", "Game Week", "Team", "League", "Minutes", "Position", "Rating",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let mut table = Table::new(headers, NumberFormat::RATING);
    for (app, rating) in model.appearances.iter().zip(&model.ratings) {
        table.push(vec![
            Cell::text(&app.player),
            Cell::text(&app.matchday),
            Cell::text(&app.team),
            Cell::text(&app.league_label),
            Cell::Int(app.minutes as i64),
            Cell::text(app.role.code()),
            Cell::Num(rating.value),
        ]);
    }
    table
}

const TEAM_PASS_THROUGH: [&str; 4] = ["Team", "Competition(s)", "Matches Played", "Minutes Played"];

fn team_cells(t: &TeamSeason) -> Vec<Cell> {
    vec![
        Cell::text(&t.team),
        Cell::text(&t.competitions),
        Cell::Int(t.matches as i64),
        Cell::Int(t.minutes as i64),
    ]
}

fn teams_table(teams: &[TeamSeason], per90: bool) -> Table {
    let mut headers: Vec<String> = TEAM_PASS_THROUGH.iter().map(|h| h.to_string()).collect();
    headers.push("Average Age".to_string());
    headers.extend(stat_headers(Flavor::Team));
    let mut table = Table::new(headers, NumberFormat::AGGREGATE);
    for t in teams {
        let mut row = team_cells(t);
        row.push(Cell::opt_num(t.average_age));
        let line = if per90 { &t.per90 } else { &t.totals };
        row.extend(stat_cells(line, Flavor::Team));
        table.push(row);
    }
    table
}

fn team_centiles_table(teams: &[TeamSeason], centiles: &[StatLine]) -> Table {
    let mut headers: Vec<String> = TEAM_PASS_THROUGH.iter().map(|h| h.to_string()).collect();
    headers.extend(stat_headers(Flavor::Team));
    let mut table = Table::new(headers, NumberFormat::CENTILE);
    for (t, line) in teams.iter().zip(centiles) {
        let mut row = team_cells(t);
        row.extend(stat_cells(line, Flavor::Team));
        table.push(row);
    }
    table
}

/// Every derived table of a partition with its path relative to the season folder.
pub fn render_tables(model: &PartitionModel) -> Vec<(PathBuf, Table)> {
    let rel = SeasonPaths::new("");
    let tier = model.tier;
    let mut out = Vec::new();
    if tier == Tier::TopLeagues {
        out.push((rel.ratings(false), ratings_table(&model.outfield)));
        out.push((rel.ratings(true), ratings_table(&model.goalkeepers)));
    }
    for (fm, gk) in [(&model.outfield, false), (&model.goalkeepers, true)] {
        out.push((rel.centiles(tier, "aggregated", gk), players_table(fm, false)));
        out.push((rel.centiles(tier, "adjusted", gk), players_table(fm, true)));
        out.push((rel.centiles(tier, "centiles", gk), centiles_table(fm)));
        out.push((rel.metrics(tier, gk), metrics_table(fm)));
    }
    out.push((rel.teams(tier, "aggregated"), teams_table(&model.teams, false)));
    out.push((rel.teams(tier, "adjusted"), teams_table(&model.teams, true)));
    out.push((
        rel.teams(tier, "centiles"),
        team_centiles_table(&model.teams, &model.team_centiles),
    ));
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub path: String,
    pub rows: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub season: String,
    pub tier: Tier,
    pub files: Vec<ManifestEntry>,
    pub warnings: usize,
}

#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub tier: Tier,
    pub manifest: Manifest,
}

fn portable(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn write_file(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| PipelineError::io(path, e))
}

/// Header plus one line per warning; no timestamp, so reruns are byte-identical.
fn warnings_log(season: &SeasonCode, tier: Tier, warnings: &Warnings) -> String {
    let mut out = format!("# {tier} {season} ({} warnings)\n", warnings.len());
    out.push_str(&warnings.render());
    out
}

/// Stages every file of the partition, then moves them into the season folder.
pub fn commit(
    paths: &SeasonPaths,
    season: &SeasonCode,
    tier: Tier,
    tables: &[(PathBuf, Table)],
    warnings: &Warnings,
) -> PipelineResult<Manifest> {
    let staging = paths.staging(tier);
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| PipelineError::io(&staging, e))?;
    }

    let staged = stage(&staging, season, tier, tables, warnings);
    let (manifest, files) = match staged {
        Ok(done) => done,
        Err(err) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }
    };

    let mut swapped = Vec::with_capacity(files.len());
    if let Err(err) = swap_in(&paths.root, &staging, &files, &mut swapped) {
        tracing::warn!(%season, %tier, moved = swapped.len(), "commit failed; restoring previous tables");
        roll_back(&swapped);
        let _ = fs::remove_dir_all(&staging);
        return Err(err);
    }
    fs::remove_dir_all(&staging).map_err(|e| PipelineError::io(&staging, e))?;
    tracing::info!(
        %season,
        %tier,
        files = files.len(),
        rebuilt_at = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "partition committed"
    );
    Ok(manifest)
}

/// A file moved into place, with the previous version parked under the staging dir.
struct Swapped {
    target: PathBuf,
    previous: Option<PathBuf>,
}

fn swap_in(
    root: &Path,
    staging: &Path,
    files: &[PathBuf],
    swapped: &mut Vec<Swapped>,
) -> PipelineResult<()> {
    let parked = staging.join(".previous");
    for rel in files {
        let from = staging.join(rel);
        let to = root.join(rel);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        let previous = if to.is_file() {
            let keep = parked.join(rel);
            if let Some(parent) = keep.parent() {
                fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
            }
            fs::rename(&to, &keep).map_err(|e| PipelineError::io(&to, e))?;
            Some(keep)
        } else {
            None
        };
        let moved = fs::rename(&from, &to);
        swapped.push(Swapped {
            target: to.clone(),
            previous,
        });
        moved.map_err(|e| PipelineError::io(&to, e))?;
    }
    Ok(())
}

/// Puts back every file `swap_in` replaced, newest first.
fn roll_back(swapped: &[Swapped]) {
    for entry in swapped.iter().rev() {
        match &entry.previous {
            Some(keep) => {
                if let Err(e) = fs::rename(keep, &entry.target) {
                    tracing::error!(path = %entry.target.display(), "restore failed: {e}");
                }
            }
            None => {
                if entry.target.is_file() {
                    let _ = fs::remove_file(&entry.target);
                }
            }
        }
    }
}

fn stage(
    staging: &Path,
    season: &SeasonCode,
    tier: Tier,
    tables: &[(PathBuf, Table)],
    warnings: &Warnings,
) -> PipelineResult<(Manifest, Vec<PathBuf>)> {
    let mut files = Vec::with_capacity(tables.len() + 2);
    let mut entries = Vec::with_capacity(tables.len());
    for (rel, table) in tables {
        let bytes = table.to_csv_bytes()?;
        write_file(&staging.join(rel), &bytes)?;
        entries.push(ManifestEntry {
            path: portable(rel),
            rows: table.rows.len(),
            sha256: sha256_hex(&bytes),
        });
        files.push(rel.clone());
    }
    let manifest = Manifest {
        season: season.to_string(),
        tier,
        files: entries,
        warnings: warnings.len(),
    };

    let reports = PathBuf::from("reports");
    let manifest_rel = reports.join(format!("{}_manifest.json", tier.as_str()));
    let mut json = serde_json::to_vec_pretty(&manifest)?;
    json.push(b'\n');
    write_file(&staging.join(&manifest_rel), &json)?;
    files.push(manifest_rel);

    let log_rel = reports.join(format!("{}_warnings.log", tier.as_str()));
    write_file(
        &staging.join(&log_rel),
        warnings_log(season, tier, warnings).as_bytes(),
    )?;
    files.push(log_rel);

    Ok((manifest, files))
}

/// Recomputes and writes every derived table of the selected tiers.
pub fn rebuild(
    config: &Config,
    season: &SeasonCode,
    selection: TierSelection,
) -> PipelineResult<Vec<RebuildReport>> {
    let paths = SeasonPaths::new(config.season_dir(season));
    let mut ingest_warnings = Warnings::new();
    let input = load_season(&paths, season, &config.catalog, &mut ingest_warnings)?;

    selection
        .tiers()
        .into_par_iter()
        .map(|tier| {
            let mut warnings = ingest_warnings.clone();
            let model = build_partition(&input, tier, config.min_minutes, &mut warnings);
            let tables = render_tables(&model);
            let manifest = commit(&paths, season, tier, &tables, &warnings)?;
            Ok(RebuildReport { tier, manifest })
        })
        .collect()
}

/// Loads a season and computes one partition without writing anything.
pub fn load_partition(
    config: &Config,
    season: &SeasonCode,
    tier: Tier,
) -> PipelineResult<(PartitionModel, Warnings)> {
    let paths = SeasonPaths::new(config.season_dir(season));
    let mut warnings = Warnings::new();
    let input = load_season(&paths, season, &config.catalog, &mut warnings)?;
    let model = build_partition(&input, tier, config.min_minutes, &mut warnings);
    Ok((model, warnings))
}
