use std::collections::HashSet;
use std::fs;
use std::path::Path;

use centile_engine::config::{Config, SeasonPaths};
use centile_engine::error::{PipelineError, Warnings};
use centile_engine::export::export_partition;
use centile_engine::fake_season::{SynthOptions, write_season};
use centile_engine::ingest::SeasonInput;
use centile_engine::leaders::{
    LeaderFilter, minutes_played_pct, season_leaders, stat_by_name, top_match_performances,
};
use centile_engine::model::{Appearance, MatchIndex};
use centile_engine::pipeline::{
    Manifest, build_partition, commit, load_partition, rebuild, render_tables, sha256_hex,
};
use centile_engine::population::{SeasonCode, Tier, TierSelection};
use centile_engine::registry::{Role, StatId};

fn season() -> SeasonCode {
    "24_25".parse().unwrap()
}

fn synthetic(root: &Path) -> Config {
    let cfg = Config::default().with_overrides(Some(root.to_path_buf()), None);
    let options = SynthOptions {
        matchdays: 4,
        ..SynthOptions::default()
    };
    write_season(&cfg.season_dir(&season()), &options).unwrap();
    cfg
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().iter().map(String::from).collect();
    let rows = rdr
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[test]
fn rebuild_writes_every_table_of_both_tiers() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    let reports = rebuild(&cfg, &season(), TierSelection::All).unwrap();
    assert_eq!(reports.len(), 2);

    let paths = SeasonPaths::new(cfg.season_dir(&season()));
    for tier in Tier::ALL {
        for kind in ["aggregated", "adjusted", "centiles"] {
            assert!(paths.centiles(tier, kind, false).is_file());
            assert!(paths.centiles(tier, kind, true).is_file());
            assert!(paths.teams(tier, kind).is_file());
        }
        assert!(paths.metrics(tier, false).is_file());
        assert!(paths.metrics(tier, true).is_file());
        assert!(!paths.staging(tier).exists());
        let reports_dir = paths.root.join("reports");
        assert!(reports_dir.join(format!("{tier}_manifest.json")).is_file());
        assert!(reports_dir.join(format!("{tier}_warnings.log")).is_file());
    }
    assert!(paths.ratings(false).is_file());
    assert!(paths.ratings(true).is_file());

    let top = reports.iter().find(|r| r.tier == Tier::TopLeagues).unwrap();
    let others = reports.iter().find(|r| r.tier == Tier::OthersLeagues).unwrap();
    assert_eq!(top.manifest.files.len(), 13);
    assert_eq!(others.manifest.files.len(), 11);
    assert!(others.manifest.files.iter().all(|f| !f.path.starts_with("ratings/")));
}

#[test]
fn manifest_hashes_match_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    let reports = rebuild(&cfg, &season(), TierSelection::One(Tier::TopLeagues)).unwrap();
    let root = cfg.season_dir(&season());

    let raw = fs::read_to_string(root.join("reports/TopLeagues_manifest.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["tier"], "TopLeagues");
    assert_eq!(json["season"], "24_25");

    for entry in &reports[0].manifest.files {
        let bytes = fs::read(root.join(&entry.path)).unwrap();
        assert_eq!(sha256_hex(&bytes), entry.sha256, "{}", entry.path);
        let (_, rows) = read_csv(&root.join(&entry.path));
        assert_eq!(rows.len(), entry.rows, "{}", entry.path);
    }
}

fn output_bytes(root: &Path, tier: Tier, manifest: &Manifest) -> Vec<(String, Vec<u8>)> {
    let mut out: Vec<(String, Vec<u8>)> = manifest
        .files
        .iter()
        .map(|f| (f.path.clone(), fs::read(root.join(&f.path)).unwrap()))
        .collect();
    for name in [
        format!("{}_manifest.json", tier.as_str()),
        format!("{}_warnings.log", tier.as_str()),
    ] {
        let rel = format!("reports/{name}");
        let bytes = fs::read(root.join(&rel)).unwrap();
        out.push((rel, bytes));
    }
    out
}

#[test]
fn rebuild_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    let root = cfg.season_dir(&season());

    let first = rebuild(&cfg, &season(), TierSelection::All).unwrap();
    let before: Vec<_> = first
        .iter()
        .flat_map(|r| output_bytes(&root, r.tier, &r.manifest))
        .collect();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let second = rebuild(&cfg, &season(), TierSelection::All).unwrap();
    let after: Vec<_> = second
        .iter()
        .flat_map(|r| output_bytes(&root, r.tier, &r.manifest))
        .collect();

    assert_eq!(before.len(), after.len());
    for ((path, a), (_, b)) in before.iter().zip(&after) {
        assert!(a == b, "{path} differs between runs");
    }
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.manifest, b.manifest);
    }
}

#[test]
fn centile_tables_stay_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    rebuild(&cfg, &season(), TierSelection::One(Tier::TopLeagues)).unwrap();
    let paths = SeasonPaths::new(cfg.season_dir(&season()));

    let (headers, rows) = read_csv(&paths.centiles(Tier::TopLeagues, "centiles", false));
    let first_stat = headers.iter().position(|h| h == "Competition(s)").unwrap() + 1;
    assert!(!rows.is_empty());
    for row in &rows {
        for cell in &row[first_stat..] {
            if cell.is_empty() {
                continue;
            }
            let v: f64 = cell.parse().unwrap();
            assert!((0.0..=100.0).contains(&v), "{cell}");
        }
    }

    let (_, ratings) = read_csv(&paths.ratings(false));
    for row in &ratings {
        let v: f64 = row[6].parse().unwrap();
        assert!((0.0..=10.0).contains(&v));
        assert!(row[4].parse::<u32>().unwrap() > 0);
    }
}

#[test]
fn missing_input_fails_with_exit_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::default().with_overrides(Some(dir.path().to_path_buf()), None);
    let err = rebuild(&cfg, &season(), TierSelection::All).unwrap_err();
    assert!(matches!(err, PipelineError::InputMissing { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn schema_violation_leaves_previous_outputs_alone() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    rebuild(&cfg, &season(), TierSelection::All).unwrap();
    let paths = SeasonPaths::new(cfg.season_dir(&season()));
    let metrics = paths.metrics(Tier::TopLeagues, false);
    let before = fs::read(&metrics).unwrap();

    fs::write(
        paths.clean_players(),
        "Player,Game Week,Team,League,Position\nAna,J1,Lille,Ligue 1,FW\n",
    )
    .unwrap();
    let err = rebuild(&cfg, &season(), TierSelection::All).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert_eq!(fs::read(&metrics).unwrap(), before);
    assert!(!paths.staging(Tier::TopLeagues).exists());
}

#[test]
fn export_writes_one_sheet_per_table() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    let (model, _) = load_partition(&cfg, &season(), Tier::TopLeagues).unwrap();
    let out = dir.path().join("exports").join("top.xlsx");
    let report = export_partition(&model, &out).unwrap();

    assert!(out.is_file());
    assert_eq!(report.sheets.len(), render_tables(&model).len());
    let unique: HashSet<&String> = report.sheets.iter().collect();
    assert_eq!(unique.len(), report.sheets.len());
    assert!(report.sheets.iter().all(|s| s.len() <= 31));
}

#[test]
fn leaders_are_sorted_and_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    let (model, _) = load_partition(&cfg, &season(), Tier::TopLeagues).unwrap();

    let all = season_leaders(&model, &LeaderFilter::default());
    assert!(!all.is_empty());
    assert!(all.len() <= 30);
    assert!(all.windows(2).all(|w| w[0].average_rating >= w[1].average_rating));

    let keepers = season_leaders(
        &model,
        &LeaderFilter {
            role: Some(Role::Goalkeeper),
            competition: Some("Ligue 1".to_string()),
            ..LeaderFilter::default()
        },
    );
    assert!(!keepers.is_empty());
    assert!(keepers.iter().all(|k| k.role == Role::Goalkeeper && k.competitions == "Ligue 1"));

    let full_timers = season_leaders(
        &model,
        &LeaderFilter {
            min_minutes_pct: 100.0,
            limit: usize::MAX,
            ..LeaderFilter::default()
        },
    );
    assert!(!full_timers.is_empty());
    for p in &full_timers {
        assert_eq!(p.minutes, p.matches * 90, "{}", p.player);
    }
}

#[test]
fn top_matches_follow_polarity_and_carry_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    let (model, _) = load_partition(&cfg, &season(), Tier::TopLeagues).unwrap();
    let filter = LeaderFilter {
        limit: 10,
        ..LeaderFilter::default()
    };

    assert_eq!(stat_by_name("goals"), Some(StatId::Goals));
    let goals = top_match_performances(&model, StatId::Goals, &filter);
    assert_eq!(goals.len(), 10);
    assert!(goals.windows(2).all(|w| w[0].value >= w[1].value));
    assert!(goals.iter().all(|g| g.opponent.is_some() && g.score.is_some()));
    for g in &goals {
        let score = g.score.unwrap();
        assert!(score.home as f64 >= g.value);
    }

    let conceded = top_match_performances(&model, StatId::GoalsAgainst, &filter);
    assert!(conceded.windows(2).all(|w| w[0].value <= w[1].value));
    assert!(conceded.iter().all(|c| c.role == Role::Goalkeeper));
}

fn in_memory(outfield: Vec<Appearance>) -> SeasonInput {
    SeasonInput {
        season: season(),
        outfield,
        goalkeepers: Vec::new(),
        games: MatchIndex::default(),
    }
}

fn forward(
    player: &str,
    competition: &str,
    tier: Tier,
    matchday: u32,
    minutes: u32,
) -> Appearance {
    Appearance::new(
        player,
        "Club",
        competition,
        tier,
        &format!("J{matchday}"),
        Role::Forward,
        minutes,
    )
    .with_stat(StatId::Goals, (matchday % 2) as f64)
    .with_stat(StatId::Shots, 3.0)
}

#[test]
fn minutes_filter_measures_each_appearance() {
    let mut rows = Vec::new();
    for md in 1..=10 {
        rows.push(forward("Iron", "Ligue 1", Tier::TopLeagues, md, 90));
    }
    for md in 1..=3 {
        rows.push(forward("Loan", "Ligue 1", Tier::TopLeagues, md, 90));
    }
    for md in 1..=6 {
        rows.push(forward("Sub", "Ligue 1", Tier::TopLeagues, md, 30));
    }
    let mut warnings = Warnings::new();
    let model = build_partition(&in_memory(rows), Tier::TopLeagues, 0, &mut warnings);

    let filter = LeaderFilter {
        min_minutes_pct: 70.0,
        ..LeaderFilter::default()
    };
    let mut names: Vec<String> = season_leaders(&model, &filter)
        .into_iter()
        .map(|l| l.player)
        .collect();
    names.sort();
    assert_eq!(names, vec!["Iron", "Loan"]);

    assert_eq!(minutes_played_pct(270, 3), 100.0);
    assert!((minutes_played_pct(180, 6) - 100.0 / 3.0).abs() < 1e-9);
    assert_eq!(minutes_played_pct(0, 0), 0.0);
}

#[test]
fn player_in_both_tiers_is_aggregated_per_tier() {
    let rows = vec![
        forward("Ana", "Ligue 1", Tier::TopLeagues, 1, 90),
        forward("Bo", "Ligue 1", Tier::TopLeagues, 1, 90),
        forward("Ana", "Eredivisie", Tier::OthersLeagues, 2, 60),
        forward("Cy", "Eredivisie", Tier::OthersLeagues, 2, 80),
    ];
    let input = in_memory(rows);
    let total: u32 = input
        .outfield
        .iter()
        .filter(|a| a.player == "Ana")
        .map(|a| a.minutes)
        .sum();

    let mut per_tier = Vec::new();
    for tier in Tier::ALL {
        let mut warnings = Warnings::new();
        let model = build_partition(&input, tier, 0, &mut warnings);
        let (idx, ana) = model
            .outfield
            .players
            .iter()
            .enumerate()
            .find(|(_, p)| p.player == "Ana")
            .unwrap();
        assert_eq!(ana.matches, 1);
        assert!(model.outfield.centiles.iter().any(|c| c.index == idx));
        per_tier.push((tier, ana.minutes, ana.competitions.clone()));
    }

    assert_eq!(per_tier[0], (Tier::TopLeagues, 90, "Ligue 1".to_string()));
    assert_eq!(per_tier[1], (Tier::OthersLeagues, 60, "Eredivisie".to_string()));
    assert_eq!(per_tier.iter().map(|(_, m, _)| m).sum::<u32>(), total);
}

#[test]
fn failed_commit_restores_previous_tables() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = synthetic(dir.path());
    rebuild(&cfg, &season(), TierSelection::One(Tier::TopLeagues)).unwrap();
    let paths = SeasonPaths::new(cfg.season_dir(&season()));
    let centiles = paths.centiles(Tier::TopLeagues, "centiles", false);
    let metrics = paths.metrics(Tier::TopLeagues, false);
    let before = (fs::read(&centiles).unwrap(), fs::read(&metrics).unwrap());

    // The last table's target becomes a non-empty directory, so its rename fails.
    let blocked = paths.teams(Tier::TopLeagues, "centiles");
    fs::remove_file(&blocked).unwrap();
    fs::create_dir_all(blocked.join("keep")).unwrap();

    let strict = cfg.clone().with_overrides(None, Some(300));
    let (model, warnings) = load_partition(&strict, &season(), Tier::TopLeagues).unwrap();
    let tables = render_tables(&model);
    let last = tables.last().map(|(rel, _)| rel.clone());
    assert_eq!(last, Some(SeasonPaths::new("").teams(Tier::TopLeagues, "centiles")));
    let err = commit(&paths, &season(), Tier::TopLeagues, &tables, &warnings).unwrap_err();
    assert_eq!(err.exit_code(), 3);

    assert_eq!(fs::read(&centiles).unwrap(), before.0);
    assert_eq!(fs::read(&metrics).unwrap(), before.1);
    assert!(!paths.staging(Tier::TopLeagues).exists());
}
