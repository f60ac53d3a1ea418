use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use centile_engine::config::SeasonPaths;
use centile_engine::error::Warnings;
use centile_engine::fake_season::{SynthOptions, write_season};
use centile_engine::ingest::load_season;
use centile_engine::percentile::percentile_column;
use centile_engine::pipeline::{build_partition, render_tables};
use centile_engine::population::{CompetitionCatalog, SeasonCode, Tier};
use centile_engine::registry::Polarity;

fn bench_percentile_column(c: &mut Criterion) {
    // Deterministic spread with plenty of ties, like per-90 counts.
    let values: Vec<Option<f64>> = (0..2_000u32)
        .map(|i| {
            if i % 17 == 0 {
                None
            } else {
                Some(((i * 7919) % 311) as f64 / 10.0)
            }
        })
        .collect();
    c.bench_function("percentile_column_2000", |b| {
        b.iter(|| {
            let out = percentile_column(black_box(&values), Polarity::HigherBetter);
            black_box(out.len());
        })
    });
}

fn bench_build_partition(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("csv24_25");
    let options = SynthOptions {
        teams_per_league: 10,
        matchdays: 18,
        ..SynthOptions::default()
    };
    write_season(&root, &options).expect("synthetic season");

    let season: SeasonCode = "24_25".parse().expect("season code");
    let paths = SeasonPaths::new(&root);
    let catalog = CompetitionCatalog::builtin();
    let mut warnings = Warnings::new();
    let input = load_season(&paths, &season, &catalog, &mut warnings).expect("load season");

    c.bench_function("build_partition_top_leagues", |b| {
        b.iter(|| {
            let mut warnings = Warnings::new();
            let model = build_partition(black_box(&input), Tier::TopLeagues, 0, &mut warnings);
            black_box(model.outfield.players.len());
        })
    });

    let mut warnings = Warnings::new();
    let model = build_partition(&input, Tier::TopLeagues, 0, &mut warnings);
    c.bench_function("render_tables_top_leagues", |b| {
        b.iter(|| {
            let tables = render_tables(black_box(&model));
            black_box(tables.len());
        })
    });
}

criterion_group!(benches, bench_percentile_column, bench_build_partition);
criterion_main!(benches);
