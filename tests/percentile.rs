use centile_engine::aggregate::{PlayerSeason, aggregate_players};
use centile_engine::error::{WarningKind, Warnings};
use centile_engine::model::Appearance;
use centile_engine::percentile::{compute_percentiles, percentile_column};
use centile_engine::population::Tier;
use centile_engine::rating::rate_all;
use centile_engine::registry::{Flavor, Polarity, Role, StatId};
use proptest::prelude::*;

fn season(apps: &mut [Appearance], flavor: Flavor) -> Vec<PlayerSeason> {
    let ratings = rate_all(apps);
    aggregate_players(apps, &ratings, flavor)
}

fn defender(name: &str, clearances: f64) -> Appearance {
    Appearance::new(name, "Brest", "Ligue 1", Tier::TopLeagues, "1", Role::Defender, 90)
        .with_stat(StatId::Clearances, clearances)
}

fn keeper(name: &str, goals_against: f64) -> Appearance {
    Appearance::new(name, "Nice", "Ligue 1", Tier::TopLeagues, "1", Role::Goalkeeper, 90)
        .with_stat(StatId::GoalsAgainst, goals_against)
}

#[test]
fn top_clearance_defender_scores_hundred() {
    let mut apps = vec![
        defender("Top", 10.0),
        defender("B", 5.0),
        defender("C", 5.0),
        defender("D", 5.0),
    ];
    let players = season(&mut apps, Flavor::Outfield);
    let mut warnings = Warnings::new();
    let rows = compute_percentiles(&players, Flavor::Outfield, 0, "test", &mut warnings);
    let top = rows
        .iter()
        .find(|r| players[r.index].player == "Top")
        .unwrap();
    assert_eq!(top.centiles.get(StatId::Clearances), Some(100.0));
    let rest = rows
        .iter()
        .find(|r| players[r.index].player == "B")
        .unwrap();
    assert_eq!(rest.centiles.get(StatId::Clearances), Some(100.0 / 3.0));
}

#[test]
fn clean_sheet_keeper_ranks_near_the_top() {
    let goals = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0, 4.0];
    let mut apps: Vec<Appearance> = goals
        .iter()
        .enumerate()
        .map(|(i, ga)| keeper(&format!("K{i:02}"), *ga))
        .collect();
    let players = season(&mut apps, Flavor::Goalkeeper);
    let mut warnings = Warnings::new();
    let rows = compute_percentiles(&players, Flavor::Goalkeeper, 0, "test", &mut warnings);
    assert_eq!(rows.len(), 10);
    let best = &rows[0];
    assert_eq!(players[best.index].player, "K00");
    assert!(best.centiles.get(StatId::GoalsAgainst).unwrap() >= 90.0);
    assert_eq!(best.centiles.get(StatId::CleanSheets), Some(100.0));
}

#[test]
fn roles_are_ranked_separately() {
    let mut apps = vec![
        defender("D1", 2.0),
        defender("D2", 8.0),
        Appearance::new("F1", "Brest", "Ligue 1", Tier::TopLeagues, "1", Role::Forward, 90)
            .with_stat(StatId::Clearances, 20.0),
    ];
    let players = season(&mut apps, Flavor::Outfield);
    let mut warnings = Warnings::new();
    let rows = compute_percentiles(&players, Flavor::Outfield, 0, "test", &mut warnings);
    let pct = |name: &str| {
        rows.iter()
            .find(|r| players[r.index].player == name)
            .and_then(|r| r.centiles.get(StatId::Clearances))
    };
    assert_eq!(pct("D2"), Some(100.0));
    assert_eq!(pct("D1"), Some(0.0));
    assert_eq!(pct("F1"), Some(50.0));
    // No midfielders at all.
    assert!(warnings.count(WarningKind::PopulationEmpty) >= 2);
}

#[test]
fn minimum_minutes_filters_the_population() {
    let mut apps = vec![
        defender("Regular", 4.0),
        Appearance::new("Cameo", "Brest", "Ligue 1", Tier::TopLeagues, "1", Role::Defender, 20)
            .with_stat(StatId::Clearances, 3.0),
    ];
    let players = season(&mut apps, Flavor::Outfield);
    let mut warnings = Warnings::new();
    let rows = compute_percentiles(&players, Flavor::Outfield, 45, "test", &mut warnings);
    assert_eq!(rows.len(), 1);
    assert_eq!(players[rows[0].index].player, "Regular");
    assert_eq!(rows[0].centiles.get(StatId::Clearances), Some(50.0));
}

proptest! {
    #[test]
    fn column_mean_is_fifty(values in prop::collection::vec(0.0f64..20.0, 2..60)) {
        let column: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        let out = percentile_column(&column, Polarity::HigherBetter);
        let n = out.len() as f64;
        let mean = out.iter().map(|v| v.unwrap()).sum::<f64>() / n;
        prop_assert!((mean - 50.0).abs() <= 1.0 / n + 1e-9);
    }

    #[test]
    fn extremes_score_zero_and_hundred(values in prop::collection::vec(-50i32..50, 2..40)) {
        let column: Vec<Option<f64>> = values.iter().map(|v| Some(*v as f64)).collect();
        let out = percentile_column(&column, Polarity::HigherBetter);
        let max = *values.iter().max().unwrap();
        let min = *values.iter().min().unwrap();
        prop_assume!(min != max);
        if values.iter().filter(|v| **v == max).count() == 1 {
            let at = values.iter().position(|v| *v == max).unwrap();
            prop_assert_eq!(out[at], Some(100.0));
        }
        if values.iter().filter(|v| **v == min).count() == 1 {
            let at = values.iter().position(|v| *v == min).unwrap();
            prop_assert_eq!(out[at], Some(0.0));
        }
    }

    #[test]
    fn improving_a_value_never_lowers_its_percentile(
        values in prop::collection::vec(0i32..10, 2..30),
        pick in any::<prop::sample::Index>(),
        lower_better in any::<bool>(),
    ) {
        let polarity = if lower_better { Polarity::LowerBetter } else { Polarity::HigherBetter };
        let at = pick.index(values.len());
        let before: Vec<Option<f64>> = values.iter().map(|v| Some(*v as f64)).collect();
        let mut after = before.clone();
        let step = if lower_better { -1.0 } else { 1.0 };
        after[at] = after[at].map(|v| v + step);
        let p0 = percentile_column(&before, polarity)[at].unwrap();
        let p1 = percentile_column(&after, polarity)[at].unwrap();
        prop_assert!(p1 >= p0, "{} -> {}", p0, p1);
    }
}
