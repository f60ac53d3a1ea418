use centile_engine::derived::compute_derived;
use centile_engine::model::Appearance;
use centile_engine::population::Tier;
use centile_engine::rating::{ANCHOR, minutes_weight, profile, rate, rate_all};
use centile_engine::registry::{Role, StatId};
use proptest::prelude::*;

fn appearance(role: Role, minutes: u32, stats: &[(StatId, f64)]) -> Appearance {
    let mut app = Appearance::new("Player", "Lille", "Ligue 1", Tier::TopLeagues, "J1", role, minutes);
    for (stat, value) in stats {
        app.stats.set(*stat, Some(*value));
    }
    compute_derived(&mut app.stats, role.flavor(), minutes);
    app
}

#[test]
fn forward_with_a_brace_rates_above_eight() {
    let app = appearance(
        Role::Forward,
        90,
        &[
            (StatId::Goals, 2.0),
            (StatId::Xg, 1.0),
            (StatId::Shots, 5.0),
            (StatId::ShotsOnTarget, 3.0),
        ],
    );
    assert_eq!(app.stats.get(StatId::Efficiency), Some(2.0));
    let rating = rate(&app);
    assert!(rating.value >= 8.0, "rating was {}", rating.value);
    assert_eq!(rating.value, 8.3);
    assert_eq!(rating.minutes_weight, 1.0);
    let goals = rating
        .components
        .iter()
        .find(|c| c.stat == StatId::Goals)
        .unwrap();
    assert_eq!(goals.contribution, 2.5);
}

fn midfield_line(scale: f64) -> Vec<(StatId, f64)> {
    vec![
        (StatId::ProgressivePasses, 6.0 * scale),
        (StatId::ProgressiveCarries, 3.0 * scale),
        (StatId::ProgressiveRuns, 3.0 * scale),
        (StatId::TacklesWon, 3.0 * scale),
        (StatId::Interceptions, 3.0 * scale),
        (StatId::BallRecoveries, 9.0 * scale),
        (StatId::PassesCompleted, 60.0 * scale),
        (StatId::PassesAttempted, 66.0 * scale),
    ]
}

#[test]
fn full_match_beats_same_rate_cameo() {
    let full = rate(&appearance(Role::Midfielder, 90, &midfield_line(1.0)));
    let cameo = rate(&appearance(Role::Midfielder, 30, &midfield_line(1.0 / 3.0)));
    assert!(full.value > cameo.value, "{} vs {}", full.value, cameo.value);
    assert_eq!(full.value, 6.96);
    assert_eq!(cameo.value, 5.87);
}

#[test]
fn missing_profile_stats_contribute_nothing() {
    let app = appearance(Role::Defender, 90, &[]);
    let rating = rate(&app);
    assert_eq!(rating.component_score, profile(Role::Defender).floor);
    assert!(rating.components.iter().all(|c| c.value.is_none() && c.contribution == 0.0));
}

#[test]
fn one_minute_cameo_sits_on_the_anchor() {
    let app = appearance(Role::Forward, 1, &[(StatId::Goals, 3.0)]);
    let rating = rate(&app);
    assert!((rating.value - ANCHOR).abs() < 0.2);
}

#[test]
fn rate_all_fills_derived_stats() {
    let mut apps = vec![Appearance::new("K", "Lille", "Ligue 1", Tier::TopLeagues, "J1", Role::Goalkeeper, 90)
        .with_stat(StatId::GoalsAgainst, 0.0)
        .with_stat(StatId::Saves, 3.0)
        .with_stat(StatId::ShotsOnTargetAgainst, 3.0)];
    let ratings = rate_all(&mut apps);
    assert_eq!(ratings.len(), 1);
    assert_eq!(apps[0].stats.get(StatId::CleanSheets), Some(1.0));
    assert_eq!(apps[0].stats.get(StatId::PctSaves), Some(100.0));
    assert!(ratings[0].value > ANCHOR);
}

fn any_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

proptest! {
    #[test]
    fn ratings_stay_in_bounds(
        role in any_role(),
        minutes in 1u32..130,
        values in prop::collection::vec(-5.0f64..200.0, 20),
    ) {
        let p = profile(role);
        let stats: Vec<(StatId, f64)> = p
            .entries
            .iter()
            .zip(values.iter())
            .map(|(e, v)| (e.stat, *v))
            .collect();
        let mut app = Appearance::new("P", "T", "Ligue 1", Tier::TopLeagues, "J1", role, minutes);
        for (stat, v) in stats {
            app.stats.set(stat, Some(v));
        }
        let rating = rate(&app);
        prop_assert!((0.0..=10.0).contains(&rating.value));
    }

    #[test]
    fn more_minutes_never_hurt_a_good_performance(
        goals in 1.0f64..3.0,
        m1 in 1u32..120,
        extra in 0u32..60,
    ) {
        let build = |minutes| {
            Appearance::new("P", "T", "Ligue 1", Tier::TopLeagues, "J1", Role::Forward, minutes)
                .with_stat(StatId::Goals, goals)
                .with_stat(StatId::Xg, 1.0)
                .with_stat(StatId::ShotsOnTarget, 3.0)
        };
        let a = rate(&build(m1));
        let b = rate(&build(m1 + extra));
        prop_assert!(a.component_score >= ANCHOR);
        prop_assert!(b.value >= a.value);
    }

    #[test]
    fn minutes_weight_is_monotone(m in 0u32..200, d in 0u32..50) {
        prop_assert!(minutes_weight(m + d) >= minutes_weight(m));
        prop_assert!((0.0..=1.0).contains(&minutes_weight(m)));
    }
}
