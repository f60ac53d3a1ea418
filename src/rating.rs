use crate::derived::compute_derived;
use crate::model::Appearance;
use crate::registry::{Polarity, Role, StatId};

/// Rating every partial appearance is pulled towards.
pub const ANCHOR: f64 = 6.0;
pub const RATING_MIN: f64 = 0.0;
pub const RATING_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
pub struct ProfileEntry {
    pub stat: StatId,
    pub weight: f64,
    /// Value at which the ramp starts.
    pub lo: f64,
    /// Value at which the ramp saturates.
    pub hi: f64,
}

const fn entry(stat: StatId, weight: f64, lo: f64, hi: f64) -> ProfileEntry {
    ProfileEntry { stat, weight, lo, hi }
}

#[derive(Debug, Clone, Copy)]
pub struct RatingProfile {
    pub role: Role,
    pub floor: f64,
    pub entries: &'static [ProfileEntry],
}

impl RatingProfile {
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

static FORWARD: RatingProfile = RatingProfile {
    role: Role::Forward,
    floor: 4.0,
    entries: &[
        entry(StatId::Goals, 2.5, 0.0, 2.0),
        entry(StatId::Assists, 1.0, 0.0, 2.0),
        entry(StatId::Xg, 0.8, 0.0, 1.0),
        entry(StatId::Efficiency, 0.5, 0.5, 2.0),
        entry(StatId::ShotsOnTarget, 0.5, 0.0, 3.0),
        entry(StatId::Xa, 0.4, 0.0, 0.8),
        entry(StatId::ActionsCreated, 0.4, 0.0, 6.0),
        entry(StatId::ActionsPenaltyArea, 0.3, 0.0, 10.0),
        entry(StatId::TakeOnsWon, 0.3, 0.0, 4.0),
        entry(StatId::AerialWon, 0.2, 0.0, 5.0),
        entry(StatId::BallLosses, 0.3, 0.0, 6.0),
        entry(StatId::FoulsCommitted, 0.1, 0.0, 4.0),
    ],
};

static ATTACKING_MIDFIELDER: RatingProfile = RatingProfile {
    role: Role::AttackingMidfielder,
    floor: 4.2,
    entries: &[
        entry(StatId::Goals, 2.0, 0.0, 2.0),
        entry(StatId::Assists, 1.3, 0.0, 2.0),
        entry(StatId::Xa, 0.6, 0.0, 0.8),
        entry(StatId::KeyPasses, 0.6, 0.0, 5.0),
        entry(StatId::ActionsCreated, 0.6, 0.0, 7.0),
        entry(StatId::Xg, 0.5, 0.0, 0.8),
        entry(StatId::TakeOnsWon, 0.4, 0.0, 5.0),
        entry(StatId::ProgressiveActions, 0.4, 0.0, 15.0),
        entry(StatId::PctPasses, 0.3, 65.0, 92.0),
        entry(StatId::BallLosses, 0.3, 0.0, 8.0),
    ],
};

static MIDFIELDER: RatingProfile = RatingProfile {
    role: Role::Midfielder,
    floor: 4.4,
    entries: &[
        entry(StatId::Goals, 1.2, 0.0, 1.0),
        entry(StatId::Assists, 1.0, 0.0, 1.0),
        entry(StatId::ProgressiveActions, 0.8, 0.0, 15.0),
        entry(StatId::PctPasses, 0.6, 70.0, 93.0),
        entry(StatId::KeyPasses, 0.5, 0.0, 4.0),
        entry(StatId::TacklesWon, 0.5, 0.0, 4.0),
        entry(StatId::Interceptions, 0.5, 0.0, 3.0),
        entry(StatId::BallRecoveries, 0.5, 0.0, 9.0),
        entry(StatId::Blocks, 0.2, 0.0, 3.0),
        entry(StatId::PctTacklesDuels, 0.2, 30.0, 80.0),
        entry(StatId::BallLosses, 0.3, 0.0, 8.0),
        entry(StatId::FoulsCommitted, 0.2, 0.0, 4.0),
    ],
};

static DEFENDER: RatingProfile = RatingProfile {
    role: Role::Defender,
    floor: 4.6,
    entries: &[
        entry(StatId::Goals, 1.0, 0.0, 1.0),
        entry(StatId::Assists, 0.6, 0.0, 1.0),
        entry(StatId::Clearances, 0.7, 0.0, 8.0),
        entry(StatId::Interceptions, 0.6, 0.0, 4.0),
        entry(StatId::TacklesWon, 0.6, 0.0, 4.0),
        entry(StatId::AerialWon, 0.5, 0.0, 6.0),
        entry(StatId::Blocks, 0.4, 0.0, 3.0),
        entry(StatId::ProgressivePasses, 0.4, 0.0, 8.0),
        entry(StatId::PctAerial, 0.3, 30.0, 80.0),
        entry(StatId::BallRecoveries, 0.3, 0.0, 8.0),
        entry(StatId::PctPasses, 0.3, 70.0, 95.0),
        entry(StatId::Errors, 0.5, 0.0, 1.0),
        entry(StatId::FoulsCommitted, 0.2, 0.0, 4.0),
    ],
};

static GOALKEEPER: RatingProfile = RatingProfile {
    role: Role::Goalkeeper,
    floor: 4.6,
    entries: &[
        entry(StatId::GkEfficiency, 1.0, -1.0, 1.0),
        entry(StatId::CleanSheets, 1.0, 0.0, 1.0),
        entry(StatId::PctSaves, 0.9, 50.0, 100.0),
        entry(StatId::GoalsAgainst, 0.8, 0.0, 3.0),
        entry(StatId::Saves, 0.6, 0.0, 6.0),
        entry(StatId::PenaltiesSaved, 0.6, 0.0, 1.0),
        entry(StatId::CrossesStopped, 0.3, 0.0, 3.0),
        entry(StatId::SweeperActions, 0.2, 0.0, 3.0),
        entry(StatId::PctLongPasses, 0.2, 20.0, 60.0),
        entry(StatId::Errors, 0.5, 0.0, 1.0),
    ],
};

pub fn profile(role: Role) -> &'static RatingProfile {
    match role {
        Role::Goalkeeper => &GOALKEEPER,
        Role::Defender => &DEFENDER,
        Role::Midfielder => &MIDFIELDER,
        Role::AttackingMidfielder => &ATTACKING_MIDFIELDER,
        Role::Forward => &FORWARD,
    }
}

/// Share of the component score kept for `minutes` played; the rest comes from [`ANCHOR`].
pub fn minutes_weight(minutes: u32) -> f64 {
    let m = minutes as f64;
    if m < 15.0 {
        0.1 * m / 15.0
    } else if m < 70.0 {
        0.1 + 0.9 * (m - 15.0) / 55.0
    } else {
        1.0
    }
}

/// Linear ramp in `[0, 1]`, flipped for stats where less is better.
pub fn band_score(entry: &ProfileEntry, value: f64) -> f64 {
    let span = entry.hi - entry.lo;
    let ramp = if span > 0.0 {
        ((value - entry.lo) / span).clamp(0.0, 1.0)
    } else if value >= entry.hi {
        1.0
    } else {
        0.0
    };
    match entry.stat.polarity() {
        Polarity::HigherBetter => ramp,
        Polarity::LowerBetter => 1.0 - ramp,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingComponent {
    pub stat: StatId,
    pub value: Option<f64>,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub value: f64,
    /// Floor plus weighted bands, before minutes weighting.
    pub component_score: f64,
    pub minutes_weight: f64,
    pub components: Vec<RatingComponent>,
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Rates one appearance. Derived stats must already be filled.
pub fn rate(app: &Appearance) -> Rating {
    let profile = profile(app.role);
    let mut score = profile.floor;
    let mut components = Vec::with_capacity(profile.entries.len());
    for entry in profile.entries {
        let value = app.stats.get(entry.stat);
        let contribution = value.map_or(0.0, |v| entry.weight * band_score(entry, v));
        score += contribution;
        components.push(RatingComponent {
            stat: entry.stat,
            value,
            contribution,
        });
    }
    let w = minutes_weight(app.minutes);
    let blended = (1.0 - w) * ANCHOR + w * score;
    Rating {
        value: round2(blended.clamp(RATING_MIN, RATING_MAX)),
        component_score: score,
        minutes_weight: w,
        components,
    }
}

/// Fills derived stats of every appearance and rates it.
pub fn rate_all(appearances: &mut [Appearance]) -> Vec<Rating> {
    appearances
        .iter_mut()
        .map(|app| {
            compute_derived(&mut app.stats, app.role.flavor(), app.minutes);
            rate(app)
        })
        .collect()
}
