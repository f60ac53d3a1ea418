use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Goalkeeper,
    Defender,
    Midfielder,
    AttackingMidfielder,
    Forward,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Goalkeeper,
        Role::Defender,
        Role::Midfielder,
        Role::AttackingMidfielder,
        Role::Forward,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Role::Goalkeeper => "GK",
            Role::Defender => "DF",
            Role::Midfielder => "MF",
            Role::AttackingMidfielder => "MO",
            Role::Forward => "FW",
        }
    }

    /// Parses an FBref-style position string. Multi-position values such as
    /// "FW,MF" resolve to their first listed position.
    pub fn parse(raw: &str) -> Option<Role> {
        let first = raw.split([',', '/', ' ']).find(|s| !s.trim().is_empty())?;
        match first.trim().to_ascii_uppercase().as_str() {
            "GK" | "G" => Some(Role::Goalkeeper),
            "DF" | "D" | "CB" | "LB" | "RB" | "WB" | "LWB" | "RWB" | "FB" => Some(Role::Defender),
            "MF" | "M" | "DM" | "CM" | "CDM" => Some(Role::Midfielder),
            "MO" | "AM" | "CAM" | "LM" | "RM" | "LW" | "RW" => Some(Role::AttackingMidfielder),
            "FW" | "F" | "ST" | "CF" => Some(Role::Forward),
            _ => None,
        }
    }

    pub fn flavor(self) -> Flavor {
        match self {
            Role::Goalkeeper => Flavor::Goalkeeper,
            _ => Flavor::Outfield,
        }
    }

    /// Default percentile features shown for this role.
    pub fn feature_set(self) -> &'static [StatId] {
        match self {
            Role::Forward | Role::AttackingMidfielder => ATTACKER_FEATURES,
            Role::Midfielder => MIDFIELDER_FEATURES,
            Role::Defender => DEFENDER_FEATURES,
            Role::Goalkeeper => GOALKEEPER_FEATURES,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which derived table family a stat belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flavor {
    Outfield,
    Goalkeeper,
    Team,
}

impl Flavor {
    fn bit(self) -> u8 {
        match self {
            Flavor::Outfield => 0b001,
            Flavor::Goalkeeper => 0b010,
            Flavor::Team => 0b100,
        }
    }

    pub fn roles(self) -> &'static [Role] {
        match self {
            Flavor::Outfield => &[
                Role::Defender,
                Role::Midfielder,
                Role::AttackingMidfielder,
                Role::Forward,
            ],
            Flavor::Goalkeeper => &[Role::Goalkeeper],
            Flavor::Team => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlavorSet(u8);

impl FlavorSet {
    const G: FlavorSet = FlavorSet(0b010);
    const T: FlavorSet = FlavorSet(0b100);
    const OT: FlavorSet = FlavorSet(0b101);
    const GT: FlavorSet = FlavorSet(0b110);
    const OGT: FlavorSet = FlavorSet(0b111);

    pub fn contains(self, flavor: Flavor) -> bool {
        self.0 & flavor.bit() != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherBetter,
    LowerBetter,
}

impl Polarity {
    /// Maps a value so that larger always means better.
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Polarity::HigherBetter => v + 0.0,
            Polarity::LowerBetter => -v + 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Count,
    Percentage,
    Ratio,
}

impl Domain {
    /// Count stats are summed and normalized per 90; the others are rates already.
    pub fn is_rate(self) -> bool {
        !matches!(self, Domain::Count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formula {
    /// `num / den * scale`, null when the denominator is not positive.
    Ratio { num: StatId, den: StatId, scale: f64 },
    /// `num / sum(parts) * scale`.
    RatioOfSum { num: StatId, parts: &'static [StatId], scale: f64 },
    Sum(&'static [StatId]),
    Difference(StatId, StatId),
    /// 1 when the referenced goals-against value is zero over at least 60 minutes.
    CleanSheet(StatId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatKind {
    Raw,
    Derived(Formula),
}

#[derive(Debug, Clone, Copy)]
pub struct StatDef {
    pub id: StatId,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub polarity: Polarity,
    pub domain: Domain,
    pub flavors: FlavorSet,
    pub kind: StatKind,
    /// Column used in team tables when `name` would collide there.
    pub team_column: Option<&'static str>,
}

impl StatDef {
    pub fn is_derived(&self) -> bool {
        matches!(self.kind, StatKind::Derived(_))
    }

    pub fn column(&self, flavor: Flavor) -> &'static str {
        match (flavor, self.team_column) {
            (Flavor::Team, Some(col)) => col,
            _ => self.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatId {
    Goals,
    Assists,
    Shots,
    ShotsOnTarget,
    Xg,
    Npxg,
    Xa,
    Sca,
    Gca,
    KeyPasses,
    PassesCompleted,
    PassesAttempted,
    ProgressivePasses,
    PassesFinalThird,
    PassesPenaltyArea,
    Crosses,
    Carries,
    ProgressiveCarries,
    ProgressiveRuns,
    CarriesPenaltyArea,
    TakeOnsAttempted,
    TakeOnsWon,
    Tackles,
    TacklesWon,
    DribblersTackled,
    DribblesChallenged,
    Blocks,
    Interceptions,
    Clearances,
    BallRecoveries,
    Errors,
    Touches,
    TouchesMiddleThird,
    TouchesAttPenArea,
    AerialWon,
    AerialLost,
    FoulsCommitted,
    FoulsDrawn,
    Miscontrols,
    Dispossessed,
    YellowCards,
    RedCards,
    GoalsAgainst,
    ShotsOnTargetAgainst,
    Saves,
    PostShotXg,
    PenaltiesFaced,
    PenaltiesSaved,
    LongPassesCompleted,
    LongPassesAttempted,
    CrossesFaced,
    CrossesStopped,
    SweeperActions,
    OpponentTouches,
    Efficiency,
    PctTakeOns,
    ActionsCreated,
    ActionsPenaltyArea,
    PctAerial,
    ProgressiveActions,
    PctTacklesDuels,
    BallLosses,
    PctPasses,
    PctShotsOnTarget,
    CleanSheets,
    PctSaves,
    GkEfficiency,
    PctLongPasses,
    PctCrossesStopped,
    Possession,
}

impl StatId {
    pub const COUNT: usize = StatId::Possession as usize + 1;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn def(self) -> &'static StatDef {
        &STATS[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    pub fn polarity(self) -> Polarity {
        self.def().polarity
    }

    pub fn domain(self) -> Domain {
        self.def().domain
    }
}

impl fmt::Display for StatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const fn raw(
    id: StatId,
    name: &'static str,
    aliases: &'static [&'static str],
    polarity: Polarity,
    flavors: FlavorSet,
) -> StatDef {
    StatDef {
        id,
        name,
        aliases,
        polarity,
        domain: Domain::Count,
        flavors,
        kind: StatKind::Raw,
        team_column: None,
    }
}

const fn derived(
    id: StatId,
    name: &'static str,
    polarity: Polarity,
    domain: Domain,
    flavors: FlavorSet,
    formula: Formula,
) -> StatDef {
    StatDef {
        id,
        name,
        aliases: &[],
        polarity,
        domain,
        flavors,
        kind: StatKind::Derived(formula),
        team_column: None,
    }
}

use Polarity::{HigherBetter as Up, LowerBetter as Down};

// Indexed by `StatId as usize`; derived entries come after every input they read.
static STATS: [StatDef; StatId::COUNT] = [
    raw(StatId::Goals, "Goals", &["Gls"], Up, FlavorSet::OT),
    raw(StatId::Assists, "Assists", &["Ast"], Up, FlavorSet::OT),
    raw(StatId::Shots, "Shots Total", &["Shots", "Sh"], Up, FlavorSet::OT),
    raw(StatId::ShotsOnTarget, "Shots on Target", &["SoT"], Up, FlavorSet::OT),
    raw(StatId::Xg, "Expected Goals (xG)", &["xG"], Up, FlavorSet::OT),
    raw(StatId::Npxg, "Non-Penalty Expected Goals (npxG)", &["npxG"], Up, FlavorSet::OT),
    raw(StatId::Xa, "Expected Assists (xA)", &["xA", "Expected Assisted Goals (xAG)", "xAG"], Up, FlavorSet::OT),
    raw(StatId::Sca, "Shot-Creating Actions (SCA)", &["SCA"], Up, FlavorSet::OT),
    raw(StatId::Gca, "Goal-Creating Actions (GCA)", &["GCA"], Up, FlavorSet::OT),
    raw(StatId::KeyPasses, "Key Passes", &["KP"], Up, FlavorSet::OT),
    raw(StatId::PassesCompleted, "Passes Completed", &["Cmp"], Up, FlavorSet::OGT),
    raw(StatId::PassesAttempted, "Passes Attempted", &["Att"], Up, FlavorSet::OGT),
    raw(StatId::ProgressivePasses, "Progressive Passes", &["PrgP"], Up, FlavorSet::OT),
    raw(StatId::PassesFinalThird, "Passes into Final Third", &[], Up, FlavorSet::OT),
    raw(StatId::PassesPenaltyArea, "Passes into Penalty Area", &["PPA"], Up, FlavorSet::OT),
    raw(StatId::Crosses, "Crosses", &["Crs"], Up, FlavorSet::OT),
    raw(StatId::Carries, "Carries", &[], Up, FlavorSet::OT),
    raw(StatId::ProgressiveCarries, "Progressive Carries", &["PrgC"], Up, FlavorSet::OT),
    raw(StatId::ProgressiveRuns, "Progressive Runs", &["Progressive Passes Received", "PrgR"], Up, FlavorSet::OT),
    raw(StatId::CarriesPenaltyArea, "Carries into Penalty Area", &[], Up, FlavorSet::OT),
    raw(StatId::TakeOnsAttempted, "Take-Ons Attempted", &[], Up, FlavorSet::OT),
    raw(StatId::TakeOnsWon, "Successful Take-Ons", &[], Up, FlavorSet::OT),
    raw(StatId::Tackles, "Tackles", &["Tkl"], Up, FlavorSet::OT),
    raw(StatId::TacklesWon, "Tackles Won", &["TklW"], Up, FlavorSet::OT),
    raw(StatId::DribblersTackled, "Dribblers Tackled", &[], Up, FlavorSet::OT),
    raw(StatId::DribblesChallenged, "Dribbles Challenged", &["Challenges Attempted"], Up, FlavorSet::OT),
    raw(StatId::Blocks, "Blocks", &["Blk"], Up, FlavorSet::OT),
    raw(StatId::Interceptions, "Interceptions", &["Int"], Up, FlavorSet::OT),
    raw(StatId::Clearances, "Clearances", &["Clr"], Up, FlavorSet::OT),
    raw(StatId::BallRecoveries, "Ball Recoveries", &["Recov"], Up, FlavorSet::OT),
    raw(StatId::Errors, "Errors", &["Errors Leading to Shot", "Err"], Down, FlavorSet::OGT),
    raw(StatId::Touches, "Touches", &[], Up, FlavorSet::OGT),
    raw(StatId::TouchesMiddleThird, "Touches Middle Third", &["Touches in Middle Third", "Mid 3rd"], Up, FlavorSet::OT),
    raw(StatId::TouchesAttPenArea, "Touches in Attacking Penalty Area", &["Att Pen"], Up, FlavorSet::OT),
    raw(StatId::AerialWon, "Aerial Duels Won", &["Aerials Won"], Up, FlavorSet::OT),
    raw(StatId::AerialLost, "Aerial Duels Lost", &["Aerials Lost"], Up, FlavorSet::OT),
    raw(StatId::FoulsCommitted, "Fouls Committed", &["Fls"], Down, FlavorSet::OT),
    raw(StatId::FoulsDrawn, "Fouls Drawn", &["Fld"], Up, FlavorSet::OT),
    raw(StatId::Miscontrols, "Miscontrols", &["Mis"], Down, FlavorSet::OT),
    raw(StatId::Dispossessed, "Dispossessed", &["Dis"], Down, FlavorSet::OT),
    raw(StatId::YellowCards, "Yellow Cards", &["CrdY"], Down, FlavorSet::OGT),
    raw(StatId::RedCards, "Red Cards", &["CrdR"], Down, FlavorSet::OGT),
    raw(StatId::GoalsAgainst, "Goals Against", &["GA"], Down, FlavorSet::GT),
    raw(StatId::ShotsOnTargetAgainst, "Shots on Target Against", &["SoTA"], Up, FlavorSet::GT),
    raw(StatId::Saves, "Saves", &[], Up, FlavorSet::GT),
    raw(StatId::PostShotXg, "Post-Shot Expected Goals (PSxG)", &["PSxG"], Up, FlavorSet::GT),
    raw(StatId::PenaltiesFaced, "Penalty Kicks Attempted", &["PKatt"], Up, FlavorSet::G),
    raw(StatId::PenaltiesSaved, "Penalties Winner", &["Penaltys Winner", "Penalty Kicks Saved", "PKsv"], Up, FlavorSet::G),
    raw(StatId::LongPassesCompleted, "Completed Long Passes", &["Long Passes Completed"], Up, FlavorSet::G),
    raw(StatId::LongPassesAttempted, "Attempted Long Passes", &["Long Passes Attempted"], Up, FlavorSet::G),
    raw(StatId::CrossesFaced, "Crosses Faced", &["Opp"], Up, FlavorSet::G),
    raw(StatId::CrossesStopped, "Crosses Stopped", &["Stp"], Up, FlavorSet::G),
    raw(StatId::SweeperActions, "Sweeper Actions", &["Defensive Actions Outside Penalty Area", "#OPA"], Up, FlavorSet::G),
    raw(StatId::OpponentTouches, "Opponent Touches", &[], Down, FlavorSet::T),
    derived(
        StatId::Efficiency,
        "Efficiency",
        Up,
        Domain::Ratio,
        FlavorSet::OT,
        Formula::Ratio { num: StatId::Goals, den: StatId::Xg, scale: 1.0 },
    ),
    derived(
        StatId::PctTakeOns,
        "% Take-Ons",
        Up,
        Domain::Percentage,
        FlavorSet::OT,
        Formula::Ratio { num: StatId::TakeOnsWon, den: StatId::TakeOnsAttempted, scale: 100.0 },
    ),
    derived(
        StatId::ActionsCreated,
        "Actions created",
        Up,
        Domain::Count,
        FlavorSet::OT,
        Formula::Sum(&[StatId::Sca, StatId::Gca]),
    ),
    derived(
        StatId::ActionsPenaltyArea,
        "Actions in the Penalty Area",
        Up,
        Domain::Count,
        FlavorSet::OT,
        Formula::Sum(&[
            StatId::TouchesAttPenArea,
            StatId::PassesPenaltyArea,
            StatId::CarriesPenaltyArea,
        ]),
    ),
    derived(
        StatId::PctAerial,
        "% Aerial Duels",
        Up,
        Domain::Percentage,
        FlavorSet::OT,
        Formula::RatioOfSum {
            num: StatId::AerialWon,
            parts: &[StatId::AerialWon, StatId::AerialLost],
            scale: 100.0,
        },
    ),
    derived(
        StatId::ProgressiveActions,
        "Progressive Actions (Total)",
        Up,
        Domain::Count,
        FlavorSet::OT,
        Formula::Sum(&[
            StatId::ProgressivePasses,
            StatId::ProgressiveCarries,
            StatId::ProgressiveRuns,
        ]),
    ),
    derived(
        StatId::PctTacklesDuels,
        "% Tackles/Duels",
        Up,
        Domain::Percentage,
        FlavorSet::OT,
        Formula::Ratio {
            num: StatId::DribblersTackled,
            den: StatId::DribblesChallenged,
            scale: 100.0,
        },
    ),
    derived(
        StatId::BallLosses,
        "Ball Losses",
        Down,
        Domain::Count,
        FlavorSet::OT,
        Formula::Sum(&[StatId::Miscontrols, StatId::Dispossessed]),
    ),
    derived(
        StatId::PctPasses,
        "% Passes",
        Up,
        Domain::Percentage,
        FlavorSet::OGT,
        Formula::Ratio { num: StatId::PassesCompleted, den: StatId::PassesAttempted, scale: 100.0 },
    ),
    derived(
        StatId::PctShotsOnTarget,
        "% Shots on Target",
        Up,
        Domain::Percentage,
        FlavorSet::OT,
        Formula::Ratio { num: StatId::ShotsOnTarget, den: StatId::Shots, scale: 100.0 },
    ),
    derived(
        StatId::CleanSheets,
        "Clean Sheets",
        Up,
        Domain::Count,
        FlavorSet::GT,
        Formula::CleanSheet(StatId::GoalsAgainst),
    ),
    derived(
        StatId::PctSaves,
        "% Saves",
        Up,
        Domain::Percentage,
        FlavorSet::GT,
        Formula::Ratio { num: StatId::Saves, den: StatId::ShotsOnTargetAgainst, scale: 100.0 },
    ),
    StatDef {
        team_column: Some("Efficiency GK"),
        ..derived(
            StatId::GkEfficiency,
            "Efficiency",
            Up,
            Domain::Ratio,
            FlavorSet::GT,
            Formula::Difference(StatId::PostShotXg, StatId::GoalsAgainst),
        )
    },
    derived(
        StatId::PctLongPasses,
        "% Long Passes",
        Up,
        Domain::Percentage,
        FlavorSet::G,
        Formula::Ratio {
            num: StatId::LongPassesCompleted,
            den: StatId::LongPassesAttempted,
            scale: 100.0,
        },
    ),
    derived(
        StatId::PctCrossesStopped,
        "% Crosses Stopped",
        Up,
        Domain::Percentage,
        FlavorSet::G,
        Formula::Ratio { num: StatId::CrossesStopped, den: StatId::CrossesFaced, scale: 100.0 },
    ),
    derived(
        StatId::Possession,
        "Possession",
        Up,
        Domain::Percentage,
        FlavorSet::T,
        Formula::RatioOfSum {
            num: StatId::Touches,
            parts: &[StatId::Touches, StatId::OpponentTouches],
            scale: 100.0,
        },
    ),
];

const ATTACKER_FEATURES: &[StatId] = &[
    StatId::Goals,
    StatId::Efficiency,
    StatId::PctTakeOns,
    StatId::ActionsCreated,
    StatId::Xa,
    StatId::ActionsPenaltyArea,
    StatId::KeyPasses,
    StatId::PctAerial,
    StatId::ProgressiveActions,
    StatId::TakeOnsWon,
];

const MIDFIELDER_FEATURES: &[StatId] = &[
    StatId::ProgressiveActions,
    StatId::Interceptions,
    StatId::TacklesWon,
    StatId::Blocks,
    StatId::BallRecoveries,
    StatId::KeyPasses,
    StatId::FoulsCommitted,
    StatId::PctTacklesDuels,
    StatId::TouchesMiddleThird,
    StatId::PctAerial,
];

const DEFENDER_FEATURES: &[StatId] = &[
    StatId::Clearances,
    StatId::Blocks,
    StatId::Interceptions,
    StatId::PctAerial,
    StatId::Touches,
    StatId::FoulsCommitted,
    StatId::AerialWon,
    StatId::ProgressivePasses,
    StatId::BallRecoveries,
    StatId::PctTacklesDuels,
];

const GOALKEEPER_FEATURES: &[StatId] = &[
    StatId::CleanSheets,
    StatId::CrossesStopped,
    StatId::SweeperActions,
    StatId::Saves,
    StatId::GoalsAgainst,
    StatId::GkEfficiency,
    StatId::PenaltiesSaved,
    StatId::PctSaves,
    StatId::PctLongPasses,
    StatId::PctCrossesStopped,
];

pub const TEAM_FEATURES: &[StatId] = &[
    StatId::Goals,
    StatId::Efficiency,
    StatId::ActionsCreated,
    StatId::ActionsPenaltyArea,
    StatId::PctAerial,
    StatId::AerialWon,
    StatId::Possession,
    StatId::CleanSheets,
    StatId::GoalsAgainst,
    StatId::GkEfficiency,
];

#[derive(Debug, Clone, Copy)]
pub struct IndexDef {
    pub name: &'static str,
    pub flavor: Flavor,
    pub components: &'static [(StatId, f64)],
}

pub static INDICES: &[IndexDef] = &[
    IndexDef {
        name: "Offensive Index",
        flavor: Flavor::Outfield,
        components: &[
            (StatId::Goals, 0.25),
            (StatId::Xg, 0.15),
            (StatId::Efficiency, 0.10),
            (StatId::ActionsCreated, 0.15),
            (StatId::ActionsPenaltyArea, 0.15),
            (StatId::ShotsOnTarget, 0.10),
            (StatId::TakeOnsWon, 0.10),
        ],
    },
    IndexDef {
        name: "Passing Index",
        flavor: Flavor::Outfield,
        components: &[
            (StatId::KeyPasses, 0.20),
            (StatId::Xa, 0.20),
            (StatId::ProgressivePasses, 0.20),
            (StatId::PctPasses, 0.15),
            (StatId::PassesFinalThird, 0.15),
            (StatId::PassesPenaltyArea, 0.10),
        ],
    },
    IndexDef {
        name: "Possession Index",
        flavor: Flavor::Outfield,
        components: &[
            (StatId::Touches, 0.20),
            (StatId::ProgressiveCarries, 0.20),
            (StatId::ProgressiveRuns, 0.15),
            (StatId::PctTakeOns, 0.15),
            (StatId::Carries, 0.10),
            (StatId::BallLosses, 0.20),
        ],
    },
    IndexDef {
        name: "Defensive Index",
        flavor: Flavor::Outfield,
        components: &[
            (StatId::TacklesWon, 0.20),
            (StatId::Interceptions, 0.20),
            (StatId::Blocks, 0.15),
            (StatId::Clearances, 0.15),
            (StatId::BallRecoveries, 0.10),
            (StatId::PctTacklesDuels, 0.10),
            (StatId::PctAerial, 0.10),
        ],
    },
    IndexDef {
        name: "Line Index",
        flavor: Flavor::Goalkeeper,
        components: &[
            (StatId::PctSaves, 0.25),
            (StatId::GkEfficiency, 0.20),
            (StatId::GoalsAgainst, 0.15),
            (StatId::PctCrossesStopped, 0.15),
            (StatId::Saves, 0.10),
            (StatId::CleanSheets, 0.10),
            (StatId::PenaltiesSaved, 0.05),
        ],
    },
    IndexDef {
        name: "Passes Index",
        flavor: Flavor::Goalkeeper,
        components: &[
            (StatId::PctLongPasses, 0.35),
            (StatId::PctPasses, 0.25),
            (StatId::LongPassesCompleted, 0.20),
            (StatId::SweeperActions, 0.20),
        ],
    },
];

pub fn all_stats() -> &'static [StatDef] {
    &STATS
}

/// Stats that have a column in tables of the given flavor, in registry order.
pub fn stats_for(flavor: Flavor) -> impl Iterator<Item = &'static StatDef> {
    STATS.iter().filter(move |def| def.flavors.contains(flavor))
}

pub fn indices_for(flavor: Flavor) -> impl Iterator<Item = &'static IndexDef> {
    INDICES.iter().filter(move |def| def.flavor == flavor)
}

static RAW_HEADERS: Lazy<HashMap<(Flavor, String), StatId>> = Lazy::new(|| {
    let mut out = HashMap::new();
    for flavor in [Flavor::Outfield, Flavor::Goalkeeper, Flavor::Team] {
        for def in stats_for(flavor).filter(|def| !def.is_derived()) {
            for label in std::iter::once(&def.name).chain(def.aliases.iter()) {
                out.entry((flavor, header_key(label))).or_insert(def.id);
            }
        }
    }
    out
});

/// Resolves a CSV header to the raw stat it carries for the given table flavor.
pub fn raw_stat_for_header(flavor: Flavor, header: &str) -> Option<StatId> {
    RAW_HEADERS.get(&(flavor, header_key(header))).copied()
}

pub fn header_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_indexed_by_id() {
        for (idx, def) in STATS.iter().enumerate() {
            assert_eq!(def.id.index(), idx, "{} is out of place", def.name);
        }
    }

    #[test]
    fn derived_inputs_precede_outputs() {
        for def in STATS.iter() {
            let StatKind::Derived(formula) = def.kind else {
                continue;
            };
            let inputs: Vec<StatId> = match formula {
                Formula::Ratio { num, den, .. } => vec![num, den],
                Formula::RatioOfSum { num, parts, .. } => {
                    let mut v = vec![num];
                    v.extend_from_slice(parts);
                    v
                }
                Formula::Sum(parts) => parts.to_vec(),
                Formula::Difference(a, b) => vec![a, b],
                Formula::CleanSheet(a) => vec![a],
            };
            for input in inputs {
                assert!(input < def.id, "{} reads {} which comes later", def.name, input);
            }
        }
    }

    #[test]
    fn index_weights_sum_to_one() {
        for index in INDICES {
            let total: f64 = index.components.iter().map(|(_, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9, "{} sums to {total}", index.name);
            for (stat, _) in index.components {
                assert!(stat.def().flavors.contains(index.flavor));
            }
        }
    }

    #[test]
    fn feature_sets_stay_inside_their_flavor() {
        for role in Role::ALL {
            assert_eq!(role.feature_set().len(), 10);
            for stat in role.feature_set() {
                assert!(stat.def().flavors.contains(role.flavor()), "{role} / {stat}");
            }
        }
        for stat in TEAM_FEATURES {
            assert!(stat.def().flavors.contains(Flavor::Team));
        }
    }

    #[test]
    fn negative_polarity_catalog() {
        for stat in [
            StatId::GoalsAgainst,
            StatId::FoulsCommitted,
            StatId::Errors,
            StatId::BallLosses,
        ] {
            assert_eq!(stat.polarity(), Polarity::LowerBetter);
        }
        assert_eq!(StatId::Goals.polarity(), Polarity::HigherBetter);
    }

    #[test]
    fn penalty_spellings_share_one_stat() {
        assert_eq!(
            raw_stat_for_header(Flavor::Goalkeeper, "Penaltys Winner"),
            Some(StatId::PenaltiesSaved)
        );
        assert_eq!(
            raw_stat_for_header(Flavor::Goalkeeper, "Penalties Winner"),
            Some(StatId::PenaltiesSaved)
        );
        assert_eq!(raw_stat_for_header(Flavor::Outfield, "Penalties Winner"), None);
    }

    #[test]
    fn roles_parse_from_position_strings() {
        assert_eq!(Role::parse("FW,MF"), Some(Role::Forward));
        assert_eq!(Role::parse("gk"), Some(Role::Goalkeeper));
        assert_eq!(Role::parse("AM"), Some(Role::AttackingMidfielder));
        assert_eq!(Role::parse("CB"), Some(Role::Defender));
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("XX"), None);
    }

    #[test]
    fn team_columns_do_not_collide() {
        let mut seen = std::collections::HashSet::new();
        for def in stats_for(Flavor::Team) {
            assert!(seen.insert(def.column(Flavor::Team)), "{}", def.name);
        }
    }
}
