use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    TopLeagues,
    OthersLeagues,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::TopLeagues, Tier::OthersLeagues];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::TopLeagues => "TopLeagues",
            Tier::OthersLeagues => "OthersLeagues",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "topleagues" | "top" => Ok(Tier::TopLeagues),
            "othersleagues" | "others" => Ok(Tier::OthersLeagues),
            other => Err(format!(
                "unknown tier '{other}' (expected TopLeagues or OthersLeagues)"
            )),
        }
    }
}

/// Tier argument of the CLI: a single partition or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierSelection {
    One(Tier),
    All,
}

impl TierSelection {
    pub fn tiers(self) -> Vec<Tier> {
        match self {
            TierSelection::One(tier) => vec![tier],
            TierSelection::All => Tier::ALL.to_vec(),
        }
    }
}

impl FromStr for TierSelection {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(TierSelection::All);
        }
        raw.parse::<Tier>().map(TierSelection::One)
    }
}

/// Season code such as `24_25`: two two-digit years, the second following the first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeasonCode(String);

impl SeasonCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Folder name used under the data root (`csv24_25`).
    pub fn dir_name(&self) -> String {
        format!("csv{}", self.0)
    }
}

impl fmt::Display for SeasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SeasonCode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let bytes = s.as_bytes();
        let digits_ok = bytes.len() == 5
            && bytes[2] == b'_'
            && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
        if !digits_ok {
            return Err(format!("season code '{s}' must look like 24_25"));
        }
        let (Ok(first), Ok(second)) = (s[..2].parse::<u32>(), s[3..].parse::<u32>()) else {
            return Err(format!("season code '{s}' must look like 24_25"));
        };
        if (first + 1) % 100 != second {
            return Err(format!("season code '{s}' must span consecutive years"));
        }
        Ok(SeasonCode(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competition {
    pub name: String,
    pub tier: Tier,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CompetitionCatalog {
    entries: Vec<Competition>,
    by_key: HashMap<String, usize>,
}

const BUILTIN: &[(&str, Tier, &[&str])] = &[
    ("Premier League", Tier::TopLeagues, &["EPL", "English Premier League"]),
    ("La Liga", Tier::TopLeagues, &["LaLiga", "Liga"]),
    ("Serie A", Tier::TopLeagues, &["Italian Serie A"]),
    ("Bundesliga", Tier::TopLeagues, &["German Bundesliga"]),
    ("Ligue 1", Tier::TopLeagues, &["Ligue1"]),
    ("Champions League", Tier::TopLeagues, &["UCL", "UEFA Champions League"]),
    ("Europa League", Tier::TopLeagues, &["UEL", "UEFA Europa League"]),
    (
        "Conference League",
        Tier::TopLeagues,
        &["UECL", "UEFA Conference League", "Europa Conference League"],
    ),
    (
        "Liga Profesional Argentina",
        Tier::OthersLeagues,
        &["Argentine Primera", "Primera Division"],
    ),
    (
        "Brasileirao Serie A",
        Tier::OthersLeagues,
        &["Brasileirão", "Brazilian Série A", "Serie A Brazil", "Brasileirao"],
    ),
    ("Eredivisie", Tier::OthersLeagues, &["Dutch Eredivisie"]),
    ("Major League Soccer", Tier::OthersLeagues, &["MLS"]),
    ("Primeira Liga", Tier::OthersLeagues, &["Portuguese Primeira Liga", "Liga Portugal"]),
    ("Copa Libertadores", Tier::OthersLeagues, &["Libertadores"]),
    ("Championship", Tier::OthersLeagues, &["EFL Championship", "English Championship"]),
    ("Serie B", Tier::OthersLeagues, &["Italian Serie B"]),
    ("Liga MX", Tier::OthersLeagues, &["Mexican Liga MX"]),
    ("Belgian Pro League", Tier::OthersLeagues, &["Pro League", "Jupiler Pro League"]),
];

impl CompetitionCatalog {
    pub fn new(entries: Vec<Competition>) -> Self {
        let mut by_key = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for label in std::iter::once(&entry.name).chain(entry.aliases.iter()) {
                by_key.entry(competition_key(label)).or_insert(idx);
            }
        }
        Self { entries, by_key }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(name, tier, aliases)| Competition {
                    name: name.to_string(),
                    tier: *tier,
                    aliases: aliases.iter().map(|a| a.to_string()).collect(),
                })
                .collect(),
        )
    }

    pub fn from_json(raw: &str) -> PipelineResult<Self> {
        let entries: Vec<Competition> = serde_json::from_str(raw)?;
        if entries.is_empty() {
            return Err(PipelineError::Config(
                "competition catalog override is empty".to_string(),
            ));
        }
        Ok(Self::new(entries))
    }

    pub fn resolve(&self, raw: &str) -> Option<&Competition> {
        let idx = self.by_key.get(&competition_key(raw))?;
        self.entries.get(*idx)
    }

    pub fn competitions(&self, tier: Tier) -> impl Iterator<Item = &Competition> {
        self.entries.iter().filter(move |c| c.tier == tier)
    }
}

impl Default for CompetitionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn competition_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        let ch = match ch {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        };
        if ch.is_alphanumeric() {
            out.push(ch);
        }
    }
    out
}
