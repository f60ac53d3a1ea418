use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::population::{CompetitionCatalog, SeasonCode, Tier};

const DEFAULT_DATA_ROOT: &str = "csv";

/// Loads `.env.local` then `.env`; variables already set win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_root: PathBuf,
    pub min_minutes: u32,
    pub catalog: CompetitionCatalog,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            min_minutes: 0,
            catalog: CompetitionCatalog::builtin(),
        }
    }
}

impl Config {
    /// Reads `CENTILE_DATA_ROOT`, `CENTILE_MIN_MINUTES` and `CENTILE_COMPETITIONS`.
    pub fn from_env() -> PipelineResult<Self> {
        let mut cfg = Config::default();
        if let Some(root) = env_value("CENTILE_DATA_ROOT") {
            cfg.data_root = PathBuf::from(root);
        }
        if let Some(raw) = env_value("CENTILE_MIN_MINUTES") {
            cfg.min_minutes = raw.parse::<u32>().map_err(|_| {
                PipelineError::Config(format!("CENTILE_MIN_MINUTES must be a whole number, got '{raw}'"))
            })?;
        }
        if let Some(path) = env_value("CENTILE_COMPETITIONS") {
            cfg.catalog = load_catalog(Path::new(&path))?;
        }
        Ok(cfg)
    }

    pub fn with_overrides(mut self, data_root: Option<PathBuf>, min_minutes: Option<u32>) -> Self {
        if let Some(root) = data_root {
            self.data_root = root;
        }
        if let Some(min) = min_minutes {
            self.min_minutes = min;
        }
        self
    }

    pub fn season_dir(&self, season: &SeasonCode) -> PathBuf {
        self.data_root.join(season.dir_name())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn load_catalog(path: &Path) -> PipelineResult<CompetitionCatalog> {
    let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    CompetitionCatalog::from_json(&raw)
}

/// Paths inside one season folder.
#[derive(Debug, Clone)]
pub struct SeasonPaths {
    pub root: PathBuf,
}

impl SeasonPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn clean_players(&self) -> PathBuf {
        self.root.join("clean").join("data_players.csv")
    }

    pub fn clean_goalkeepers(&self) -> PathBuf {
        self.root.join("clean").join("data_goals.csv")
    }

    pub fn games(&self, league_label: &str) -> PathBuf {
        self.root
            .join("leagues_games")
            .join(format!("{league_label}_games.csv"))
    }

    pub fn staging(&self, tier: Tier) -> PathBuf {
        self.root.join(format!(".staging-{}", tier.as_str()))
    }

    pub fn centiles(&self, tier: Tier, kind: &str, gk: bool) -> PathBuf {
        let suffix = if gk { "_gk" } else { "" };
        self.root
            .join("centiles")
            .join(format!("{}_{kind}{suffix}.csv", tier.as_str()))
    }

    pub fn metrics(&self, tier: Tier, gk: bool) -> PathBuf {
        let suffix = if gk { "_gk" } else { "" };
        self.root
            .join("metrics")
            .join(format!("{}_metrics{suffix}.csv", tier.as_str()))
    }

    pub fn teams(&self, tier: Tier, kind: &str) -> PathBuf {
        self.root
            .join("teams")
            .join(format!("{}_{kind}.csv", tier.as_str()))
    }

    pub fn ratings(&self, gk: bool) -> PathBuf {
        let name = if gk { "data_goals.csv" } else { "data_players.csv" };
        self.root.join("ratings").join(name)
    }
}
