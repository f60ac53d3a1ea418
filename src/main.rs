use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use centile_engine::config::{self, Config};
use centile_engine::error::PipelineError;
use centile_engine::export::export_partition;
use centile_engine::fake_season::{SynthOptions, write_season};
use centile_engine::leaders::{LeaderFilter, season_leaders, stat_by_name, top_match_performances};
use centile_engine::logging::{LogFormat, init_logging};
use centile_engine::pipeline::{load_partition, rebuild};
use centile_engine::population::{SeasonCode, Tier, TierSelection};
use centile_engine::registry::Role;
use centile_engine::table::{NumberFormat, format_number};

#[derive(Parser)]
#[command(name = "centile_engine", version)]
#[command(about = "Per-match ratings, per-90 aggregates and role percentiles for football seasons", long_about = None)]
struct Cli {
    /// Data root holding csv<season>/ folders (overrides CENTILE_DATA_ROOT)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Minimum minutes to enter a percentile population (overrides CENTILE_MIN_MINUTES)
    #[arg(long, global = true)]
    min_minutes: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recompute every derived table of a season
    Rebuild {
        #[arg(long)]
        season: SeasonCode,
        /// TopLeagues, OthersLeagues or all
        #[arg(long, default_value = "all")]
        tier: TierSelection,
    },

    /// Players of the season by average rating
    Leaders {
        #[arg(long)]
        season: SeasonCode,
        #[arg(long, default_value = "TopLeagues")]
        tier: Tier,
        /// Restrict to one role (GK, DF, MF, MO, FW)
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        competition: Option<String>,
        #[arg(long, default_value_t = 1)]
        min_matches: u32,
        /// Minimum % of minutes played: minutes / (matches * 90), in percent
        #[arg(long, default_value_t = 0.0)]
        min_minutes_pct: f64,
        #[arg(long, default_value_t = 30)]
        top: usize,
    },

    /// Best single-match values of one stat
    TopMatches {
        #[arg(long)]
        season: SeasonCode,
        #[arg(long, default_value = "TopLeagues")]
        tier: Tier,
        /// Stat column name, e.g. "Goals" or "Tackles Won"
        #[arg(long)]
        stat: String,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        competition: Option<String>,
        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Write a partition's derived tables to an .xlsx workbook
    Export {
        #[arg(long)]
        season: SeasonCode,
        #[arg(long, default_value = "TopLeagues")]
        tier: Tier,
        #[arg(long)]
        out: PathBuf,
    },

    /// Write a seeded synthetic season into the data root
    Synth {
        #[arg(long)]
        season: SeasonCode,
        #[arg(long, default_value_t = 7)]
        seed: u64,
        #[arg(long, default_value_t = 6)]
        teams: usize,
        #[arg(long, default_value_t = 10)]
        matchdays: usize,
        /// League labels; defaults to two top leagues and one other
        #[arg(long = "league")]
        leagues: Vec<String>,
    },
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>> {
    raw.map(|r| Role::parse(r).ok_or_else(|| anyhow!("unknown role '{r}'")))
        .transpose()
}

fn run(cli: Cli) -> Result<()> {
    let cfg = Config::from_env()
        .context("load configuration")?
        .with_overrides(cli.data_root, cli.min_minutes);

    match cli.command {
        Commands::Rebuild { season, tier } => {
            let reports = rebuild(&cfg, &season, tier)
                .with_context(|| format!("rebuild season {season}"))?;
            for report in reports {
                let rows: usize = report.manifest.files.iter().map(|f| f.rows).sum();
                println!(
                    "{} {}: {} files, {} rows, {} warnings",
                    season,
                    report.tier,
                    report.manifest.files.len(),
                    rows,
                    report.manifest.warnings
                );
            }
        }

        Commands::Leaders {
            season,
            tier,
            role,
            competition,
            min_matches,
            min_minutes_pct,
            top,
        } => {
            let (model, _) = load_partition(&cfg, &season, tier)
                .with_context(|| format!("load {season} {tier}"))?;
            let filter = LeaderFilter {
                role: parse_role(role.as_deref())?,
                competition,
                min_matches,
                min_minutes_pct,
                limit: top,
            };
            println!(
                "{:<4} {:<28} {:<4} {:>7} {:>4} {:>6}  Team(s)",
                "#", "Player", "Role", "Rating", "MP", "Min"
            );
            for (rank, row) in season_leaders(&model, &filter).iter().enumerate() {
                println!(
                    "{:<4} {:<28} {:<4} {:>7} {:>4} {:>6}  {}",
                    rank + 1,
                    row.player,
                    row.role,
                    format_number(row.average_rating, NumberFormat::RATING),
                    row.matches,
                    row.minutes,
                    row.teams
                );
            }
        }

        Commands::TopMatches {
            season,
            tier,
            stat,
            role,
            competition,
            top,
        } => {
            let stat_id = stat_by_name(&stat).ok_or_else(|| anyhow!("unknown stat '{stat}'"))?;
            let (model, _) = load_partition(&cfg, &season, tier)
                .with_context(|| format!("load {season} {tier}"))?;
            let filter = LeaderFilter {
                role: parse_role(role.as_deref())?,
                competition,
                min_matches: 0,
                min_minutes_pct: 0.0,
                limit: top,
            };
            println!(
                "{:<28} {:>8} {:>7} {:>4} {:<6} {:<22} Opponent",
                "Player", stat_id.name(), "Rating", "Min", "Score", "Team"
            );
            for row in top_match_performances(&model, stat_id, &filter) {
                println!(
                    "{:<28} {:>8} {:>7} {:>4} {:<6} {:<22} {}",
                    row.player,
                    format_number(row.value, NumberFormat::AGGREGATE),
                    format_number(row.rating, NumberFormat::RATING),
                    row.minutes,
                    row.score.map(|s| s.label()).unwrap_or_default(),
                    row.team,
                    row.opponent.as_deref().unwrap_or("-")
                );
            }
        }

        Commands::Export { season, tier, out } => {
            let (model, _) = load_partition(&cfg, &season, tier)
                .with_context(|| format!("load {season} {tier}"))?;
            let report = export_partition(&model, &out)
                .with_context(|| format!("export workbook {}", out.display()))?;
            println!(
                "Wrote {} ({} sheets, {} rows)",
                out.display(),
                report.sheets.len(),
                report.rows
            );
        }

        Commands::Synth {
            season,
            seed,
            teams,
            matchdays,
            leagues,
        } => {
            let mut options = SynthOptions {
                seed,
                teams_per_league: teams,
                matchdays,
                ..SynthOptions::default()
            };
            if !leagues.is_empty() {
                options.leagues = leagues;
            }
            let dir = cfg.season_dir(&season);
            let report = write_season(&dir, &options)
                .with_context(|| format!("write synthetic season into {}", dir.display()))?;
            println!(
                "Wrote {}: {} outfield rows, {} goalkeeper rows, {} fixtures",
                dir.display(),
                report.outfield_rows,
                report.goalkeeper_rows,
                report.fixtures
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    config::load_dotenv();
    init_logging(LogFormat::from_env());

    // Usage errors share the generic failure code; --help and --version succeed.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(3)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<PipelineError>()
                .map_or(3, PipelineError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}
