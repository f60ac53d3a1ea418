use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("required input missing: {}", path.display())]
    InputMissing { path: PathBuf },

    #[error("schema violation in {file}: {reason}")]
    SchemaViolation { file: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn schema(file: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::SchemaViolation {
            file: file.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code for the `rebuild` command.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::InputMissing { .. } => 1,
            PipelineError::SchemaViolation { .. } => 2,
            _ => 3,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WarningKind {
    /// Whole row skipped (bad minutes, unknown role or competition, duplicate key).
    RowDefect,
    /// Single stat cell unparseable; the value is treated as null.
    CellDefect,
    /// No usable values for a (role, feature) population.
    PopulationEmpty,
    /// Optional input absent (per-league games table).
    OptionalInputMissing,
}

impl WarningKind {
    pub fn label(self) -> &'static str {
        match self {
            WarningKind::RowDefect => "RowDefect",
            WarningKind::CellDefect => "CellDefect",
            WarningKind::PopulationEmpty => "PopulationEmpty",
            WarningKind::OptionalInputMissing => "OptionalInputMissing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub source: String,
    pub line: Option<u64>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "[{}] {}:{}: {}",
                self.kind.label(),
                self.source,
                line,
                self.message
            ),
            None => write!(f, "[{}] {}: {}", self.kind.label(), self.source, self.message),
        }
    }
}

/// Per-run sink for recoverable defects.
#[derive(Debug, Clone, Default)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: WarningKind,
        source: impl Into<String>,
        line: Option<u64>,
        message: impl Into<String>,
    ) {
        let warning = Warning {
            kind,
            source: source.into(),
            line,
            message: message.into(),
        };
        match kind {
            WarningKind::CellDefect => tracing::debug!("{warning}"),
            _ => tracing::warn!("{warning}"),
        }
        self.items.push(warning);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.items.iter().filter(|w| w.kind == kind).count()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&item.to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let missing = PipelineError::InputMissing {
            path: PathBuf::from("csv24_25/clean/data_players.csv"),
        };
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(PipelineError::schema("data_players.csv", "no Minutes").exit_code(), 2);
        assert_eq!(PipelineError::Config("bad".into()).exit_code(), 3);
    }

    #[test]
    fn warnings_render_one_line_each() {
        let mut warnings = Warnings::new();
        warnings.push(WarningKind::RowDefect, "data_players.csv", Some(4), "unknown role 'XX'");
        warnings.push(WarningKind::PopulationEmpty, "TopLeagues", None, "no GK rows");
        assert_eq!(warnings.count(WarningKind::RowDefect), 1);
        assert_eq!(
            warnings.render(),
            "[RowDefect] data_players.csv:4: unknown role 'XX'\n[PopulationEmpty] TopLeagues: no GK rows\n"
        );
    }
}
