use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    /// Number rendered with the column's decimals.
    Num(f64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, Cell::text)
    }

    pub fn opt_num(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Num)
    }
}

/// How numbers of a table are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimals: usize,
    /// Drop trailing zeros (and a dangling point).
    pub trim: bool,
}

impl NumberFormat {
    pub const RATING: NumberFormat = NumberFormat { decimals: 2, trim: false };
    pub const AGGREGATE: NumberFormat = NumberFormat { decimals: 3, trim: true };
    pub const CENTILE: NumberFormat = NumberFormat { decimals: 1, trim: false };
}

pub fn format_number(value: f64, format: NumberFormat) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let mut out = format!("{:.*}", format.decimals, value);
    if format.trim && out.contains('.') {
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
    }
    if let Some(rest) = out.strip_prefix('-') {
        if rest.chars().all(|c| c == '0' || c == '.') {
            out.remove(0);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub format: NumberFormat,
}

impl Table {
    pub fn new(headers: Vec<String>, format: NumberFormat) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            format,
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn render_cell(&self, cell: &Cell) -> String {
        match cell {
            Cell::Text(s) => s.clone(),
            Cell::Int(v) => v.to_string(),
            Cell::Num(v) => format_number(*v, self.format),
            Cell::Empty => String::new(),
        }
    }

    pub fn to_csv_bytes(&self) -> PipelineResult<Vec<u8>> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let csv_err = |e: csv::Error| PipelineError::Csv {
            file: "<table>".to_string(),
            source: e,
        };
        wtr.write_record(&self.headers).map_err(csv_err)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| self.render_cell(c)))
                .map_err(csv_err)?;
        }
        wtr.into_inner()
            .map_err(|e| PipelineError::io("<table>", std::io::Error::other(e.to_string())))
    }
}
