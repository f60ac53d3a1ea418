use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::PipelineResult;
use crate::pipeline::{PartitionModel, render_tables};
use crate::table::{Cell, Table};

/// Excel caps sheet names at 31 characters.
const SHEET_NAME_MAX: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub sheets: Vec<String>,
    pub rows: usize,
}

fn sheet_name(rel: &Path, model: &PartitionModel) -> String {
    let dir = rel
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = rel
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{}_", model.tier.as_str());
    let stem = stem.strip_prefix(&prefix).unwrap_or(&stem);
    let mut name = if dir.is_empty() {
        stem.to_string()
    } else {
        format!("{dir}_{stem}")
    };
    name.truncate(SHEET_NAME_MAX);
    name
}

fn rounded(value: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

fn write_table(worksheet: &mut Worksheet, table: &Table, header: &Format) -> PipelineResult<()> {
    for (col_idx, name) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, name, header)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = row_idx as u32 + 1;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = col_idx as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Int(v) => {
                    worksheet.write_number(r, c, *v as f64)?;
                }
                Cell::Num(v) if v.is_finite() => {
                    worksheet.write_number(r, c, rounded(*v, table.format.decimals))?;
                }
                Cell::Num(_) | Cell::Empty => {}
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Writes every derived table of a partition as one sheet of an `.xlsx` workbook.
pub fn export_partition(model: &PartitionModel, path: &Path) -> PipelineResult<ExportReport> {
    let tables = render_tables(model);
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let mut sheets = Vec::with_capacity(tables.len());
    let mut rows = 0usize;
    for (rel, table) in &tables {
        let name = sheet_name(rel, model);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;
        write_table(sheet, table, &header)?;
        rows += table.rows.len();
        sheets.push(name);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| crate::error::PipelineError::io(parent, e))?;
    }
    workbook.save(path)?;
    tracing::info!(path = %path.display(), sheets = sheets.len(), rows, "workbook written");
    Ok(ExportReport { sheets, rows })
}
