//! Tabular report export
//!
//! [`ReportExporter`] writes a [`Report`] into a single-sheet workbook, applies
//! [`StyleRule`]s in order, sizes every column from its longest value and saves
//! the result.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::Result;
use crate::fast_writer::{validate_sheet_name, Workbook};
use crate::style::StyleRule;
use crate::types::{CellValue, Report};

/// Characters added to the longest value before scaling
pub const DEFAULT_WIDTH_PADDING: usize = 2;
/// Scale applied to the padded length
pub const DEFAULT_WIDTH_FACTOR: f64 = 1.2;
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Export settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub sheet_name: String,
    pub width_padding: usize,
    pub width_factor: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            width_padding: DEFAULT_WIDTH_PADDING,
            width_factor: DEFAULT_WIDTH_FACTOR,
        }
    }
}

impl ExportOptions {
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }

    pub fn with_width_padding(mut self, padding: usize) -> Self {
        self.width_padding = padding;
        self
    }

    pub fn with_width_factor(mut self, factor: f64) -> Self {
        self.width_factor = factor;
        self
    }

    /// `(max_len + padding) * factor`
    pub fn width_for(&self, max_len: usize) -> f64 {
        (max_len + self.width_padding) as f64 * self.width_factor
    }
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    /// Rows written, header included
    pub rows: usize,
    pub columns: usize,
    pub column_widths: Vec<f64>,
}

/// Longest display length per column, header included
pub fn max_text_lengths(report: &Report) -> Vec<usize> {
    (0..report.column_count())
        .map(|col| {
            report
                .column_values(col)
                .map(|v| v.char_len())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

/// Declared width of every column
pub fn column_widths(report: &Report, options: &ExportOptions) -> Vec<f64> {
    max_text_lengths(report)
        .into_iter()
        .map(|len| options.width_for(len))
        .collect()
}

/// Writes reports to styled, width-adjusted XLSX files
///
/// # Examples
///
/// ```no_run
/// use sheetreport::exporter::ReportExporter;
/// use sheetreport::style::{CellFormat, StyleRule};
/// use sheetreport::types::{CellValue, Report};
///
/// # fn main() -> sheetreport::Result<()> {
/// let mut report = Report::new(["Name", "Age"]);
/// report.push_row([CellValue::from("Zhang"), CellValue::from(18)])?;
///
/// let rules = vec![StyleRule::parse("A1:B1", CellFormat::new().bold(true))?];
/// ReportExporter::new().export(&report, &rules, "people.xlsx")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReportExporter {
    options: ExportOptions,
}

impl ReportExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExportOptions) -> Self {
        ReportExporter { options }
    }

    /// Build the workbook for `report` without touching the filesystem
    pub fn build_workbook(&self, report: &Report, rules: &[StyleRule]) -> Result<Workbook> {
        validate_sheet_name(&self.options.sheet_name)?;

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet(&self.options.sheet_name)?;

        let header: Vec<CellValue> = report
            .columns()
            .iter()
            .map(|h| CellValue::String(h.clone()))
            .collect();
        sheet.append_row(&header);
        for row in report.rows() {
            sheet.append_row(row);
        }
        debug!(
            rows = sheet.row_count(),
            cols = sheet.col_count(),
            "rows appended"
        );

        let (rows, cols) = (sheet.row_count(), sheet.col_count());
        for rule in rules {
            for cell in rule.range.cells_within(rows, cols) {
                sheet.apply_format(cell, &rule.format);
            }
        }
        debug!(rules = rules.len(), "style rules applied");

        for (col, width) in column_widths(report, &self.options).into_iter().enumerate() {
            sheet.set_column_width(col as u32, width);
        }

        Ok(workbook)
    }

    /// Export `report` to `path`, replacing any existing file
    ///
    /// Returns only after the file has been flushed and synced.
    pub fn export<P: AsRef<Path>>(
        &self,
        report: &Report,
        rules: &[StyleRule],
        path: P,
    ) -> Result<ExportSummary> {
        let path = path.as_ref();
        let workbook = self.build_workbook(report, rules)?;
        workbook.save(path)?;

        let summary = ExportSummary {
            path: path.to_path_buf(),
            rows: report.row_count() + 1,
            columns: report.column_count(),
            column_widths: column_widths(report, &self.options),
        };
        info!(
            path = %path.display(),
            rows = summary.rows,
            columns = summary.columns,
            "report exported"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{CellFormat, Color};
    use crate::types::Cell;

    fn people() -> Report {
        Report::new(["Name", "Age"])
            .with_row([CellValue::from("Zhang"), CellValue::from(18)])
            .unwrap()
            .with_row([CellValue::from("Li"), CellValue::from(17)])
            .unwrap()
    }

    #[test]
    fn test_column_widths() {
        let widths = column_widths(&people(), &ExportOptions::default());
        assert_eq!(widths, vec![(5 + 2) as f64 * 1.2, (3 + 2) as f64 * 1.2]);
        assert!((widths[0] - 8.4).abs() < 1e-9);
    }

    #[test]
    fn test_widths_count_characters_not_bytes() {
        let report = Report::new(["姓名"])
            .with_row([CellValue::from("张三")])
            .unwrap();
        assert_eq!(max_text_lengths(&report), vec![2]);
    }

    #[test]
    fn test_widths_for_header_only_report() {
        let report = Report::new(["Total"]);
        assert_eq!(max_text_lengths(&report), vec![5]);
    }

    #[test]
    fn test_custom_width_options() {
        let options = ExportOptions::default()
            .with_width_padding(0)
            .with_width_factor(1.0);
        assert_eq!(column_widths(&people(), &options), vec![5.0, 3.0]);
    }

    #[test]
    fn test_build_workbook_applies_rules_in_order() {
        let blue = Color::parse("0000FF").unwrap();
        let red = Color::parse("FF0000").unwrap();
        let rules = vec![
            StyleRule::parse("A1:B1", CellFormat::new().bold(true).font_color(blue)).unwrap(),
            StyleRule::parse("B1:B3", CellFormat::new().font_color(red.clone())).unwrap(),
        ];

        let workbook = ReportExporter::new()
            .build_workbook(&people(), &rules)
            .unwrap();
        let sheet = &workbook.worksheets()[0];

        let overlap = sheet.format(Cell::new(0, 1)).unwrap();
        assert_eq!(overlap.bold, Some(true));
        assert_eq!(overlap.font_color, Some(red));
        assert_eq!(sheet.format(Cell::new(1, 0)), None);
        assert_eq!(sheet.row_count(), 3);
        assert_eq!(sheet.column_width(0), Some(7.0 * 1.2));
    }

    #[test]
    fn test_invalid_sheet_name_rejected() {
        let exporter =
            ReportExporter::with_options(ExportOptions::default().with_sheet_name("a:b"));
        assert!(exporter.build_workbook(&people(), &[]).is_err());
    }
}
