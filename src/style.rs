//! Cell formatting: colors, alignment, partial formats and range rules

use std::fmt;
use std::str::FromStr;

use crate::error::{ReportError, Result};
use crate::types::Cell;

/// RGB color stored as upper-case `RRGGBB`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    /// Parse `RRGGBB`, `#RRGGBB` or `AARRGGBB`; alpha is dropped
    pub fn parse(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ReportError::InvalidColor(hex.to_string()));
        }
        let rgb = match digits.len() {
            6 => digits,
            8 => &digits[2..],
            _ => return Err(ReportError::InvalidColor(hex.to_string())),
        };
        Ok(Color(rgb.to_ascii_uppercase()))
    }

    /// `RRGGBB`
    pub fn hex(&self) -> &str {
        &self.0
    }

    /// `FFRRGGBB`, the form used in styles.xml
    pub fn argb(&self) -> String {
        format!("FF{}", self.0)
    }
}

impl FromStr for Color {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    pub fn as_xml(&self) -> &'static str {
        match self {
            HorizontalAlign::Left => "left",
            HorizontalAlign::Center => "center",
            HorizontalAlign::Right => "right",
        }
    }

    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "left" => Some(HorizontalAlign::Left),
            "center" => Some(HorizontalAlign::Center),
            "right" => Some(HorizontalAlign::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

impl VerticalAlign {
    /// SpreadsheetML calls the middle position "center"
    pub fn as_xml(&self) -> &'static str {
        match self {
            VerticalAlign::Top => "top",
            VerticalAlign::Middle => "center",
            VerticalAlign::Bottom => "bottom",
        }
    }

    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "top" => Some(VerticalAlign::Top),
            "center" => Some(VerticalAlign::Middle),
            "bottom" => Some(VerticalAlign::Bottom),
            _ => None,
        }
    }
}

/// Partial set of visual attributes
///
/// `None` means "not set by this format". Formats compose with [`CellFormat::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellFormat {
    pub bold: Option<bool>,
    pub font_color: Option<Color>,
    pub align: Option<HorizontalAlign>,
    pub valign: Option<VerticalAlign>,
    pub fill_color: Option<Color>,
}

impl CellFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn font_color(mut self, color: Color) -> Self {
        self.font_color = Some(color);
        self
    }

    pub fn align(mut self, align: HorizontalAlign) -> Self {
        self.align = Some(align);
        self
    }

    pub fn valign(mut self, valign: VerticalAlign) -> Self {
        self.valign = Some(valign);
        self
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill_color = Some(color);
        self
    }

    /// Overlay every attribute `other` sets on top of `self`
    pub fn merge(&self, other: &CellFormat) -> CellFormat {
        CellFormat {
            bold: other.bold.or(self.bold),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
            align: other.align.or(self.align),
            valign: other.valign.or(self.valign),
            fill_color: other.fill_color.clone().or_else(|| self.fill_color.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CellFormat::default()
    }

    pub(crate) fn has_font(&self) -> bool {
        self.bold.is_some() || self.font_color.is_some()
    }

    pub(crate) fn has_alignment(&self) -> bool {
        self.align.is_some() || self.valign.is_some()
    }
}

/// Inclusive, zero-based rectangle of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u32,
    pub last_row: u32,
    pub last_col: u32,
}

impl CellRange {
    pub fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Result<Self> {
        if first_row > last_row || first_col > last_col {
            return Err(ReportError::InvalidRange(format!(
                "({first_row}, {first_col})..({last_row}, {last_col})"
            )));
        }
        Ok(CellRange {
            first_row,
            first_col,
            last_row,
            last_col,
        })
    }

    /// Parse "A1:E1" or a single reference like "E2"
    pub fn parse(a1: &str) -> Result<Self> {
        let (start, end) = match a1.split_once(':') {
            Some((s, e)) => (Cell::parse(s.trim())?, Cell::parse(e.trim())?),
            None => {
                let cell = Cell::parse(a1.trim())?;
                (cell, cell)
            }
        };
        CellRange::new(start.row, start.col, end.row, end.col)
            .map_err(|_| ReportError::InvalidRange(a1.to_string()))
    }

    /// Cells of the range that fall inside a `rows` x `cols` sheet, row-major
    pub fn cells_within(&self, rows: u32, cols: u32) -> impl Iterator<Item = Cell> {
        let row_end = rows.min(self.last_row.saturating_add(1));
        let col_end = cols.min(self.last_col.saturating_add(1));
        let first_col = self.first_col;
        (self.first_row..row_end)
            .flat_map(move |r| (first_col..col_end).map(move |c| Cell::new(r, c)))
    }
}

impl FromStr for CellRange {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        CellRange::parse(s)
    }
}

/// Declarative format assignment over a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub range: CellRange,
    pub format: CellFormat,
}

impl StyleRule {
    pub fn new(range: CellRange, format: CellFormat) -> Self {
        StyleRule { range, format }
    }

    /// Build a rule from an A1-notation range
    pub fn parse(range: &str, format: CellFormat) -> Result<Self> {
        Ok(StyleRule::new(CellRange::parse(range)?, format))
    }
}
