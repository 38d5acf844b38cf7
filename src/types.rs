//! Type definitions for report data

use std::fmt;

use crate::error::{ReportError, Result};

/// Represents a single cell value in a report
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
}

impl CellValue {
    /// Convert cell value to its display string
    ///
    /// Integral finite floats keep a trailing `.0` so `90.0` and `90` stay
    /// distinguishable in the sheet and in width computation.
    pub fn as_string(&self) -> String {
        match self {
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => float_to_string(*f),
        }
    }

    /// Number of characters in the display string
    pub fn char_len(&self) -> usize {
        match self {
            CellValue::String(s) => s.chars().count(),
            CellValue::Int(i) => itoa::Buffer::new().format(*i).len(),
            CellValue::Float(f) => float_to_string(*f).len(),
        }
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            CellValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::String(s) => s.parse().ok(),
        }
    }

    /// Borrow the text of a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Shortest round-trip text; scientific form when the decimal exponent is
/// below -4 or at least 16, with a signed two-digit exponent
fn float_to_string(f: f64) -> String {
    if !f.is_finite() {
        return f.to_string();
    }

    let sci = format!("{:e}", f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }

    let fixed = f.to_string();
    if fixed.contains('.') {
        fixed
    } else {
        fixed + ".0"
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i as i64)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

/// Zero-based cell position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    /// Row index (0-based, row 0 is the header)
    pub row: u32,
    /// Column index (0-based)
    pub col: u32,
}

impl Cell {
    /// Create a new cell position
    pub fn new(row: u32, col: u32) -> Self {
        Cell { row, col }
    }

    /// Get Excel-style cell reference (e.g., "A1", "B2")
    pub fn reference(&self) -> String {
        format!("{}{}", col_to_letter(self.col), self.row + 1)
    }

    /// Parse an Excel-style reference such as "C7" or "aa10"
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = || ReportError::InvalidRange(reference.to_string());

        let split = reference
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = reference.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }

        let mut col: u32 = 0;
        for ch in letters.chars() {
            let digit = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            col = col
                .checked_mul(26)
                .and_then(|c| c.checked_add(digit))
                .ok_or_else(invalid)?;
        }

        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Cell::new(row - 1, col - 1))
    }
}

/// Convert column index to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut col = col + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}

/// In-memory table: ordered header plus ordered rows aligned to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Report {
    /// Create an empty report with the given header
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Report {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a whole data row
    ///
    /// Rejects rows whose length differs from the header length.
    pub fn push_row<I, V>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let row: Vec<CellValue> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(ReportError::RowLength {
                row: self.rows.len() + 1,
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder-style variant of [`Report::push_row`]
    pub fn with_row<I, V>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        self.push_row(row)?;
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows (header excluded)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate over every value of one column, header first
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = CellValue> + '_ {
        self.columns
            .get(col)
            .map(|h| CellValue::String(h.clone()))
            .into_iter()
            .chain(self.rows.iter().filter_map(move |r| r.get(col).cloned()))
    }
}
