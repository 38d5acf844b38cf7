//! In-memory worksheet: rows, per-cell formats and column widths

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

use super::shared_strings::SharedStrings;
use super::styles::StyleTable;
use super::xml_writer::XmlWriter;
use crate::error::{ReportError, Result};
use crate::style::CellFormat;
use crate::types::{col_to_letter, Cell, CellValue};

/// Excel sheet name maximum length
pub const SHEET_NAME_MAX_LEN: usize = 31;
/// Characters not allowed in sheet names
pub const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Check a sheet name against the workbook format's rules
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 || len > SHEET_NAME_MAX_LEN {
        return Err(ReportError::InvalidSheetName(format!(
            "'{name}' must be 1..={SHEET_NAME_MAX_LEN} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| SHEET_NAME_ILLEGAL.contains(c)) {
        return Err(ReportError::InvalidSheetName(format!(
            "'{name}' contains '{c}'"
        )));
    }
    Ok(())
}

/// Worksheet held in memory until the workbook is saved
///
/// Formats are applied after rows are written, so the sheet cannot be
/// streamed row by row.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
    formats: HashMap<Cell, CellFormat>,
    widths: BTreeMap<u32, f64>,
    max_col: u32,
}

impl Worksheet {
    pub(crate) fn new(name: &str) -> Self {
        Worksheet {
            name: name.to_string(),
            rows: Vec::new(),
            formats: HashMap::new(),
            widths: BTreeMap::new(),
            max_col: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a whole row after the last one
    pub fn append_row(&mut self, values: &[CellValue]) {
        self.max_col = self.max_col.max(values.len() as u32);
        self.rows.push(values.to_vec());
    }

    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn col_count(&self) -> u32 {
        self.max_col
    }

    /// Merge `format` into the cell's current format
    pub fn apply_format(&mut self, cell: Cell, format: &CellFormat) {
        let entry = self.formats.entry(cell).or_default();
        *entry = entry.merge(format);
    }

    pub fn format(&self, cell: Cell) -> Option<&CellFormat> {
        self.formats.get(&cell)
    }

    /// Set the declared width of a zero-based column
    pub fn set_column_width(&mut self, col: u32, width: f64) {
        self.widths.insert(col, width);
    }

    pub fn column_width(&self, col: u32) -> Option<f64> {
        self.widths.get(&col).copied()
    }

    /// Write `xl/worksheets/sheetN.xml`
    pub fn write_xml<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        strings: &mut SharedStrings,
        styles: &mut StyleTable,
    ) -> io::Result<()> {
        xml.declaration()?;
        xml.start_element("worksheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml.close_start_tag()?;

        xml.start_element("dimension")?;
        xml.attribute("ref", &self.dimension_ref())?;
        xml.close_empty()?;
        xml.write_str("<sheetFormatPr defaultRowHeight=\"15\"/>")?;

        self.write_cols(xml)?;

        xml.start_element("sheetData")?;
        xml.close_start_tag()?;
        for (row_idx, values) in self.rows.iter().enumerate() {
            self.write_row(xml, row_idx as u32, values, strings, styles)?;
        }
        xml.end_element("sheetData")?;

        xml.end_element("worksheet")?;
        xml.flush()
    }

    fn dimension_ref(&self) -> String {
        if self.rows.is_empty() || self.max_col == 0 {
            return "A1".to_string();
        }
        let last = Cell::new(self.row_count() - 1, self.max_col - 1);
        format!("A1:{}", last.reference())
    }

    fn write_cols<W: Write>(&self, xml: &mut XmlWriter<W>) -> io::Result<()> {
        if self.widths.is_empty() {
            return Ok(());
        }
        xml.start_element("cols")?;
        xml.close_start_tag()?;
        for (&col, &width) in &self.widths {
            xml.start_element("col")?;
            xml.attribute_int("min", col as u64 + 1)?;
            xml.attribute_int("max", col as u64 + 1)?;
            xml.attribute("width", &width.to_string())?;
            xml.attribute("customWidth", "1")?;
            xml.close_empty()?;
        }
        xml.end_element("cols")
    }

    fn write_row<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        row_idx: u32,
        values: &[CellValue],
        strings: &mut SharedStrings,
        styles: &mut StyleTable,
    ) -> io::Result<()> {
        let mut num = itoa::Buffer::new();
        let row_num = num.format(row_idx + 1).to_string();

        xml.start_element("row")?;
        xml.attribute("r", &row_num)?;
        xml.close_start_tag()?;

        for (col_idx, value) in values.iter().enumerate() {
            let cell = Cell::new(row_idx, col_idx as u32);

            xml.start_element("c")?;
            xml.write_raw(b" r=\"")?;
            xml.write_str(&col_to_letter(cell.col))?;
            xml.write_str(&row_num)?;
            xml.write_raw(b"\"")?;

            let style_id = self.formats.get(&cell).map_or(0, |f| styles.intern(f));
            if style_id > 0 {
                xml.attribute_int("s", style_id as u64)?;
            }

            match value {
                CellValue::Int(i) => {
                    xml.write_raw(b"><v>")?;
                    xml.write_str(num.format(*i))?;
                }
                // same text as the width measurement, so 90.0 stays a float on read
                CellValue::Float(f) if f.is_finite() => {
                    xml.write_raw(b"><v>")?;
                    xml.write_str(&value.as_string())?;
                }
                // NaN and infinities have no numeric cell form; keep their text
                other => {
                    let index = strings.add_string(&other.as_string());
                    xml.write_raw(b" t=\"s\"><v>")?;
                    xml.write_str(num.format(index))?;
                }
            }
            xml.write_raw(b"</v></c>")?;
        }

        xml.end_element("row")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("学生成绩表").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("a/b").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_apply_format_merges() {
        let mut ws = Worksheet::new("Sheet1");
        ws.append_row(&[CellValue::from("x")]);
        let cell = Cell::new(0, 0);

        ws.apply_format(cell, &CellFormat::new().bold(true));
        ws.apply_format(cell, &CellFormat::new().fill(Color::parse("F0F0F0").unwrap()));

        let format = ws.format(cell).unwrap();
        assert_eq!(format.bold, Some(true));
        assert!(format.fill_color.is_some());
    }

    #[test]
    fn test_worksheet_xml() {
        let mut ws = Worksheet::new("Sheet1");
        ws.append_row(&[CellValue::from("Name"), CellValue::from("Age")]);
        ws.append_row(&[CellValue::from("Zhang"), CellValue::Int(18)]);
        ws.append_row(&[CellValue::from("Li"), CellValue::Float(17.5)]);
        ws.append_row(&[CellValue::from("Wang"), CellValue::Float(90.0)]);
        ws.apply_format(Cell::new(0, 0), &CellFormat::new().bold(true));
        ws.set_column_width(0, 8.4);

        let mut strings = SharedStrings::new();
        let mut styles = StyleTable::new();
        let mut output = Vec::new();
        ws.write_xml(&mut XmlWriter::new(&mut output), &mut strings, &mut styles)
            .unwrap();
        let xml = String::from_utf8(output).unwrap();

        assert!(xml.contains("<dimension ref=\"A1:B4\"/>"));
        assert!(xml.contains("<col min=\"1\" max=\"1\" width=\"8.4\" customWidth=\"1\"/>"));
        assert!(xml.contains("<c r=\"A1\" s=\"1\" t=\"s\"><v>0</v></c>"));
        assert!(xml.contains("<c r=\"B2\"><v>18</v></c>"));
        assert!(xml.contains("<c r=\"B3\"><v>17.5</v></c>"));
        assert!(xml.contains("<c r=\"B4\"><v>90.0</v></c>"));
        assert_eq!(strings.count(), 5);
        assert_eq!(styles.count(), 2);
    }
}
