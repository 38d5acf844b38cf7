//! Workbook read-back
//!
//! Loads the parts this crate writes (shared strings, styles, column widths,
//! typed cells) so an export can be checked against its input.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::attributes::Attributes;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::error::{IoResultExt, ReportError, Result};
use crate::style::{CellFormat, Color, HorizontalAlign, VerticalAlign};
use crate::types::{Cell, CellValue};

/// Everything read from one worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetContents {
    pub name: String,
    /// Row-major cell values; `None` where the sheet has no cell
    pub rows: Vec<Vec<Option<CellValue>>>,
    /// Zero-based column index to declared width
    pub column_widths: BTreeMap<u32, f64>,
    /// Formats of styled cells, resolved from `styles.xml`
    pub formats: HashMap<Cell, CellFormat>,
}

impl SheetContents {
    /// (row count, column count)
    pub fn dimensions(&self) -> (usize, usize) {
        let cols = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        (self.rows.len(), cols)
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row)?.get(col)?.as_ref()
    }

    pub fn format(&self, row: u32, col: u32) -> Option<&CellFormat> {
        self.formats.get(&Cell::new(row, col))
    }
}

/// Reader over an XLSX package
pub struct WorkbookReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    shared_strings: Vec<String>,
    cell_formats: Vec<CellFormat>,
    sheets: Vec<(String, String)>,
}

impl WorkbookReader<BufReader<File>> {
    /// Open an XLSX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_path(path)?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> WorkbookReader<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        let shared_strings = match read_part(&mut archive, "xl/sharedStrings.xml")? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };
        let cell_formats = match read_part(&mut archive, "xl/styles.xml")? {
            Some(xml) => parse_styles(&xml)?,
            None => vec![CellFormat::default()],
        };
        let sheets = read_sheet_paths(&mut archive)?;
        debug!(
            strings = shared_strings.len(),
            formats = cell_formats.len(),
            sheets = sheets.len(),
            "workbook opened"
        );

        Ok(WorkbookReader {
            archive,
            shared_strings,
            cell_formats,
            sheets,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Read a worksheet by name
    pub fn read_sheet(&mut self, name: &str) -> Result<SheetContents> {
        let part = self
            .sheets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| {
                ReportError::Read(format!(
                    "sheet '{}' not found, available: {}",
                    name,
                    self.sheet_names().join(", ")
                ))
            })?;

        let xml = read_part(&mut self.archive, &part)?
            .ok_or_else(|| ReportError::Read(format!("missing part {part}")))?;
        let mut contents = parse_worksheet(&xml, &self.shared_strings, &self.cell_formats)?;
        contents.name = name.to_string();
        Ok(contents)
    }

    /// Read the first worksheet
    pub fn read_first_sheet(&mut self) -> Result<SheetContents> {
        let name = self
            .sheets
            .first()
            .map(|(n, _)| n.clone())
            .ok_or_else(|| ReportError::Read("workbook has no sheets".to_string()))?;
        self.read_sheet(&name)
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ReportError::Read(format!("{name}: {e}")))?;
    Ok(Some(xml))
}

fn attr_value(attrs: Attributes<'_>, key: &[u8]) -> Option<String> {
    attrs
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    attr_value(e.attributes(), key)
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    attr(e, key).and_then(|v| v.parse().ok())
}

/// Sheet names paired with their part paths, in workbook order
fn read_sheet_paths<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<(String, String)>> {
    let workbook = read_part(archive, "xl/workbook.xml")?
        .ok_or_else(|| ReportError::Read("missing xl/workbook.xml".to_string()))?;
    let rels = read_part(archive, "xl/_rels/workbook.xml.rels")?
        .ok_or_else(|| ReportError::Read("missing xl/_rels/workbook.xml.rels".to_string()))?;

    let mut targets = HashMap::new();
    let mut reader = Reader::from_str(&rels);
    reader.trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    };
                    targets.insert(id, path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut sheets = Vec::new();
    let mut reader = Reader::from_str(&workbook);
    reader.trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"sheet" => {
                if let (Some(name), Some(rid)) = (attr(&e, b"name"), attr(&e, b"r:id")) {
                    if let Some(path) = targets.get(&rid) {
                        sheets.push((name, path.clone()));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(sheets)
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut current = String::new();
    let (mut in_si, mut in_t) = (false, false);

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"t" if in_si => in_t = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(t) if in_t => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

#[derive(Debug, Default, Clone)]
struct FontEntry {
    bold: bool,
    color: Option<Color>,
}

/// Resolve every `cellXfs` entry into a [`CellFormat`]
fn parse_styles(xml: &str) -> Result<Vec<CellFormat>> {
    let mut fonts: Vec<FontEntry> = Vec::new();
    let mut fills: Vec<Option<Color>> = Vec::new();
    let mut formats = Vec::new();

    #[derive(PartialEq)]
    enum Section {
        Other,
        Fonts,
        Fills,
        CellXfs,
    }
    let mut section = Section::Other;
    let mut solid = false;

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    loop {
        let event = reader.read_event()?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"fonts" if !is_empty => section = Section::Fonts,
                b"fills" if !is_empty => section = Section::Fills,
                b"cellXfs" if !is_empty => section = Section::CellXfs,
                b"font" if section == Section::Fonts => fonts.push(FontEntry::default()),
                b"b" if section == Section::Fonts => {
                    if let Some(font) = fonts.last_mut() {
                        font.bold = attr(&e, b"val").map_or(true, |v| v != "0" && v != "false");
                    }
                }
                b"color" if section == Section::Fonts => {
                    if let Some(font) = fonts.last_mut() {
                        font.color = attr(&e, b"rgb").and_then(|v| Color::parse(&v).ok());
                    }
                }
                b"fill" if section == Section::Fills => fills.push(None),
                b"patternFill" if section == Section::Fills => {
                    solid = attr(&e, b"patternType").as_deref() == Some("solid");
                }
                b"fgColor" if section == Section::Fills && solid => {
                    if let Some(fill) = fills.last_mut() {
                        *fill = attr(&e, b"rgb").and_then(|v| Color::parse(&v).ok());
                    }
                }
                b"xf" if section == Section::CellXfs => {
                    let font = attr_u32(&e, b"fontId")
                        .and_then(|i| fonts.get(i as usize))
                        .cloned()
                        .unwrap_or_default();
                    let fill = attr_u32(&e, b"fillId")
                        .and_then(|i| fills.get(i as usize))
                        .cloned()
                        .flatten();
                    formats.push(CellFormat {
                        bold: font.bold.then_some(true),
                        font_color: font.color,
                        align: None,
                        valign: None,
                        fill_color: fill,
                    });
                }
                b"alignment" if section == Section::CellXfs => {
                    if let Some(format) = formats.last_mut() {
                        format.align =
                            attr(&e, b"horizontal").and_then(|v| HorizontalAlign::from_xml(&v));
                        format.valign =
                            attr(&e, b"vertical").and_then(|v| VerticalAlign::from_xml(&v));
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"fonts" | b"fills" | b"cellXfs" => section = Section::Other,
                b"patternFill" => solid = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if formats.is_empty() {
        formats.push(CellFormat::default());
    }
    Ok(formats)
}

#[derive(Default)]
struct PendingCell {
    cell: Option<Cell>,
    kind: Option<String>,
    style: u32,
    text: String,
}

fn parse_worksheet(
    xml: &str,
    shared_strings: &[String],
    cell_formats: &[CellFormat],
) -> Result<SheetContents> {
    let mut contents = SheetContents::default();
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;
    let mut current_row: u32 = 0;

    let mut reader = Reader::from_str(xml);
    loop {
        let event = reader.read_event()?;
        let is_empty = matches!(event, Event::Empty(_));
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"col" => {
                    let min = attr_u32(&e, b"min").unwrap_or(1);
                    let max = attr_u32(&e, b"max").unwrap_or(min);
                    if let Some(width) = attr(&e, b"width").and_then(|v| v.parse::<f64>().ok()) {
                        for col in min..=max {
                            contents.column_widths.insert(col.saturating_sub(1), width);
                        }
                    }
                }
                b"row" => {
                    current_row = attr_u32(&e, b"r")
                        .map(|r| r.saturating_sub(1))
                        .unwrap_or(contents.rows.len() as u32);
                }
                b"c" => {
                    let cell = attr(&e, b"r")
                        .and_then(|r| Cell::parse(&r).ok())
                        .or(Some(Cell::new(current_row, 0)));
                    let new_cell = PendingCell {
                        cell,
                        kind: attr(&e, b"t"),
                        style: attr_u32(&e, b"s").unwrap_or(0),
                        text: String::new(),
                    };
                    if is_empty {
                        finish_cell(&mut contents, new_cell, shared_strings, cell_formats)?;
                    } else {
                        pending = Some(new_cell);
                    }
                }
                b"v" | b"t" if pending.is_some() && !is_empty => in_value = true,
                _ => {}
            },
            Event::Text(t) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        finish_cell(&mut contents, cell, shared_strings, cell_formats)?;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(contents)
}

fn finish_cell(
    contents: &mut SheetContents,
    pending: PendingCell,
    shared_strings: &[String],
    cell_formats: &[CellFormat],
) -> Result<()> {
    let Some(cell) = pending.cell else {
        return Ok(());
    };

    let value = match pending.kind.as_deref() {
        _ if pending.text.is_empty() && pending.kind.as_deref() != Some("inlineStr") => None,
        Some("s") => {
            let index: usize = pending
                .text
                .trim()
                .parse()
                .map_err(|_| ReportError::Read(format!("bad shared string index in {}", cell.reference())))?;
            let text = shared_strings.get(index).ok_or_else(|| {
                ReportError::Read(format!(
                    "shared string {index} out of range in {}",
                    cell.reference()
                ))
            })?;
            Some(CellValue::String(text.clone()))
        }
        Some("str") | Some("inlineStr") => Some(CellValue::String(pending.text)),
        Some("b") => Some(CellValue::Int(i64::from(pending.text.trim() == "1"))),
        _ => Some(parse_number(pending.text.trim())),
    };

    let (row, col) = (cell.row as usize, cell.col as usize);
    if contents.rows.len() <= row {
        contents.rows.resize_with(row + 1, Vec::new);
    }
    let cells = &mut contents.rows[row];
    if cells.len() <= col {
        cells.resize(col + 1, None);
    }
    cells[col] = value;

    if pending.style > 0 {
        if let Some(format) = cell_formats.get(pending.style as usize) {
            if !format.is_empty() {
                contents.formats.insert(cell, format.clone());
            }
        }
    }
    Ok(())
}

fn parse_number(text: &str) -> CellValue {
    if let Ok(i) = text.parse::<i64>() {
        return CellValue::Int(i);
    }
    match text.parse::<f64>() {
        Ok(f) => CellValue::Float(f),
        Err(_) => CellValue::String(text.to_string()),
    }
}
