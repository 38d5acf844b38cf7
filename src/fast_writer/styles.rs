//! Style table: interns cell formats into `cellXfs` entries

use std::io::{self, Write};

use indexmap::IndexSet;

use super::xml_writer::XmlWriter;
use crate::style::{CellFormat, Color};

/// Two built-in fills every workbook carries (none, gray125)
const BUILTIN_FILLS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    bold: bool,
    color: Option<Color>,
}

/// Deduplicated fonts, fills and cell formats for `xl/styles.xml`
///
/// Format index 0 is always the default format.
#[derive(Debug)]
pub struct StyleTable {
    formats: IndexSet<CellFormat>,
    fonts: IndexSet<FontKey>,
    fills: IndexSet<Color>,
}

impl StyleTable {
    pub fn new() -> Self {
        let mut formats = IndexSet::new();
        formats.insert(CellFormat::default());
        let mut fonts = IndexSet::new();
        fonts.insert(FontKey {
            bold: false,
            color: None,
        });

        StyleTable {
            formats,
            fonts,
            fills: IndexSet::new(),
        }
    }

    /// Get the `s` attribute value for a format, registering it if new
    pub fn intern(&mut self, format: &CellFormat) -> u32 {
        if let Some(index) = self.formats.get_index_of(format) {
            return index as u32;
        }

        self.fonts.insert(Self::font_key(format));
        if let Some(color) = &format.fill_color {
            self.fills.insert(color.clone());
        }
        self.formats.insert_full(format.clone()).0 as u32
    }

    /// Number of cell formats, default included
    pub fn count(&self) -> usize {
        self.formats.len()
    }

    fn font_key(format: &CellFormat) -> FontKey {
        FontKey {
            bold: format.bold.unwrap_or(false),
            color: format.font_color.clone(),
        }
    }

    fn font_id(&self, format: &CellFormat) -> u64 {
        self.fonts
            .get_index_of(&Self::font_key(format))
            .unwrap_or(0) as u64
    }

    fn fill_id(&self, format: &CellFormat) -> u64 {
        format
            .fill_color
            .as_ref()
            .and_then(|c| self.fills.get_index_of(c))
            .map_or(0, |i| (i as u32 + BUILTIN_FILLS) as u64)
    }

    /// Write `xl/styles.xml`
    pub fn write_xml<W: Write>(&self, xml: &mut XmlWriter<W>) -> io::Result<()> {
        xml.declaration()?;
        xml.start_element("styleSheet")?;
        xml.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml.close_start_tag()?;

        self.write_fonts(xml)?;
        self.write_fills(xml)?;

        xml.write_str(
            "<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>",
        )?;
        xml.write_str(
            "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
        )?;

        self.write_cell_xfs(xml)?;

        xml.write_str(
            "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
        )?;
        xml.end_element("styleSheet")?;
        xml.flush()
    }

    fn write_fonts<W: Write>(&self, xml: &mut XmlWriter<W>) -> io::Result<()> {
        xml.start_element("fonts")?;
        xml.attribute_int("count", self.fonts.len() as u64)?;
        xml.close_start_tag()?;
        for font in &self.fonts {
            xml.write_str("<font>")?;
            if font.bold {
                xml.write_str("<b/>")?;
            }
            xml.write_str("<sz val=\"11\"/>")?;
            if let Some(color) = &font.color {
                xml.start_element("color")?;
                xml.attribute("rgb", &color.argb())?;
                xml.close_empty()?;
            }
            xml.write_str("<name val=\"Calibri\"/><family val=\"2\"/></font>")?;
        }
        xml.end_element("fonts")
    }

    fn write_fills<W: Write>(&self, xml: &mut XmlWriter<W>) -> io::Result<()> {
        xml.start_element("fills")?;
        xml.attribute_int("count", self.fills.len() as u64 + BUILTIN_FILLS as u64)?;
        xml.close_start_tag()?;
        xml.write_str("<fill><patternFill patternType=\"none\"/></fill>")?;
        xml.write_str("<fill><patternFill patternType=\"gray125\"/></fill>")?;
        for color in &self.fills {
            xml.write_str("<fill><patternFill patternType=\"solid\">")?;
            xml.start_element("fgColor")?;
            xml.attribute("rgb", &color.argb())?;
            xml.close_empty()?;
            xml.write_str("<bgColor indexed=\"64\"/></patternFill></fill>")?;
        }
        xml.end_element("fills")
    }

    fn write_cell_xfs<W: Write>(&self, xml: &mut XmlWriter<W>) -> io::Result<()> {
        xml.start_element("cellXfs")?;
        xml.attribute_int("count", self.formats.len() as u64)?;
        xml.close_start_tag()?;

        for format in &self.formats {
            xml.start_element("xf")?;
            xml.attribute("numFmtId", "0")?;
            xml.attribute_int("fontId", self.font_id(format))?;
            xml.attribute_int("fillId", self.fill_id(format))?;
            xml.attribute("borderId", "0")?;
            xml.attribute("xfId", "0")?;
            if format.has_font() {
                xml.attribute("applyFont", "1")?;
            }
            if format.fill_color.is_some() {
                xml.attribute("applyFill", "1")?;
            }

            if !format.has_alignment() {
                xml.close_empty()?;
                continue;
            }

            xml.attribute("applyAlignment", "1")?;
            xml.close_start_tag()?;
            xml.start_element("alignment")?;
            if let Some(align) = format.align {
                xml.attribute("horizontal", align.as_xml())?;
            }
            if let Some(valign) = format.valign {
                xml.attribute("vertical", valign.as_xml())?;
            }
            xml.close_empty()?;
            xml.end_element("xf")?;
        }

        xml.end_element("cellXfs")
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}
