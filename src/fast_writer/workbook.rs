//! Workbook packaging: writes the OOXML parts into a ZIP container

use std::fs;
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use tracing::debug;
use zip::result::ZipError;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use super::shared_strings::SharedStrings;
use super::styles::StyleTable;
use super::worksheet::{validate_sheet_name, Worksheet};
use super::xml_writer::XmlWriter;
use crate::error::{IoResultExt, ReportError, Result};

const APPLICATION: &str = "sheetreport";

/// Workbook built in memory and serialized in one pass
#[derive(Debug, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet and get a handle to fill it
    pub fn add_worksheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        validate_sheet_name(name)?;
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().eq_ignore_ascii_case(name))
        {
            return Err(ReportError::InvalidSheetName(format!(
                "'{name}' is already used in this workbook"
            )));
        }
        self.worksheets.push(Worksheet::new(name));
        let last = self.worksheets.len() - 1;
        Ok(&mut self.worksheets[last])
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.worksheets
    }

    /// Save to `path`, replacing any existing file
    ///
    /// The package is written to a temporary sibling, synced, then renamed
    /// over `path`. A replaced file keeps its permissions; a new file gets
    /// the process umask applied to `0o666`. On failure nothing is left at
    /// `path` and the temporary file is removed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let existing = fs::metadata(path)
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| meta.permissions());

        let mut builder = tempfile::Builder::new();
        builder.prefix(".sheetreport-").suffix(".tmp");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }
        let mut tmp = builder.tempfile_in(dir).with_path(path)?;
        debug!(tmp = %tmp.path().display(), "writing workbook package");

        {
            let writer = BufWriter::with_capacity(64 * 1024, tmp.as_file_mut());
            let writer = self.write_to(writer).with_path(path)?;
            writer
                .into_inner()
                .map_err(|e| ReportError::io(path, e.into_error()))?;
        }
        tmp.as_file().sync_all().with_path(path)?;
        if let Some(permissions) = existing {
            fs::set_permissions(tmp.path(), permissions).with_path(path)?;
        }

        tmp.persist(path)
            .map_err(|e| ReportError::io(path, e.error))?;

        // the rename is durable only once the directory entry is synced
        #[cfg(unix)]
        fs::File::open(dir)
            .and_then(|d| d.sync_all())
            .with_path(dir)?;
        Ok(())
    }

    /// Write the complete package into `sink` and return it
    pub fn write_to<W: Write + Seek>(&self, sink: W) -> io::Result<W> {
        let mut zip = ZipWriter::new(sink);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(6));

        let mut strings = SharedStrings::new();
        let mut styles = StyleTable::new();

        zip.start_file("[Content_Types].xml", options).map_err(zip_to_io)?;
        self.write_content_types(&mut zip)?;

        zip.start_file("_rels/.rels", options).map_err(zip_to_io)?;
        Self::write_root_rels(&mut zip)?;

        zip.start_file("docProps/core.xml", options).map_err(zip_to_io)?;
        Self::write_core_props(&mut zip)?;

        zip.start_file("docProps/app.xml", options).map_err(zip_to_io)?;
        Self::write_app_props(&mut zip)?;

        zip.start_file("xl/workbook.xml", options).map_err(zip_to_io)?;
        self.write_workbook_xml(&mut zip)?;

        zip.start_file("xl/_rels/workbook.xml.rels", options).map_err(zip_to_io)?;
        self.write_workbook_rels(&mut zip)?;

        // Sheets first: they populate the string and style tables
        for (i, ws) in self.worksheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                .map_err(zip_to_io)?;
            ws.write_xml(&mut XmlWriter::new(&mut zip), &mut strings, &mut styles)?;
            debug!(
                sheet = ws.name(),
                rows = ws.row_count(),
                cols = ws.col_count(),
                "worksheet written"
            );
        }

        zip.start_file("xl/sharedStrings.xml", options).map_err(zip_to_io)?;
        strings.write_xml(&mut XmlWriter::new(&mut zip))?;

        zip.start_file("xl/styles.xml", options).map_err(zip_to_io)?;
        styles.write_xml(&mut XmlWriter::new(&mut zip))?;

        zip.finish().map_err(zip_to_io)
    }

    fn write_content_types<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
        );

        for i in 1..=self.worksheets.len() {
            xml.push_str(&format!(
                r#"
<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
        }

        xml.push_str("\n</Types>");
        writer.write_all(xml.as_bytes())
    }

    fn write_root_rels<W: Write>(writer: &mut W) -> io::Result<()> {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
        writer.write_all(xml.as_bytes())
    }

    fn write_core_props<W: Write>(writer: &mut W) -> io::Result<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>{app}</dc:creator>
<cp:lastModifiedBy>{app}</cp:lastModifiedBy>
<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>
<dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>
</cp:coreProperties>"#,
            app = APPLICATION,
            now = now
        );
        writer.write_all(xml.as_bytes())
    }

    fn write_app_props<W: Write>(writer: &mut W) -> io::Result<()> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>{}</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
<AppVersion>1.0</AppVersion>
</Properties>"#,
            APPLICATION
        );
        writer.write_all(xml.as_bytes())
    }

    fn write_workbook_xml<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut xml_writer = XmlWriter::new(writer);

        xml_writer.declaration()?;
        xml_writer.start_element("workbook")?;
        xml_writer.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
        )?;
        xml_writer.attribute(
            "xmlns:r",
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
        )?;
        xml_writer.close_start_tag()?;

        xml_writer.start_element("sheets")?;
        xml_writer.close_start_tag()?;

        for (i, ws) in self.worksheets.iter().enumerate() {
            let sheet_id = i as u64 + 1;
            xml_writer.start_element("sheet")?;
            xml_writer.attribute("name", ws.name())?;
            xml_writer.attribute_int("sheetId", sheet_id)?;
            xml_writer.attribute("r:id", &format!("rId{}", sheet_id))?;
            xml_writer.close_empty()?;
        }

        xml_writer.end_element("sheets")?;
        xml_writer.end_element("workbook")?;
        xml_writer.flush()
    }

    fn write_workbook_rels<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut xml_writer = XmlWriter::new(writer);
        let count = self.worksheets.len();

        xml_writer.declaration()?;
        xml_writer.start_element("Relationships")?;
        xml_writer.attribute(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        )?;
        xml_writer.close_start_tag()?;

        for rid in 1..=count {
            Self::relationship(
                &mut xml_writer,
                rid,
                "worksheet",
                &format!("worksheets/sheet{}.xml", rid),
            )?;
        }
        Self::relationship(&mut xml_writer, count + 1, "styles", "styles.xml")?;
        Self::relationship(
            &mut xml_writer,
            count + 2,
            "sharedStrings",
            "sharedStrings.xml",
        )?;

        xml_writer.end_element("Relationships")?;
        xml_writer.flush()
    }

    fn relationship<W: Write>(
        xml_writer: &mut XmlWriter<W>,
        rid: usize,
        kind: &str,
        target: &str,
    ) -> io::Result<()> {
        xml_writer.start_element("Relationship")?;
        xml_writer.attribute("Id", &format!("rId{}", rid))?;
        xml_writer.attribute(
            "Type",
            &format!(
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}",
                kind
            ),
        )?;
        xml_writer.attribute("Target", target)?;
        xml_writer.close_empty()
    }
}

fn zip_to_io(err: ZipError) -> io::Error {
    match err {
        ZipError::Io(e) => e,
        other => io::Error::other(other),
    }
}
