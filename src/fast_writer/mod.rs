//! Spreadsheet writer capability
//!
//! This module turns an in-memory sheet into an XLSX package:
//! - Direct XML generation through a small buffered writer
//! - Deduplicated shared strings and cell formats
//! - Deflate-compressed ZIP container
//! - Atomic replacement of the destination file

pub mod shared_strings;
pub mod styles;
pub mod workbook;
pub mod worksheet;
pub mod xml_writer;

pub use shared_strings::SharedStrings;
pub use styles::StyleTable;
pub use workbook::Workbook;
pub use worksheet::{validate_sheet_name, Worksheet};
pub use xml_writer::XmlWriter;
