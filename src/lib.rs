//! # sheetreport
//!
//! Export an in-memory table (header plus rows) to a styled, width-adjusted XLSX file.
//!
//! ## Features
//!
//! - **Typed values**: text, integer and float cells through [`CellValue`]
//! - **Declarative styling**: bold, font color, alignment and fill over A1 ranges
//! - **Automatic widths**: every column sized from its longest value
//! - **Atomic save**: the destination is replaced only by a complete file
//! - **Read-back**: [`reader::WorkbookReader`] loads values, widths and formats again
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheetreport::{CellFormat, CellValue, Color, Report, ReportExporter, StyleRule};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = Report::new(["Name", "Age"])
//!     .with_row([CellValue::from("Zhang"), CellValue::from(18)])?
//!     .with_row([CellValue::from("Li"), CellValue::from(17)])?;
//!
//! let rules = vec![
//!     StyleRule::parse("A1:B1", CellFormat::new().bold(true))?,
//!     StyleRule::parse("B2:B3", CellFormat::new().fill(Color::parse("F0F0F0")?))?,
//! ];
//!
//! let summary = ReportExporter::new().export(&report, &rules, "people.xlsx")?;
//! println!("{} rows written", summary.rows);
//! # Ok(())
//! # }
//! ```
//!
//! The crate also carries a signed search request ([`search`]) and a
//! write-then-read file helper ([`scratch`]).

pub mod cli;
pub mod error;
pub mod exporter;
pub mod fast_writer;
pub mod reader;
pub mod sample;
pub mod scratch;
pub mod search;
pub mod style;
pub mod types;

pub use error::{ReportError, Result};
pub use exporter::{ExportOptions, ExportSummary, ReportExporter};
pub use reader::{SheetContents, WorkbookReader};
pub use style::{CellFormat, CellRange, Color, HorizontalAlign, StyleRule, VerticalAlign};
pub use types::{Cell, CellValue, Report};
