//! Export then read back through the workbook reader

use pretty_assertions::assert_eq;
use sheetreport::exporter::column_widths;
use sheetreport::sample::{sample_report, sample_rules, SAMPLE_SHEET_NAME};
use sheetreport::{
    CellFormat, CellValue, Color, ExportOptions, HorizontalAlign, Report, ReportError,
    ReportExporter, StyleRule, VerticalAlign, WorkbookReader,
};
use tempfile::TempDir;

fn people() -> Report {
    Report::new(["Name", "Age"])
        .with_row([CellValue::from("Zhang"), CellValue::from(18)])
        .unwrap()
        .with_row([CellValue::from("Li"), CellValue::from(17)])
        .unwrap()
}

#[test]
fn test_export_and_read_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.xlsx");

    let rules = vec![StyleRule::parse("A1:B1", CellFormat::new().bold(true)).unwrap()];
    let summary = ReportExporter::new()
        .export(&people(), &rules, &path)
        .unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.columns, 2);

    let mut reader = WorkbookReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec!["Sheet1".to_string()]);
    let sheet = reader.read_sheet("Sheet1").unwrap();

    assert_eq!(sheet.dimensions(), (3, 2));
    assert_eq!(
        sheet.rows,
        vec![
            vec![Some(CellValue::from("Name")), Some(CellValue::from("Age"))],
            vec![Some(CellValue::from("Zhang")), Some(CellValue::Int(18))],
            vec![Some(CellValue::from("Li")), Some(CellValue::Int(17))],
        ]
    );
    assert_eq!(sheet.format(0, 0).and_then(|f| f.bold), Some(true));
    assert_eq!(sheet.format(0, 1).and_then(|f| f.bold), Some(true));
    assert_eq!(sheet.format(1, 0), None);
    assert_eq!(sheet.column_widths.get(&0), Some(&((5 + 2) as f64 * 1.2)));
}

#[test]
fn test_widths_match_longest_value() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("widths.xlsx");

    let report = Report::new(["id", "description", "score"])
        .with_row([
            CellValue::Int(1234567),
            CellValue::from("short"),
            CellValue::Float(3.25),
        ])
        .unwrap()
        .with_row([
            CellValue::Int(2),
            CellValue::from("a considerably longer text"),
            CellValue::Float(-10.125),
        ])
        .unwrap();

    let options = ExportOptions::default();
    ReportExporter::with_options(options.clone())
        .export(&report, &[], &path)
        .unwrap();

    let sheet = WorkbookReader::open(&path)
        .unwrap()
        .read_first_sheet()
        .unwrap();
    let expected = column_widths(&report, &options);
    assert_eq!(expected, vec![9.0 * 1.2, 28.0 * 1.2, 9.0 * 1.2]);
    for (col, width) in expected.iter().enumerate() {
        assert_eq!(sheet.column_widths.get(&(col as u32)), Some(width));
    }
}

#[test]
fn test_cell_values_preserved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("values.xlsx");

    let report = Report::new(["text", "int", "float"])
        .with_row([
            CellValue::from("  padded  "),
            CellValue::Int(-42),
            CellValue::Float(1234.56),
        ])
        .unwrap()
        .with_row([
            CellValue::from("<tag> & \"quotes\""),
            CellValue::Int(i64::MAX),
            CellValue::Float(0.1),
        ])
        .unwrap()
        .with_row([
            CellValue::from("90"),
            CellValue::Int(90),
            CellValue::Float(90.0),
        ])
        .unwrap()
        .with_row([
            CellValue::from(""),
            CellValue::Int(0),
            CellValue::Float(1e-5),
        ])
        .unwrap();

    ReportExporter::new().export(&report, &[], &path).unwrap();
    let sheet = WorkbookReader::open(&path)
        .unwrap()
        .read_first_sheet()
        .unwrap();

    for (i, row) in report.rows().iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            assert_eq!(sheet.value(i + 1, j), Some(value), "cell ({}, {})", i + 1, j);
        }
    }
}

#[test]
fn test_overlapping_rules_later_wins() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("overlap.xlsx");

    let blue = Color::parse("0000FF").unwrap();
    let red = Color::parse("FF0000").unwrap();
    let gray = Color::parse("F0F0F0").unwrap();
    let rules = vec![
        StyleRule::parse(
            "A1:B3",
            CellFormat::new()
                .bold(true)
                .font_color(blue.clone())
                .align(HorizontalAlign::Left),
        )
        .unwrap(),
        StyleRule::parse(
            "B2:B3",
            CellFormat::new()
                .font_color(red.clone())
                .fill(gray.clone())
                .valign(VerticalAlign::Top),
        )
        .unwrap(),
    ];
    ReportExporter::new()
        .export(&people(), &rules, &path)
        .unwrap();

    let sheet = WorkbookReader::open(&path)
        .unwrap()
        .read_first_sheet()
        .unwrap();

    let first_only = sheet.format(1, 0).unwrap();
    assert_eq!(first_only.font_color, Some(blue));
    assert_eq!(first_only.fill_color, None);

    let both = sheet.format(2, 1).unwrap();
    assert_eq!(both.bold, Some(true));
    assert_eq!(both.font_color, Some(red));
    assert_eq!(both.fill_color, Some(gray));
    assert_eq!(both.align, Some(HorizontalAlign::Left));
    assert_eq!(both.valign, Some(VerticalAlign::Top));
}

#[test]
fn test_rule_outside_sheet_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("outside.xlsx");

    let rules = vec![StyleRule::parse("D10:F12", CellFormat::new().bold(true)).unwrap()];
    ReportExporter::new()
        .export(&people(), &rules, &path)
        .unwrap();

    let sheet = WorkbookReader::open(&path)
        .unwrap()
        .read_first_sheet()
        .unwrap();
    assert_eq!(sheet.dimensions(), (3, 2));
    assert!(sheet.formats.is_empty());
}

#[test]
fn test_header_only_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.xlsx");

    ReportExporter::new()
        .export(&Report::new(["Total"]), &[], &path)
        .unwrap();

    let sheet = WorkbookReader::open(&path)
        .unwrap()
        .read_first_sheet()
        .unwrap();
    assert_eq!(sheet.rows, vec![vec![Some(CellValue::from("Total"))]]);
    assert_eq!(sheet.column_widths.get(&0), Some(&(7.0 * 1.2)));
}

#[test]
fn test_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_such_dir").join("out.xlsx");

    let err = ReportExporter::new()
        .export(&people(), &[], &path)
        .unwrap_err();
    match err {
        ReportError::Io { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
    assert!(!path.exists());
}

#[test]
fn test_directory_destination_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taken");
    std::fs::create_dir(&path).unwrap();

    let err = ReportExporter::new()
        .export(&people(), &[], &path)
        .unwrap_err();
    assert!(matches!(err, ReportError::Io { .. }));
    assert!(path.is_dir());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .filter(|name| name != "taken")
        .collect();
    assert!(leftovers.is_empty(), "temporary files left: {leftovers:?}");
}

#[test]
fn test_existing_file_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.xlsx");
    std::fs::write(&path, b"not a workbook").unwrap();

    ReportExporter::new()
        .export(&people(), &[], &path)
        .unwrap();

    let sheet = WorkbookReader::open(&path)
        .unwrap()
        .read_first_sheet()
        .unwrap();
    assert_eq!(sheet.dimensions(), (3, 2));
}

#[test]
fn test_row_length_mismatch_rejected() {
    let err = Report::new(["a", "b"])
        .with_row([CellValue::from("only one")])
        .unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_sample_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("学生成绩.xlsx");

    let report = sample_report().unwrap();
    let exporter =
        ReportExporter::with_options(ExportOptions::default().with_sheet_name(SAMPLE_SHEET_NAME));
    exporter
        .export(&report, &sample_rules().unwrap(), &path)
        .unwrap();

    let mut reader = WorkbookReader::open(&path).unwrap();
    assert_eq!(reader.sheet_names(), vec![SAMPLE_SHEET_NAME.to_string()]);
    let sheet = reader.read_sheet(SAMPLE_SHEET_NAME).unwrap();
    assert_eq!(sheet.dimensions(), (5, 5));
    assert_eq!(sheet.value(0, 2), Some(&CellValue::from("语文成绩")));
    assert_eq!(sheet.value(3, 4), Some(&CellValue::Int(184)));

    let header = sheet.format(0, 4).unwrap();
    assert_eq!(header.bold, Some(true));
    assert_eq!(header.font_color.as_ref().map(Color::hex), Some("0000FF"));
    assert_eq!(header.align, Some(HorizontalAlign::Center));
    assert_eq!(header.valign, Some(VerticalAlign::Middle));
    assert_eq!(header.fill_color, None);

    let total = sheet.format(4, 4).unwrap();
    assert_eq!(total.fill_color.as_ref().map(Color::hex), Some("F0F0F0"));
    assert_eq!(total.bold, None);
    assert_eq!(sheet.format(1, 0), None);

    // "语文成绩" is four characters
    assert_eq!(sheet.column_widths.get(&2), Some(&(6.0 * 1.2)));
}
