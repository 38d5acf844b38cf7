//! Embedded student score sample

use crate::error::Result;
use crate::style::{CellFormat, Color, HorizontalAlign, StyleRule, VerticalAlign};
use crate::types::{CellValue, Report};

pub const SAMPLE_SHEET_NAME: &str = "学生成绩表";
pub const SAMPLE_OUTPUT: &str = "学生成绩.xlsx";

const HEADER: [&str; 5] = ["姓名", "年龄", "语文成绩", "数学成绩", "总分"];

const STUDENTS: [(&str, i64, i64, i64, i64); 4] = [
    ("张三", 18, 90, 85, 175),
    ("李四", 17, 88, 92, 180),
    ("王五", 19, 95, 89, 184),
    ("赵六", 18, 82, 78, 160),
];

/// Four students with their ages, two scores and the total
pub fn sample_report() -> Result<Report> {
    let mut report = Report::new(HEADER);
    for (name, age, chinese, math, total) in STUDENTS {
        report.push_row([
            CellValue::from(name),
            CellValue::Int(age),
            CellValue::Int(chinese),
            CellValue::Int(math),
            CellValue::Int(total),
        ])?;
    }
    Ok(report)
}

/// Blue bold centered header, light gray total column
pub fn sample_rules() -> Result<Vec<StyleRule>> {
    let header = CellFormat::new()
        .bold(true)
        .font_color(Color::parse("0000FF")?)
        .align(HorizontalAlign::Center)
        .valign(VerticalAlign::Middle);
    let totals = CellFormat::new().fill(Color::parse("F0F0F0")?);

    Ok(vec![
        StyleRule::parse("A1:E1", header)?,
        StyleRule::parse("E2:E5", totals)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shape() {
        let report = sample_report().unwrap();
        assert_eq!(report.column_count(), 5);
        assert_eq!(report.row_count(), 4);
        assert_eq!(report.rows()[2][0], CellValue::from("王五"));
    }

    #[test]
    fn test_totals_add_up() {
        for row in sample_report().unwrap().rows() {
            let sum = row[2].as_i64().unwrap() + row[3].as_i64().unwrap();
            assert_eq!(Some(sum), row[4].as_i64());
        }
    }

    #[test]
    fn test_sample_rules() {
        let rules = sample_rules().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].format.bold, Some(true));
        assert!(rules[1].format.fill_color.is_some());
    }
}
