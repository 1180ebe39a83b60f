//! # Spreadsheet Writer Tests

use anyhow::Result;
use docsheet::types::{ResultTable, Row};
use docsheet_sheets::{write_csv, write_xlsx, SpreadsheetFormat};
use regex::Regex;
use std::io::{Cursor, Read};
use zip::ZipArchive;

fn sample_table() -> ResultTable {
    let mut table = ResultTable::new(vec!["filename".into(), "name".into(), "notes".into()]);
    table.push(Row::new(vec![
        ("filename".into(), "a.pdf".into()),
        ("name".into(), "Jane <Doe>".into()),
        ("notes".into(), "R&D, \"lead\"".into()),
    ]));
    table.push(Row::new(vec![
        ("filename".into(), "b.docx".into()),
        ("name".into(), "Not found".into()),
        ("notes".into(), "Not found".into()),
    ]));
    table
}

fn read_part(bytes: &[u8], name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut content = String::new();
    archive.by_name(name)?.read_to_string(&mut content)?;
    Ok(content)
}

#[test]
fn test_xlsx_contains_header_and_rows_in_order() -> Result<()> {
    let bytes = write_xlsx(&sample_table())?;
    let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml")?;

    let cell_re = Regex::new(r#"<c r="([A-Z]+\d+)" t="inlineStr"><is><t[^>]*>(.*?)</t>"#)?;
    let cells: Vec<(String, String)> = cell_re
        .captures_iter(&sheet)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect();

    assert_eq!(cells.len(), 9);
    assert_eq!(cells[0], ("A1".into(), "filename".into()));
    assert_eq!(cells[2], ("C1".into(), "notes".into()));
    assert_eq!(cells[3], ("A2".into(), "a.pdf".into()));
    assert_eq!(cells[4], ("B2".into(), "Jane &lt;Doe&gt;".into()));
    assert_eq!(cells[6], ("A3".into(), "b.docx".into()));

    let workbook = read_part(&bytes, "xl/workbook.xml")?;
    assert!(workbook.contains(r#"<sheet name="Sheet1""#));
    read_part(&bytes, "[Content_Types].xml")?;
    Ok(())
}

#[test]
fn test_csv_quotes_special_values() -> Result<()> {
    let bytes = write_csv(&sample_table())?;
    let text = String::from_utf8(bytes)?;
    assert_eq!(
        text,
        "filename,name,notes\na.pdf,Jane <Doe>,\"R&D, \"\"lead\"\"\"\nb.docx,Not found,Not found\n"
    );
    Ok(())
}

#[test]
fn test_empty_table_writes_header_only() -> Result<()> {
    let table = ResultTable::new(vec!["filename".into(), "total".into()]);
    let text = String::from_utf8(SpreadsheetFormat::Csv.write(&table)?)?;
    assert_eq!(text, "filename,total\n");
    assert_eq!(SpreadsheetFormat::Xlsx.extension(), "xlsx");
    Ok(())
}
