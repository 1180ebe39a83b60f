//! # `docsheet-sheets`: Result Spreadsheet Writers
//!
//! Serializes a [`ResultTable`] into a downloadable spreadsheet. The header row
//! is the table's column list (`filename` first, then the schema fields) and
//! every row follows in extraction order.
//!
//! XLSX output is a minimal SpreadsheetML package written directly into a zip
//! archive, with every cell stored as an inline string.

use docsheet::types::ResultTable;
use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use thiserror::Error;
use tracing::{debug, instrument};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

// --- Error Definitions ---

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to write spreadsheet archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Failed to write spreadsheet data: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

// --- Formats ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadsheetFormat {
    #[default]
    Xlsx,
    Csv,
}

impl SpreadsheetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SpreadsheetFormat::Xlsx => "xlsx",
            SpreadsheetFormat::Csv => "csv",
        }
    }

    /// Serializes the table in this format.
    pub fn write(&self, table: &ResultTable) -> Result<Vec<u8>, SheetError> {
        match self {
            SpreadsheetFormat::Xlsx => write_xlsx(table),
            SpreadsheetFormat::Csv => write_csv(table),
        }
    }
}

impl std::str::FromStr for SpreadsheetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(SpreadsheetFormat::Xlsx),
            "csv" => Ok(SpreadsheetFormat::Csv),
            other => Err(format!("unsupported spreadsheet format '{other}'")),
        }
    }
}

// --- CSV ---

#[instrument(skip(table), fields(rows = table.len()))]
pub fn write_csv(table: &ResultTable) -> Result<Vec<u8>, SheetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.values())?;
    }
    writer
        .into_inner()
        .map_err(|e| SheetError::Io(e.into_error()))
}

// --- XLSX ---

const SHEET_NAME: &str = "Sheet1";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

/// Converts a zero-based column index into its spreadsheet letters (`0 -> A`, `26 -> AA`).
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().map(|&b| b as char).collect()
}

fn push_row<'a>(xml: &mut String, row_number: usize, values: impl Iterator<Item = &'a str>) {
    xml.push_str(&format!(r#"<row r="{row_number}">"#));
    for (col, value) in values.enumerate() {
        xml.push_str(&format!(
            r#"<c r="{}{row_number}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            column_letters(col),
            escape(value)
        ));
    }
    xml.push_str("</row>");
}

fn worksheet_xml(table: &ResultTable) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    push_row(&mut xml, 1, table.columns().iter().map(String::as_str));
    for (index, row) in table.rows().iter().enumerate() {
        push_row(&mut xml, index + 2, row.values());
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

/// Writes the table as a single-sheet XLSX workbook.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn write_xlsx(table: &ResultTable) -> Result<Vec<u8>, SheetError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        ("xl/worksheets/sheet1.xml", worksheet_xml(table)),
    ];
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(size = bytes.len(), "Wrote XLSX workbook");
    Ok(bytes)
}
