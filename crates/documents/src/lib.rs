//! # docsheet-documents: Document Text Extraction
//!
//! Converts the binary document formats found in the blob store into plain
//! text for the extraction prompt. PDF pages are read with the `pdf` crate;
//! DOCX files are opened as zip archives and their paragraphs are read from
//! `word/document.xml`. Any other file type yields empty text.

use docsheet::{errors::DocumentError, extract::TextExtractor};
use pdf::file::FileOptions;
use quick_xml::{escape::resolve_predefined_entity, events::Event, Reader};
use std::io::Read;
use tracing::{debug, instrument};
use zip::ZipArchive;

const DOCX_BODY_PART: &str = "word/document.xml";

/// The default [`TextExtractor`] for PDF and DOCX documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTextExtractor;

impl TextExtractor for DocumentTextExtractor {
    #[instrument(skip(self, data), fields(size = data.len()))]
    fn extract(&self, data: &[u8], file_type: &str) -> Result<String, DocumentError> {
        match file_type {
            "pdf" => extract_text_from_pdf(data),
            "docx" => extract_text_from_docx(data),
            other => {
                debug!("Unsupported file type '{other}', using empty text");
                Ok(String::new())
            }
        }
    }
}

/// Extracts text from all pages of a PDF, in page order.
pub fn extract_text_from_pdf(pdf_data: &[u8]) -> Result<String, DocumentError> {
    let file = FileOptions::cached()
        .load(pdf_data)
        .map_err(|e| DocumentError::Pdf(e.to_string()))?;
    let resolver = file.resolver();
    let mut full_text = String::new();

    for page_num in 0..file.num_pages() {
        let page = file
            .get_page(page_num)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?;
        if let Some(content) = &page.contents {
            let operations = content
                .operations(&resolver)
                .map_err(|e| DocumentError::Pdf(e.to_string()))?;
            for op in operations.iter() {
                if let pdf::content::Op::TextDraw { text } = op {
                    full_text.push_str(&text.to_string_lossy());
                }
            }
        }
        if page_num + 1 < file.num_pages() {
            full_text.push('\n');
        }
    }
    Ok(full_text)
}

/// Extracts the paragraph text of a DOCX document, one paragraph per line.
pub fn extract_text_from_docx(docx_data: &[u8]) -> Result<String, DocumentError> {
    let mut archive = ZipArchive::new(std::io::Cursor::new(docx_data)).map_err(docx_error)?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY_PART)
        .map_err(docx_error)?
        .read_to_string(&mut xml)
        .map_err(docx_error)?;

    document_xml_text(&xml)
}

fn docx_error(e: impl std::fmt::Display) -> DocumentError {
    DocumentError::Docx(e.to_string())
}

/// Walks the WordprocessingML body and collects run text.
///
/// Every `w:p` ends a line. A paragraph nested inside another one (text boxes,
/// shapes) also breaks the line where it starts, so the outer paragraph's text
/// on either side of it is kept.
fn document_xml_text(xml: &str) -> Result<String, DocumentError> {
    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(docx_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => {
                    if depth > 0 && !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                    }
                    depth += 1;
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    lines.push(std::mem::take(&mut line));
                    depth = depth.saturating_sub(1);
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"p" => lines.push(String::new()),
                b"tab" => line.push('\t'),
                b"br" | b"cr" => line.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => line.push_str(&e.decode().map_err(docx_error)?),
            Event::GeneralRef(e) if in_text => {
                if let Some(c) = e.resolve_char_ref().map_err(docx_error)? {
                    line.push(c);
                } else {
                    let name = e.decode().map_err(docx_error)?;
                    let resolved = resolve_predefined_entity(&name)
                        .ok_or_else(|| docx_error(format!("Unknown entity '&{name};'")))?;
                    line.push_str(resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_types_yield_empty_text() {
        let text = DocumentTextExtractor.extract(b"plain bytes", "txt").unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_document_xml_keeps_text_around_nested_paragraphs() {
        let xml = r#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>Before</w:t></w:r><w:r><w:txbxContent>
                <w:p><w:r><w:t>Boxed</w:t></w:r></w:p>
            </w:txbxContent></w:r><w:r><w:t xml:space="preserve"> after</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>Q&amp;A caf&#233;</w:t><w:tab/><w:t>x</w:t><w:br/><w:t>y</w:t></w:r></w:p>
        </w:body></w:document>"#;

        let text = document_xml_text(xml).unwrap();
        assert_eq!(text, "Before\nBoxed\n after\n\nQ&A caf\u{e9}\tx\ny");
    }

    #[test]
    fn test_invalid_docx_is_an_error() {
        let err = extract_text_from_docx(b"not a zip").unwrap_err();
        assert!(matches!(err, DocumentError::Docx(_)));
    }
}
