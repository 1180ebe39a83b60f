//! # Document Text Extraction Tests

use anyhow::Result;
use docsheet::extract::TextExtractor;
use docsheet_documents::DocumentTextExtractor;
use docsheet_test_utils::{docx::generate_test_docx, helpers::generate_test_pdf};

#[test]
fn test_pdf_text_is_extracted() -> Result<()> {
    let pdf_data = generate_test_pdf("Patient name: Jane Doe")?;
    let text = DocumentTextExtractor.extract(&pdf_data, "pdf")?;
    assert!(
        text.contains("Jane Doe"),
        "Extracted text should contain the PDF content, got: '{text}'"
    );
    Ok(())
}

#[test]
fn test_docx_paragraphs_are_extracted_in_order() -> Result<()> {
    let docx_data = generate_test_docx(&["Invoice 2024-17", "Total: 1 200 & 50 cents"])?;
    let text = DocumentTextExtractor.extract(&docx_data, "docx")?;
    assert_eq!(text, "Invoice 2024-17\nTotal: 1 200 & 50 cents");
    Ok(())
}

#[test]
fn test_corrupt_pdf_is_reported() {
    let result = DocumentTextExtractor.extract(b"%PDF-1.4 truncated", "pdf");
    assert!(result.is_err());
}
