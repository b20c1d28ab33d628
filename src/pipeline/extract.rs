//! Document text extraction for the evaluation pipeline.
//!
//! Two formats are supported: PDF (text layer, page-concatenated) and
//! DOCX (paragraph-concatenated). Anything else is rejected before any
//! further work happens. Scanned PDFs without a text layer come out
//! empty — grading an empty submission is the model's problem to report,
//! not ours to guess at.

use crate::error::DeckGenError;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use std::path::Path;
use tracing::debug;

/// Extract plain text from a PDF or DOCX file.
///
/// Dispatches on the (case-insensitive) file extension; any other
/// extension is an [`DeckGenError::UnsupportedFileType`].
pub fn extract_text(path: &Path) -> Result<String, DeckGenError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let text = match extension.as_str() {
        "pdf" => extract_pdf(path)?,
        "docx" => extract_docx(path)?,
        other => {
            return Err(DeckGenError::UnsupportedFileType {
                extension: other.to_string(),
            })
        }
    };

    debug!(
        "Extracted {} chars from {}",
        text.len(),
        path.display()
    );
    Ok(text)
}

/// Pull the text layer out of a PDF, pages concatenated in order.
fn extract_pdf(path: &Path) -> Result<String, DeckGenError> {
    pdf_extract::extract_text(path).map_err(|e| DeckGenError::ExtractionFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Concatenate every paragraph of a DOCX document, one per line.
fn extract_docx(path: &Path) -> Result<String, DeckGenError> {
    let bytes = std::fs::read(path).map_err(|e| DeckGenError::ExtractionFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let docx = docx_rs::read_docx(&bytes).map_err(|e| DeckGenError::ExtractionFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut paragraphs: Vec<String> = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut line = String::new();
            for pc in &paragraph.children {
                if let ParagraphChild::Run(run) = pc {
                    for rc in &run.children {
                        if let RunChild::Text(text) = rc {
                            line.push_str(&text.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = extract_text(Path::new("/tmp/answers.txt")).unwrap_err();
        match err {
            DeckGenError::UnsupportedFileType { extension } => assert_eq!(extension, "txt"),
            other => panic!("expected UnsupportedFileType, got {other:?}"),
        }
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = extract_text(Path::new("/tmp/answers")).unwrap_err();
        assert!(matches!(err, DeckGenError::UnsupportedFileType { .. }));
    }

    #[test]
    fn docx_paragraphs_come_out_newline_joined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam.docx");

        let file = std::fs::File::create(&path).unwrap();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Question 1: What is Rust?")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Answer: A systems language.")))
            .build()
            .pack(file)
            .unwrap();

        let text = extract_text(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Question 1: What is Rust?");
        assert_eq!(lines[1], "Answer: A systems language.");
    }

    #[test]
    fn uppercase_extension_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam.DOCX");

        let file = std::fs::File::create(&path).unwrap();
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("content")))
            .build()
            .pack(file)
            .unwrap();

        assert_eq!(extract_text(&path).unwrap(), "content");
    }

    #[test]
    fn corrupt_docx_reports_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.docx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, DeckGenError::ExtractionFailed { .. }));
    }
}
