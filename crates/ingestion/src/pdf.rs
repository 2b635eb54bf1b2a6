//! PDF text extraction module
//!
//! Extracts per-page text from PDF files using lopdf. Line breaks are kept
//! so section detection can scan the first lines of each page.

use crate::errors::IngestionError;
use crate::sections::PageText;
use std::path::Path;
use tracing::{debug, warn};

/// Extract the text of every non-empty page, numbered from 1
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, IngestionError> {
    if !path.exists() {
        return Err(IngestionError::FileNotFound(path.display().to_string()));
    }

    let doc = lopdf::Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    debug!(page_count = page_numbers.len(), "Extracting text from PDF");

    let mut pages = Vec::with_capacity(page_numbers.len());
    for page in page_numbers {
        let raw = match doc.extract_text(&[page]) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(page, error = %e, "Failed to extract text from page, skipping");
                continue;
            }
        };

        let text = clean_page_text(&raw);
        if text.is_empty() {
            debug!(page, "Skipping empty page");
            continue;
        }
        pages.push(PageText {
            page,
            text,
            section: None,
        });
    }

    if pages.is_empty() {
        return Err(IngestionError::PdfParseError {
            path: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    debug!(pages = pages.len(), "Text extraction complete");
    Ok(pages)
}

/// Collapse whitespace within lines, drop blank lines and common artifacts
fn clean_page_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.replace('\u{FEFF}', "")
                .replace(['\u{201C}', '\u{201D}'], "\"")
                .replace(['\u{2018}', '\u{2019}'], "'")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// One page per entry; each string becomes its own text block
    fn write_pdf(path: &Path, pages: &[Vec<&str>]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for lines in pages {
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12_i64.into()]));
                operations.push(Operation::new("Td", vec![72_i64.into(), (720 - 20 * i as i64).into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0_i64.into(), 0_i64.into(), 612_i64.into(), 792_i64.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_clean_page_text_keeps_lines() {
        let input = "  3.   Results \n\n\u{FEFF}Accuracy\u{a0}was  high.\n";
        assert_eq!(clean_page_text(input), "3. Results\nAccuracy was high.");
        assert_eq!(clean_page_text("\u{201C}quoted\u{201D} it\u{2019}s"), "\"quoted\" it's");
        assert_eq!(clean_page_text(" \n\t\n"), "");
    }

    #[test]
    fn test_extract_pages_skips_blank_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        write_pdf(
            &path,
            &[
                vec!["Abstract", "We compress context."],
                vec![],
                vec!["Results", "Accuracy reached 91 percent."],
            ],
        );

        let pages = extract_pages(&path).unwrap();
        assert_eq!(pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![1, 3]);
        assert!(pages[0].text.contains("Abstract"));
        assert!(pages[1].text.contains("Accuracy reached 91 percent."));
        assert!(pages.iter().all(|p| p.section.is_none()));
    }

    #[test]
    fn test_missing_and_invalid_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let missing = extract_pages(&dir.path().join("absent.pdf")).unwrap_err();
        assert!(matches!(missing, IngestionError::FileNotFound(_)));

        let bogus = dir.path().join("bogus.pdf");
        std::fs::write(&bogus, b"not a pdf at all").unwrap();
        let err = extract_pages(&bogus).unwrap_err();
        assert!(matches!(err, IngestionError::PdfParseError { .. }));
    }
}
