use crate::error::ExtractionError;
use crate::models::Page;
use lopdf::Document;

/// Parses an in-memory PDF payload into ordered pages.
pub trait PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Page>, ExtractionError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<Page>, ExtractionError> {
        let document =
            Document::load_mem(bytes).map_err(|error| ExtractionError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| ExtractionError::PdfParse(error.to_string()))?;

            // Pages without extractable text contribute nothing downstream.
            if !text.trim().is_empty() {
                pages.push(Page {
                    number: page_no,
                    text,
                });
            }
        }

        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::{LopdfExtractor, PdfExtractor};

    #[test]
    fn malformed_bytes_fail_extraction() {
        let extractor = LopdfExtractor;
        let result = extractor.extract_pages(b"%PDF-1.4\n%this is not a pdf");
        assert!(result.is_err());
    }

    #[test]
    fn arbitrary_bytes_fail_extraction() {
        let extractor = LopdfExtractor;
        assert!(extractor.extract_pages(b"plain text, no pdf header").is_err());
    }
}
