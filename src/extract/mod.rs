//! Plain text extraction for classification.
//!
//! Each page is first extracted directly. Pages that come back empty are
//! retried block by block: the text shown inside every `BT … ET` block of the
//! page content is decoded with the active font and the blocks are joined
//! with single spaces.

mod normalize;

pub use normalize::{normalize_text, preview, TextNormalizer};

use std::path::Path;

use crate::document::{ContentOp, PageId, PdfBackend, PdfDocument, PdfValue};
use crate::error::Result;

/// A `TJ` adjustment at or below this value (thousandths of text space)
/// is read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Extracts plain text from a document.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    _private: (),
}

impl TextExtractor {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Extract the text of every page, in page order, separated by spaces.
    ///
    /// Never fails: pages whose text cannot be read contribute nothing.
    pub fn extract<B: PdfBackend + ?Sized>(&self, doc: &B) -> String {
        let mut text = String::new();

        for (page_number, page_id) in doc.pages() {
            let page_text = self.extract_page(doc, page_number, page_id);
            text.push_str(&page_text);
            text.push(' ');
        }

        text.trim().to_string()
    }

    /// Open a file and extract its text.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let doc = PdfDocument::open(path)?;
        Ok(self.extract(&doc))
    }

    fn extract_page<B: PdfBackend + ?Sized>(
        &self,
        doc: &B,
        page_number: u32,
        page_id: PageId,
    ) -> String {
        let direct = match doc.page_text(page_number) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                log::debug!("Direct extraction failed on page {}: {}", page_number, e);
                String::new()
            }
        };
        if !direct.is_empty() {
            return direct;
        }

        log::warn!(
            "No text found on page {}, trying block extraction",
            page_number
        );
        match extract_blocks(doc, page_id) {
            Ok(blocks) => blocks.join(" "),
            Err(e) => {
                log::warn!("Block extraction failed on page {}: {}", page_number, e);
                String::new()
            }
        }
    }
}

/// Collect the text payload of each text block on a page.
///
/// Blocks without any shown text are skipped.
pub fn extract_blocks<B: PdfBackend + ?Sized>(doc: &B, page_id: PageId) -> Result<Vec<String>> {
    let content = doc.page_content(page_id)?;
    let ops = doc.decode_content(&content)?;
    Ok(collect_blocks(doc, page_id, &ops))
}

fn collect_blocks<B: PdfBackend + ?Sized>(
    doc: &B,
    page_id: PageId,
    ops: &[ContentOp],
) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut font: Vec<u8> = Vec::new();
    let mut line_break = false;

    let mut flush = |current: &mut String| {
        let block = current.trim();
        if !block.is_empty() {
            blocks.push(block.to_string());
        }
        current.clear();
    };

    for op in ops {
        match op.operator.as_str() {
            "BT" => {
                flush(&mut current);
                line_break = false;
            }
            "ET" => flush(&mut current),
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    font = name.clone();
                }
            }
            "Td" | "TD" | "Tm" | "T*" => line_break = true,
            "Tj" | "'" | "\"" => {
                if op.operator != "Tj" {
                    line_break = true;
                }
                if let Some(PdfValue::Str(bytes)) = op.operands.last() {
                    let shown = doc.decode_text(page_id, &font, bytes);
                    push_shown(&mut current, &shown, &mut line_break);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    let mut shown = String::new();
                    for item in items {
                        match item {
                            PdfValue::Str(bytes) => {
                                shown.push_str(&doc.decode_text(page_id, &font, bytes));
                            }
                            PdfValue::Integer(n) if (*n as f32) <= TJ_SPACE_THRESHOLD => {
                                shown.push(' ');
                            }
                            PdfValue::Real(n) if *n <= TJ_SPACE_THRESHOLD => shown.push(' '),
                            _ => {}
                        }
                    }
                    push_shown(&mut current, &shown, &mut line_break);
                }
            }
            _ => {}
        }
    }
    flush(&mut current);

    blocks
}

fn push_shown(current: &mut String, shown: &str, line_break: &mut bool) {
    if shown.is_empty() {
        return;
    }
    if *line_break && !current.is_empty() && !current.ends_with(' ') {
        current.push(' ');
    }
    *line_break = false;
    current.push_str(shown);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::decode_text_simple;
    use crate::error::Error;
    use std::collections::BTreeMap;

    /// Backend serving canned pages: (direct text, content stream).
    struct MockBackend {
        pages: Vec<(Option<&'static str>, &'static str)>,
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            (0..self.pages.len() as u32)
                .map(|i| (i + 1, (i + 10, 0)))
                .collect()
        }

        fn page_text(&self, page_number: u32) -> Result<String> {
            match self.pages[(page_number - 1) as usize].0 {
                Some(text) => Ok(text.to_string()),
                None => Err(Error::PdfParse("no text layer".into())),
            }
        }

        fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
            Ok(self.pages[(page.0 - 10) as usize].1.as_bytes().to_vec())
        }

        fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
            PdfDocument::from_lopdf(lopdf::Document::new()).decode_content(data)
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }
    }

    #[test]
    fn test_direct_text_pages_joined() {
        let backend = MockBackend {
            pages: vec![(Some("First page\n"), ""), (Some("  Second page"), "")],
        };
        let text = TextExtractor::new().extract(&backend);
        assert_eq!(text, "First page Second page");
    }

    #[test]
    fn test_block_fallback() {
        let backend = MockBackend {
            pages: vec![(
                Some("   "),
                "BT /F1 12 Tf 72 700 Td (Priority) Tj 0 -14 Td (Household) Tj ET \
                  BT /F1 10 Tf 72 600 Td [(ration) -300 (card)] TJ ET \
                  BT ET",
            )],
        };
        let text = TextExtractor::new().extract(&backend);
        assert_eq!(text, "Priority Household ration card");
    }

    #[test]
    fn test_fallback_after_direct_error() {
        let backend = MockBackend {
            pages: vec![(None, "BT /F1 12 Tf (ANTYODAYA) Tj ET")],
        };
        assert_eq!(TextExtractor::new().extract(&backend), "ANTYODAYA");
    }

    #[test]
    fn test_unreadable_page_yields_empty() {
        let backend = MockBackend {
            pages: vec![(None, "BT (unterminated")],
        };
        assert_eq!(TextExtractor::new().extract(&backend), "");
    }

    #[test]
    fn test_no_pages() {
        let backend = MockBackend { pages: vec![] };
        assert_eq!(TextExtractor::new().extract(&backend), "");
    }

    #[test]
    fn test_kerning_does_not_split_words() {
        let backend = MockBackend {
            pages: vec![(Some(""), "BT [(Anty) 15 (odaya)] TJ ET")],
        };
        assert_eq!(TextExtractor::new().extract(&backend), "Antyodaya");
    }
}
