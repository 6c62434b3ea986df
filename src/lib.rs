//! # rationpdf
//!
//! Ration card PDF classification and background re-composition.
//!
//! The library reads the text of a PDF, decides which ration card category
//! (AAY, APL, BPL or DEFAULT) it belongs to, and writes a new PDF where the
//! first page is drawn over the background image of that category.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use rationpdf::{Pipeline, PipelineConfig};
//!
//! fn main() -> rationpdf::Result<()> {
//!     // Creates placeholder backgrounds under ./static if needed
//!     let pipeline = Pipeline::new(PipelineConfig::default())?;
//!
//!     let result = pipeline.run(Path::new("card.pdf"), Path::new("card_out.pdf"))?;
//!     println!("{} -> {}", result.category, result.output.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! - [`extract`]: plain text with a block-level fallback, and normalization
//! - [`classify`]: ordered keyword rules, first match wins
//! - [`background`]: category to image path, with placeholder synthesis
//! - [`compose`]: image stripping and the layered output page
//! - [`pipeline`]: all of the above for one file

pub mod background;
pub mod classify;
pub mod compose;
pub mod document;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;

// Re-export commonly used types
pub use background::{BackgroundConfig, BackgroundResolver};
pub use classify::{CategoryClassifier, Classification, Rule};
pub use compose::{ComposeOptions, ComposeReport, PageComposer, Warning};
pub use document::{PdfBackend, PdfDocument};
pub use error::{Error, Result};
pub use extract::{normalize_text, TextExtractor};
pub use model::{Category, PageImage, PageRect, RasterFormat};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResult};

use std::path::Path;

/// Classify a PDF file with the default rules.
///
/// # Example
///
/// ```no_run
/// let category = rationpdf::classify_file("card.pdf").unwrap();
/// println!("{}", category);
/// ```
pub fn classify_file<P: AsRef<Path>>(path: P) -> Result<Category> {
    let text = TextExtractor::new().extract_file(path)?;
    Ok(CategoryClassifier::default().classify(&normalize_text(&text)))
}

/// Classify already extracted text with the default rules.
pub fn classify_text(text: &str) -> Category {
    CategoryClassifier::default().classify(&normalize_text(text))
}

/// Get the library version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(classify_text("ANTYODAYA ANNA YOJANA"), Category::Aay);
        assert_eq!(classify_text("Non-Priority"), Category::Apl);
        assert_eq!(classify_text("Priority Household"), Category::Bpl);
        assert_eq!(classify_text("ration card"), Category::Default);
    }
}
