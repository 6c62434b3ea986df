//! End-to-end processing of one document.
//!
//! extract text → normalize → classify → resolve background → compose.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::background::{BackgroundConfig, BackgroundResolver};
use crate::classify::{CategoryClassifier, Classification};
use crate::compose::{ComposeOptions, ComposeReport, PageComposer};
use crate::document::PdfDocument;
use crate::error::Result;
use crate::extract::{normalize_text, TextExtractor};
use crate::model::Category;

/// Everything a [`Pipeline`] needs to be built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub background: BackgroundConfig,
    pub compose: ComposeOptions,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, background: BackgroundConfig) -> Self {
        self.background = background;
        self
    }

    pub fn with_compose_options(mut self, options: ComposeOptions) -> Self {
        self.compose = options;
        self
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub category: Category,

    /// Rule that decided the category, `None` for the fallback
    pub rule: Option<String>,

    /// Background image used for the category
    pub background: PathBuf,

    pub output: PathBuf,
    pub report: ComposeReport,
}

/// Text extraction, classification and composition wired together.
///
/// A pipeline holds no per-document state, so one instance can serve
/// many threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    extractor: TextExtractor,
    classifier: CategoryClassifier,
    resolver: BackgroundResolver,
    composer: PageComposer,
}

impl Pipeline {
    /// Build a pipeline with the default rules, creating any missing
    /// background images.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let resolver = BackgroundResolver::new(config.background);
        resolver.initialize()?;

        Ok(Self::with_components(
            TextExtractor::new(),
            CategoryClassifier::default(),
            resolver,
            PageComposer::new(config.compose),
        ))
    }

    /// Assemble a pipeline from explicit parts.
    ///
    /// The resolver is used as given; call
    /// [`BackgroundResolver::initialize`] first if placeholders are wanted.
    pub fn with_components(
        extractor: TextExtractor,
        classifier: CategoryClassifier,
        resolver: BackgroundResolver,
        composer: PageComposer,
    ) -> Self {
        Self {
            extractor,
            classifier,
            resolver,
            composer,
        }
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn resolver(&self) -> &BackgroundResolver {
        &self.resolver
    }

    /// Classify `input` and write the composed document to `output`.
    pub fn run(&self, input: &Path, output: &Path) -> Result<PipelineResult> {
        log::info!("Processing {}", input.display());

        let doc = PdfDocument::open(input)?;
        let classification = self.classify_document(&doc);
        let background = self.resolver.resolve(classification.category);
        log::debug!(
            "Using background {} for {}",
            background.display(),
            classification.category
        );

        let (mut composed, report) = self.composer.compose_document(doc, background)?;
        crate::compose::save_atomic(&mut composed, output)?;
        log::info!("Wrote {}", output.display());

        Ok(PipelineResult {
            category: classification.category,
            rule: classification.rule,
            background: background.to_path_buf(),
            output: output.to_path_buf(),
            report,
        })
    }

    /// Classify a file without composing anything.
    pub fn classify_file(&self, input: &Path) -> Result<Classification> {
        let doc = PdfDocument::open(input)?;
        Ok(self.classify_document(&doc))
    }

    /// Classify an opened document.
    pub fn classify_document(&self, doc: &PdfDocument) -> Classification {
        let text = normalize_text(&self.extractor.extract(doc));
        self.classifier.evaluate(&text)
    }
}
