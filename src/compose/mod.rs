//! Building the composed output PDF.
//!
//! The output holds a single page sized like the source's first page. Its
//! content paints the background image first and then the original page,
//! wrapped as a Form XObject, on top of it. Images of the stripped formats
//! are removed from the source page before it is wrapped.
//!
//! ```no_run
//! use std::path::Path;
//! use rationpdf::compose::PageComposer;
//!
//! fn main() -> rationpdf::Result<()> {
//!     let report = PageComposer::default().compose(
//!         Path::new("card.pdf"),
//!         Path::new("static/bpl_card.jpg"),
//!         Path::new("card_out.pdf"),
//!     )?;
//!     println!("stripped {} images", report.stripped_images.len());
//!     Ok(())
//! }
//! ```

mod image;
mod import;

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};

use crate::document::{PageId, PdfBackend, PdfDocument};
use crate::error::Result;
use crate::model::{PageRect, RasterFormat};

use self::image::{deflate, embed_image};
use self::import::ObjectImporter;

/// Vertical shift of the background layer, in PDF units.
pub const DEFAULT_BACKGROUND_OFFSET: f32 = 188.0;

/// Version written into composed documents.
const OUTPUT_VERSION: &str = "1.7";

const BACKGROUND_NAME: &str = "Bg";
const PAGE_NAME: &str = "Page";

/// Options for page composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeOptions {
    /// How far the background is raised above the page origin.
    pub background_offset: f32,

    /// Keep the background's aspect ratio, centering it in its rectangle.
    pub keep_proportion: bool,

    /// Image formats removed from the source page.
    pub strip_formats: Vec<RasterFormat>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            background_offset: DEFAULT_BACKGROUND_OFFSET,
            keep_proportion: true,
            strip_formats: vec![RasterFormat::Png],
        }
    }
}

impl ComposeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vertical background offset.
    pub fn with_background_offset(mut self, offset: f32) -> Self {
        self.background_offset = offset;
        self
    }

    /// Stretch the background to its full rectangle instead of fitting it.
    pub fn stretch_background(mut self) -> Self {
        self.keep_proportion = false;
        self
    }

    /// Replace the set of stripped image formats.
    pub fn with_strip_formats(mut self, formats: Vec<RasterFormat>) -> Self {
        self.strip_formats = formats;
        self
    }

    /// Keep every source image.
    pub fn keep_all_images(mut self) -> Self {
        self.strip_formats.clear();
        self
    }

    /// Where the background goes on a page of the given rectangle.
    ///
    /// The target spans the full page width and is raised by the offset,
    /// so its top part falls outside the page.
    pub fn background_target(&self, page: PageRect) -> PageRect {
        PageRect::new(
            0.0,
            self.background_offset,
            page.width(),
            page.height() + self.background_offset,
        )
    }
}

/// A non-fatal problem met while composing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// An image could not be removed from the source page.
    ResourceRemoval { name: String, reason: String },
    /// The background file does not exist.
    BackgroundMissing { path: PathBuf },
    /// The background file exists but could not be embedded.
    BackgroundUnreadable { path: PathBuf, reason: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::ResourceRemoval { name, reason } => {
                write!(f, "could not remove image /{}: {}", name, reason)
            }
            Warning::BackgroundMissing { path } => {
                write!(f, "background {} not found", path.display())
            }
            Warning::BackgroundUnreadable { path, reason } => {
                write!(f, "background {} unreadable: {}", path.display(), reason)
            }
        }
    }
}

/// What a composition did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeReport {
    /// Pages in the output (0 or 1)
    pub page_count: usize,

    /// Rectangle of the source's first page
    pub page_rect: Option<PageRect>,

    /// Clockwise display rotation of the source's first page
    #[serde(default)]
    pub rotation: i64,

    /// Resource names of the removed images
    pub stripped_images: Vec<String>,

    /// Whether the background layer was painted
    pub background_drawn: bool,

    pub warnings: Vec<Warning>,
}

impl ComposeReport {
    fn warn(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Builds composed documents.
#[derive(Debug, Clone, Default)]
pub struct PageComposer {
    options: ComposeOptions,
}

impl PageComposer {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Compose `source` over `background` and write the result to `output`.
    ///
    /// Nothing is written when the source cannot be opened. A missing or
    /// unreadable background is reported as a warning and the page is
    /// composed without it.
    pub fn compose(&self, source: &Path, background: &Path, output: &Path) -> Result<ComposeReport> {
        let doc = PdfDocument::open(source)?;
        let (mut composed, report) = self.compose_document(doc, background)?;
        save_atomic(&mut composed, output)?;

        log::info!(
            "Wrote {} ({} page(s), background {})",
            output.display(),
            report.page_count,
            if report.background_drawn { "drawn" } else { "skipped" }
        );
        Ok(report)
    }

    /// Compose an opened document into a new in-memory document.
    pub fn compose_document(
        &self,
        mut source: PdfDocument,
        background: &Path,
    ) -> Result<(Document, ComposeReport)> {
        let mut report = ComposeReport::default();
        let mut dest = Document::with_version(OUTPUT_VERSION);
        let pages_id = dest.new_object_id();
        let mut kids = Vec::new();

        if let Some(page_id) = source.first_page() {
            let rect = source.page_rect(page_id);
            let rotation = source.page_rotation(page_id);
            let display = rect.rotated(rotation);
            report.page_rect = Some(rect);
            report.rotation = rotation;
            log::debug!(
                "Page 0 is {}x{}, rotated {}",
                rect.width(),
                rect.height(),
                rotation
            );

            self.strip_images(&mut source, page_id, &mut report);

            let form_id = wrap_page(&source, page_id, rect, rotation, &mut dest)?;
            let background = self.background_layer(&mut dest, background, display, &mut report);
            let page = build_page(&mut dest, pages_id, display, form_id, background)?;
            kids.push(Object::Reference(page));
            report.page_count = 1;
        } else {
            log::warn!("Source has no pages, writing an empty document");
        }

        dest.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => Object::Integer(kids.len() as i64),
                "Kids" => kids,
            }),
        );
        let catalog_id = dest.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        dest.trailer.set("Root", Object::Reference(catalog_id));

        Ok((dest, report))
    }

    fn strip_images(&self, doc: &mut PdfDocument, page_id: PageId, report: &mut ComposeReport) {
        if self.options.strip_formats.is_empty() {
            return;
        }

        let images = match doc.page_images(page_id) {
            Ok(images) => images,
            Err(e) => {
                report.warn(Warning::ResourceRemoval {
                    name: "*".to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        for image in images {
            if !self.options.strip_formats.contains(&image.format) {
                continue;
            }
            match doc.remove_image(page_id, &image.name) {
                Ok(()) => {
                    log::debug!("Removed {} image /{}", image.format.extension(), image.name);
                    report.stripped_images.push(image.name);
                }
                Err(e) => report.warn(Warning::ResourceRemoval {
                    name: image.name,
                    reason: e.to_string(),
                }),
            }
        }
    }

    fn background_layer(
        &self,
        dest: &mut Document,
        path: &Path,
        page: PageRect,
        report: &mut ComposeReport,
    ) -> Option<(ObjectId, PageRect)> {
        if !path.exists() {
            report.warn(Warning::BackgroundMissing {
                path: path.to_path_buf(),
            });
            return None;
        }

        match embed_image(dest, path) {
            Ok(img) => {
                let target = self.options.background_target(page);
                let placed = if self.options.keep_proportion {
                    target.fit_centered(img.width as f32, img.height as f32)
                } else {
                    target
                };
                report.background_drawn = true;
                Some((img.id, placed))
            }
            Err(e) => {
                report.warn(Warning::BackgroundUnreadable {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }
}

/// Matrix mapping a page's user space onto its displayed orientation, with
/// the displayed rectangle's lower-left corner at (0, 0).
fn display_matrix(rect: PageRect, rotation: i64) -> [f32; 6] {
    match rotation {
        90 => [0.0, -1.0, 1.0, 0.0, -rect.y0, rect.x1],
        180 => [-1.0, 0.0, 0.0, -1.0, rect.x1, rect.y1],
        270 => [0.0, 1.0, -1.0, 0.0, rect.y1, -rect.x0],
        _ => [1.0, 0.0, 0.0, 1.0, -rect.x0, -rect.y0],
    }
}

/// Copy a source page into `dest` as a Form XObject.
///
/// The form's matrix turns the page the way a viewer would show it and moves
/// the result to the origin, so painting it with the identity matrix covers
/// the destination page exactly.
fn wrap_page(
    source: &PdfDocument,
    page_id: PageId,
    rect: PageRect,
    rotation: i64,
    dest: &mut Document,
) -> Result<ObjectId> {
    let content = source.page_content(page_id)?;

    let mut importer = ObjectImporter::new(source.raw_doc());
    let resources = importer.import(dest, &Object::Dictionary(source.page_resources(page_id)));
    log::debug!("Copied {} objects from page 0", importer.imported_count());

    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => Object::Integer(1),
            "BBox" => rect.to_object(),
            "Matrix" => display_matrix(rect, rotation).map(Object::Real).to_vec(),
            "Resources" => resources,
            "Filter" => "FlateDecode",
        },
        deflate(&content)?,
    );
    Ok(dest.add_object(form))
}

fn build_page(
    dest: &mut Document,
    parent: ObjectId,
    display: PageRect,
    form_id: ObjectId,
    background: Option<(ObjectId, PageRect)>,
) -> Result<ObjectId> {
    let mut operations = Vec::new();
    let mut xobjects = dictionary! {
        PAGE_NAME => Object::Reference(form_id),
    };

    if let Some((image_id, placed)) = background {
        xobjects.set(BACKGROUND_NAME, Object::Reference(image_id));
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placed.width()),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(placed.height()),
                    Object::Real(placed.x0),
                    Object::Real(placed.y0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(BACKGROUND_NAME.into())]),
            Operation::new("Q", vec![]),
        ]);
    }
    operations.extend([
        Operation::new("q", vec![]),
        Operation::new("Do", vec![Object::Name(PAGE_NAME.into())]),
        Operation::new("Q", vec![]),
    ]);

    let content = Content { operations }.encode()?;
    let content_id = dest.add_object(Stream::new(Dictionary::new(), content));

    Ok(dest.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(parent),
        "MediaBox" => display.to_object(),
        "Resources" => dictionary! {
            "XObject" => xobjects,
        },
        "Contents" => Object::Reference(content_id),
    }))
}

/// Save `doc` to `path` through a temporary file in the same directory.
pub fn save_atomic(doc: &mut Document, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new().prefix(".compose-").tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        doc.save_to(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}
