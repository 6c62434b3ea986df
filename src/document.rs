//! PDF document access.
//!
//! [`PdfBackend`] is the read-only surface text extraction needs; it keeps
//! the extraction logic independent of the concrete PDF library.
//! [`PdfDocument`] implements it on top of lopdf and adds the page-level
//! operations composition needs (geometry, image enumeration and removal).

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::{PageImage, PageRect, RasterFormat};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Maximum `/Parent` hops followed when resolving inherited attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

/// Read access to a PDF document, as used by text extraction.
pub trait PdfBackend {
    /// All pages as (page_number → PageId), page numbers starting at 1.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Text of one page, as produced by the library's direct extraction.
    fn page_text(&self, page_number: u32) -> Result<String>;

    /// The raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Check the `%PDF-x.y` header and return the version string.
pub fn check_header(data: &[u8]) -> Result<String> {
    const MAGIC: &[u8] = b"%PDF-";

    if data.len() < MAGIC.len() + 3 || !data.starts_with(MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version = &data[MAGIC.len()..MAGIC.len() + 3];
    if !(version[0].is_ascii_digit() && version[1] == b'.' && version[2].is_ascii_digit()) {
        return Err(Error::UnsupportedVersion(
            String::from_utf8_lossy(version).to_string(),
        ));
    }

    Ok(String::from_utf8_lossy(version).to_string())
}

/// An opened PDF document.
///
/// The handle owns the parsed document; dropping it releases everything.
pub struct PdfDocument {
    doc: LopdfDocument,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::SourceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Opening {} ({} bytes)", path.display(), data.len());
        Self::from_bytes(&data)
    }

    /// Parse a PDF from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        check_header(data)?;
        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;
        Ok(Self { doc })
    }

    /// Wrap an already parsed lopdf document.
    pub fn from_lopdf(doc: LopdfDocument) -> Self {
        Self { doc }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// The first page, if the document has any.
    pub fn first_page(&self) -> Option<PageId> {
        self.doc.get_pages().values().next().copied()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Resolve the visible rectangle of a page.
    ///
    /// `CropBox` wins over `MediaBox`; both may be inherited from an
    /// ancestor in the page tree. Pages declaring neither are US Letter.
    pub fn page_rect(&self, page_id: PageId) -> PageRect {
        self.page_box(page_id, b"CropBox")
            .or_else(|| self.page_box(page_id, b"MediaBox"))
            .unwrap_or_else(PageRect::letter)
    }

    /// Clockwise display rotation of a page: 0, 90, 180 or 270.
    ///
    /// `/Rotate` may be inherited. Values that are not a multiple of 90 are
    /// ignored.
    pub fn page_rotation(&self, page_id: PageId) -> i64 {
        let rotate = self
            .inherited(page_id, b"Rotate")
            .and_then(|obj| self.resolve(obj).as_i64().ok())
            .unwrap_or(0)
            .rem_euclid(360);
        if rotate % 90 == 0 {
            rotate
        } else {
            log::warn!("Ignoring /Rotate {} on page {:?}", rotate, page_id);
            0
        }
    }

    fn page_box(&self, page_id: PageId, key: &[u8]) -> Option<PageRect> {
        self.inherited(page_id, key)
            .and_then(|obj| self.resolve(obj).as_array().ok())
            .and_then(|arr| PageRect::from_array(arr))
            .filter(|rect| !rect.is_empty())
    }

    /// Look up a page attribute, following `/Parent` links.
    fn inherited(&self, page_id: PageId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Dereference an object if it is a reference.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Find the dictionary holding `Resources` for a page (the page itself or
    /// an ancestor) and return its id with the entry as stored there.
    fn resources_entry(&self, page_id: PageId) -> Result<(ObjectId, Object)> {
        let mut owner = page_id;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let dict = self.doc.get_dictionary(owner)?;
            if let Ok(res) = dict.get(b"Resources") {
                return Ok((owner, res.clone()));
            }
            owner = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .map_err(|_| Error::MissingObject(format!("Resources of page {:?}", page_id)))?;
        }
        Err(Error::Corrupted(format!(
            "Page tree too deep above page {:?}",
            page_id
        )))
    }

    /// The page's resource dictionary, cloned with inheritance applied.
    pub fn page_resources(&self, page_id: PageId) -> Dictionary {
        match self.resources_entry(page_id) {
            Ok((_, obj)) => self
                .resolve(&obj)
                .as_dict()
                .map(Clone::clone)
                .unwrap_or_else(|_| Dictionary::new()),
            Err(_) => Dictionary::new(),
        }
    }

    /// The page's XObject dictionary.
    fn xobjects(&self, page_id: PageId) -> Result<Dictionary> {
        let resources = self.page_resources(page_id);
        match resources.get(b"XObject") {
            Ok(obj) => Ok(self.resolve(obj).as_dict()?.clone()),
            Err(_) => Ok(Dictionary::new()),
        }
    }

    /// List image XObjects painted directly by the page.
    pub fn page_images(&self, page_id: PageId) -> Result<Vec<PageImage>> {
        let mut images = Vec::new();

        for (name, obj) in self.xobjects(page_id)?.iter() {
            let Ok(obj_ref) = obj.as_reference() else {
                continue;
            };
            let Ok(Object::Stream(stream)) = self.doc.get_object(obj_ref) else {
                continue;
            };
            let dict = &stream.dict;
            if dict.get(b"Subtype").and_then(Object::as_name).ok() != Some(b"Image".as_slice()) {
                continue;
            }

            images.push(PageImage {
                name: String::from_utf8_lossy(name).to_string(),
                object_id: obj_ref,
                format: RasterFormat::from_filter(
                    dict.get(b"Filter").ok().map(|filter| self.resolve(filter)),
                ),
                width: dict
                    .get(b"Width")
                    .and_then(Object::as_i64)
                    .ok()
                    .map(|w| w as u32),
                height: dict
                    .get(b"Height")
                    .and_then(Object::as_i64)
                    .ok()
                    .map(|h| h as u32),
            });
        }

        Ok(images)
    }

    /// Remove an image from a page.
    ///
    /// Every `Do` operation painting the resource is dropped from the page
    /// content and the resource entry is deleted.
    pub fn remove_image(&mut self, page_id: PageId, name: &str) -> Result<()> {
        if !self.xobjects(page_id)?.has(name.as_bytes()) {
            return Err(Error::MissingObject(format!("XObject /{}", name)));
        }

        let content = self.page_content_raw(page_id)?;
        let decoded = Content::decode(&content)?;
        let operations: Vec<Operation> = decoded
            .operations
            .into_iter()
            .filter(|op| !paints_xobject(op, name))
            .collect();
        let encoded = Content { operations }.encode()?;

        let stream_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));
        self.doc
            .get_dictionary_mut(page_id)?
            .set("Contents", Object::Reference(stream_id));

        self.remove_xobject_entry(page_id, name)
    }

    fn remove_xobject_entry(&mut self, page_id: PageId, name: &str) -> Result<()> {
        let (owner, res_obj) = self.resources_entry(page_id)?;

        let xobject_entry = match &res_obj {
            Object::Reference(r) => self.doc.get_dictionary(*r)?.get(b"XObject")?.clone(),
            Object::Dictionary(d) => d.get(b"XObject")?.clone(),
            _ => return Err(Error::Corrupted("Resources is not a dictionary".into())),
        };

        let removed = match xobject_entry {
            Object::Reference(x) => self.doc.get_dictionary_mut(x)?.remove(name.as_bytes()),
            _ => {
                let resources = match res_obj {
                    Object::Reference(r) => self.doc.get_dictionary_mut(r)?,
                    _ => self
                        .doc
                        .get_dictionary_mut(owner)?
                        .get_mut(b"Resources")?
                        .as_dict_mut()?,
                };
                resources
                    .get_mut(b"XObject")?
                    .as_dict_mut()?
                    .remove(name.as_bytes())
            }
        };

        removed
            .map(|_| ())
            .ok_or_else(|| Error::MissingObject(format!("XObject /{}", name)))
    }

    /// Concatenated, decompressed content streams of a page.
    fn page_content_raw(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(obj) => obj,
            Err(_) => return Ok(Vec::new()),
        };

        let refs: Vec<ObjectId> = match self.resolve(contents) {
            Object::Array(arr) => arr.iter().filter_map(|o| o.as_reference().ok()).collect(),
            Object::Stream(_) => match contents {
                Object::Reference(r) => vec![*r],
                _ => Vec::new(),
            },
            _ => return Err(Error::Corrupted("Invalid content stream".into())),
        };

        let mut content = Vec::new();
        for r in refs {
            if let Ok(Object::Stream(s)) = self.doc.get_object(r) {
                let data = s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone());
                content.extend_from_slice(&data);
                content.push(b'\n');
            }
        }
        Ok(content)
    }

    /// Consume the handle, returning the lopdf document.
    pub fn into_inner(self) -> LopdfDocument {
        self.doc
    }
}

fn paints_xobject(op: &Operation, name: &str) -> bool {
    op.operator == "Do"
        && op
            .operands
            .first()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == name.as_bytes())
}

impl PdfBackend for PdfDocument {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_text(&self, page_number: u32) -> Result<String> {
        self.doc
            .extract_text(&[page_number])
            .map_err(|e| Error::PdfParse(format!("Page {}: {}", page_number, e)))
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        self.page_content_raw(page_id)
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}
