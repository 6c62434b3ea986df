//! Raster resources embedded in a page.

use serde::{Deserialize, Serialize};

/// Format an embedded image is stored (and would be extracted) as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// Raw or Flate/LZW/RunLength-compressed samples, extracted as PNG
    Png,
    /// DCTDecode
    Jpeg,
    /// JPXDecode (JPEG 2000)
    Jpx,
    /// JBIG2Decode
    Jbig2,
    /// CCITTFaxDecode
    Ccitt,
}

impl RasterFormat {
    /// Determine the format from an image stream's `/Filter` entry.
    ///
    /// For a filter chain the last image codec wins, since that is what
    /// remains once the generic decoders have been applied.
    pub fn from_filter(filter: Option<&lopdf::Object>) -> Self {
        let names: Vec<&[u8]> = match filter {
            Some(lopdf::Object::Name(n)) => vec![n.as_slice()],
            Some(lopdf::Object::Array(arr)) => {
                arr.iter().filter_map(|o| o.as_name().ok()).collect()
            }
            _ => Vec::new(),
        };

        names
            .iter()
            .rev()
            .find_map(|name| Self::from_codec(name))
            .unwrap_or(RasterFormat::Png)
    }

    fn from_codec(name: &[u8]) -> Option<Self> {
        match name {
            b"DCTDecode" | b"DCT" => Some(RasterFormat::Jpeg),
            b"JPXDecode" => Some(RasterFormat::Jpx),
            b"JBIG2Decode" => Some(RasterFormat::Jbig2),
            b"CCITTFaxDecode" | b"CCF" => Some(RasterFormat::Ccitt),
            _ => None,
        }
    }

    /// Usual file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpeg",
            RasterFormat::Jpx => "jpx",
            RasterFormat::Jbig2 => "jb2",
            RasterFormat::Ccitt => "tiff",
        }
    }
}

/// An image XObject referenced from a page's resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    /// Resource name under `/Resources /XObject`
    pub name: String,
    /// Object the resource points at
    pub object_id: (u32, u16),
    pub format: RasterFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
}
