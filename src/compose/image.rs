//! Embedding background images as image XObjects.

use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, ImageFormat};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;

/// An image XObject added to a destination document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EmbeddedImage {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

/// Zlib-compress a buffer for a `/FlateDecode` stream.
pub(crate) fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Add the image at `path` to `dest`.
///
/// Baseline JPEG files are embedded as-is with `/DCTDecode`; anything else
/// the `image` crate reads is stored as Flate-compressed RGB, with alpha
/// moved into a soft mask.
pub(crate) fn embed_image(dest: &mut Document, path: &Path) -> Result<EmbeddedImage> {
    let data = std::fs::read(path)?;
    let format = image::guess_format(&data)?;

    if format == ImageFormat::Jpeg {
        if let Some(info) = jpeg_info(&data) {
            return Ok(embed_jpeg(dest, data, info));
        }
    }

    let img = image::load_from_memory_with_format(&data, format)?;
    embed_raster(dest, &img)
}

/// Frame header fields of a JPEG file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JpegInfo {
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

/// Read the dimensions and component count from the first SOF marker.
pub(crate) fn jpeg_info(data: &[u8]) -> Option<JpegInfo> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            // fill byte
            pos += 1;
            continue;
        }
        let len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;

        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let seg = data.get(pos + 4..pos + 2 + len)?;
            if seg.len() < 6 {
                return None;
            }
            let height = u16::from_be_bytes([seg[1], seg[2]]) as u32;
            let width = u16::from_be_bytes([seg[3], seg[4]]) as u32;
            let components = seg[5];
            if width == 0 || height == 0 || !matches!(components, 1 | 3 | 4) {
                return None;
            }
            return Some(JpegInfo {
                width,
                height,
                components,
            });
        }
        pos += 2 + len;
    }
    None
}

fn embed_jpeg(dest: &mut Document, data: Vec<u8>, info: JpegInfo) -> EmbeddedImage {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => info.width as i64,
        "Height" => info.height as i64,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    match info.components {
        1 => {
            dict.set("ColorSpace", "DeviceGray");
        }
        4 => {
            // Adobe CMYK JPEGs store inverted samples.
            dict.set("ColorSpace", "DeviceCMYK");
            let decode = [1, 0, 1, 0, 1, 0, 1, 0].map(Object::Integer);
            dict.set("Decode", Object::Array(decode.to_vec()));
        }
        _ => {
            dict.set("ColorSpace", "DeviceRGB");
        }
    }

    let stream = Stream::new(dict, data).with_compression(false);
    let id = dest.add_object(stream);

    EmbeddedImage {
        id,
        width: info.width,
        height: info.height,
    }
}

fn embed_raster(dest: &mut Document, img: &DynamicImage) -> Result<EmbeddedImage> {
    let (width, height) = (img.width(), img.height());

    let smask = if img.color().has_alpha() {
        let alpha: Vec<u8> = img.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&alpha)?,
        );
        Some(dest.add_object(mask))
    } else {
        None
    };

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    if let Some(mask_id) = smask {
        dict.set("SMask", Object::Reference(mask_id));
    }

    let samples = img.to_rgb8().into_raw();
    let id = dest.add_object(Stream::new(dict, deflate(&samples)?));

    Ok(EmbeddedImage { id, width, height })
}
