//! Placeholder backgrounds for categories without an image on disk.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::Result;

pub const PLACEHOLDER_WIDTH: u32 = 800;
pub const PLACEHOLDER_HEIGHT: u32 = 1125;

const FILL: Rgb<u8> = Rgb([200, 200, 200]);
const INK: Rgb<u8> = Rgb([50, 50, 50]);
const CAPTION_ORIGIN: (u32, u32) = (300, 500);

/// Pixel size of one glyph cell.
const GLYPH_SCALE: u32 = 2;
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: usize = 7;

/// Build the placeholder image with `caption` written on it.
pub fn placeholder_image(caption: &str) -> RgbImage {
    let mut img = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, FILL);
    draw_caption(&mut img, caption, CAPTION_ORIGIN);
    img
}

/// Write a placeholder to `path` unless a file is already there.
///
/// The image is encoded into a temporary file next to `path` and renamed
/// into place, so readers never observe a truncated image. Returns whether
/// a file was created.
pub fn materialize(path: &Path, caption: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    let format = ImageFormat::from_path(path)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let img = DynamicImage::ImageRgb8(placeholder_image(caption));
    let mut tmp = tempfile::Builder::new()
        .prefix(".placeholder-")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        img.write_to(&mut writer, format)?;
        writer.flush()?;
    }
    tmp.persist(path)?;

    log::info!("Created placeholder background {}", path.display());
    Ok(true)
}

fn draw_caption(img: &mut RgbImage, caption: &str, origin: (u32, u32)) {
    let advance = (GLYPH_WIDTH + 1) * GLYPH_SCALE;
    let mut x = origin.0;

    for ch in caption.chars() {
        if let Some(rows) = glyph(ch) {
            draw_glyph(img, &rows, x, origin.1);
        }
        x += advance;
        if x + advance > img.width() {
            break;
        }
    }
}

fn draw_glyph(img: &mut RgbImage, rows: &[u8; GLYPH_HEIGHT], x: u32, y: u32) {
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    let px = x + col * GLYPH_SCALE + dx;
                    let py = y + row as u32 * GLYPH_SCALE + dy;
                    if px < img.width() && py < img.height() {
                        img.put_pixel(px, py, INK);
                    }
                }
            }
        }
    }
}

/// 5x7 bitmap for letters and digits; lowercase shares the uppercase shapes.
fn glyph(ch: char) -> Option<[u8; GLYPH_HEIGHT]> {
    let rows = match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_placeholder_dimensions_and_fill() {
        let img = placeholder_image("Default Background");
        assert_eq!(img.dimensions(), (PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT));
        assert_eq!(*img.get_pixel(0, 0), FILL);
        assert_eq!(*img.get_pixel(799, 1124), FILL);
    }

    #[test]
    fn test_caption_is_drawn() {
        let img = placeholder_image("AAY");
        let (x0, y0) = CAPTION_ORIGIN;
        let inked = (x0..x0 + 60)
            .flat_map(|x| (y0..y0 + 14).map(move |y| (x, y)))
            .filter(|&(x, y)| *img.get_pixel(x, y) == INK)
            .count();
        assert!(inked > 0);

        let blank = placeholder_image("");
        assert!(blank.pixels().all(|p| *p == FILL));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("default_bg.jpg");

        assert!(materialize(&path, "Default Background").unwrap());
        let first = fs::read(&path).unwrap();
        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), PLACEHOLDER_WIDTH);
        assert_eq!(decoded.height(), PLACEHOLDER_HEIGHT);

        assert!(!materialize(&path, "Something Else").unwrap());
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_materialize_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aay_card.jpg");
        fs::write(&path, b"operator supplied").unwrap();

        assert!(!materialize(&path, "AAY Background").unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"operator supplied");
    }

    #[test]
    fn test_materialize_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = materialize(&dir.path().join("card.unknown"), "x").err().unwrap();
        assert!(matches!(err, Error::Image(_)));
    }
}
