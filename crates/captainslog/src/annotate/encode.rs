//! Encoding the annotated canvas with the overlay text embedded.
//!
//! PNG output stores the text in a `Location` text chunk. JPEG has no
//! key/value metadata of its own, so the text goes into a comment segment.

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};

use crate::config::SaveFormat;
use crate::error::Result;

/// Text chunk keyword for the overlay text.
pub const METADATA_KEY: &str = "Location";

/// JPEG marker introducing a comment segment.
const JPEG_COM: [u8; 2] = [0xFF, 0xFE];

/// JPEG segment lengths include their own two length bytes.
const JPEG_MAX_COMMENT: usize = 65_533;

/// Encode `canvas` in `format`, embedding `text` as metadata.
///
/// # Errors
///
/// Returns an error if the encoder rejects the image or the text chunk.
pub fn encode(canvas: &RgbaImage, format: SaveFormat, jpeg_quality: u8, text: &str) -> Result<Vec<u8>> {
    let rgb: RgbImage = canvas.convert();
    match format {
        SaveFormat::Png => encode_png(&rgb, text),
        SaveFormat::Jpeg => encode_jpeg(&rgb, jpeg_quality, text),
    }
}

fn encode_png(rgb: &RgbImage, text: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, rgb.width(), rgb.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Best);
        if is_latin1(text) {
            encoder.add_text_chunk(METADATA_KEY.to_string(), text.to_string())?;
        } else {
            encoder.add_itxt_chunk(METADATA_KEY.to_string(), text.to_string())?;
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(rgb.as_raw())?;
        writer.finish()?;
    }
    Ok(buf)
}

fn encode_jpeg(rgb: &RgbImage, quality: u8, text: &str) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(rgb)?;
    Ok(insert_jpeg_comment(buf, text.as_bytes()))
}

/// `tEXt` chunks only carry ISO 8859-1.
fn is_latin1(text: &str) -> bool {
    text.chars().all(|c| u32::from(c) <= 0xFF)
}

/// Insert a `COM` segment after `SOI` and any leading `APP0` segment.
fn insert_jpeg_comment(mut jpeg: Vec<u8>, comment: &[u8]) -> Vec<u8> {
    if jpeg.len() < 2 || jpeg[..2] != [0xFF, 0xD8] {
        return jpeg;
    }

    let mut at = 2;
    if jpeg.len() >= at + 4 && jpeg[at..at + 2] == [0xFF, 0xE0] {
        let len = usize::from(u16::from_be_bytes([jpeg[at + 2], jpeg[at + 3]]));
        at = (at + 2 + len).min(jpeg.len());
    }

    let comment = &comment[..comment.len().min(JPEG_MAX_COMMENT)];
    let len = u16::try_from(comment.len() + 2).unwrap_or(u16::MAX);

    let mut segment = Vec::with_capacity(comment.len() + 4);
    segment.extend_from_slice(&JPEG_COM);
    segment.extend_from_slice(&len.to_be_bytes());
    segment.extend_from_slice(comment);

    jpeg.splice(at..at, segment);
    jpeg
}
