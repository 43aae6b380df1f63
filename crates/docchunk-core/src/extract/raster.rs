//! Image XObject decoding.
//!
//! Streams whose encoding is already a complete image file (JPEG, JPEG 2000,
//! JBIG2) are handed over byte for byte. Raw or Flate-compressed samples have
//! no file format of their own and are wrapped into PNG.

use flate2::read::ZlibDecoder;
use lopdf::{Document, Object, Stream};
use std::io::{Cursor, Read};

/// Filters whose output is a self-contained image file, with its extension
const PASSTHROUGH_FILTERS: &[(&str, &str)] = &[
    ("DCTDecode", "jpeg"),
    ("JPXDecode", "jpx"),
    ("JBIG2Decode", "jb2"),
];

/// Decode an image XObject into file bytes and an extension.
pub(crate) fn decode_image(doc: &Document, stream: &Stream) -> Result<(Vec<u8>, String), String> {
    let filters = stream_filters(stream)?;

    if let Some((last, leading)) = filters.split_last() {
        if let Some((_, ext)) = PASSTHROUGH_FILTERS.iter().find(|(f, _)| *f == last.as_str()) {
            let bytes = apply_filters(stream, leading)?;
            return Ok((bytes, (*ext).to_string()));
        }
    }

    let samples = apply_filters(stream, &filters)?;
    let png = encode_png(doc, stream, samples)?;
    Ok((png, "png".to_string()))
}

fn stream_filters(stream: &Stream) -> Result<Vec<String>, String> {
    let filter = match stream.dict.get(b"Filter") {
        Ok(filter) => filter,
        Err(_) => return Ok(Vec::new()),
    };

    match filter {
        Object::Name(name) => Ok(vec![String::from_utf8_lossy(name).to_string()]),
        Object::Array(items) => items
            .iter()
            .map(|item| {
                item.as_name()
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .map_err(|e| format!("malformed filter entry: {e}"))
            })
            .collect(),
        _ => Err("malformed Filter entry".to_string()),
    }
}

/// Undo transport filters; only Flate without predictors is supported
fn apply_filters(stream: &Stream, filters: &[String]) -> Result<Vec<u8>, String> {
    let mut data = stream.content.clone();
    for filter in filters {
        match filter.as_str() {
            "FlateDecode" | "Fl" => {
                if has_predictor(stream) {
                    return Err("Flate predictors are not supported".to_string());
                }
                data = inflate(&data)?;
            }
            other => return Err(format!("unsupported image filter {other}")),
        }
    }
    Ok(data)
}

fn has_predictor(stream: &Stream) -> bool {
    stream
        .dict
        .get(b"DecodeParms")
        .and_then(Object::as_dict)
        .and_then(|parms| parms.get(b"Predictor"))
        .and_then(Object::as_i64)
        .map(|predictor| predictor > 1)
        .unwrap_or(false)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, String> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| format!("decompression failed: {e}"))?;
    Ok(decompressed)
}

fn dimension(stream: &Stream, key: &[u8]) -> Result<u32, String> {
    let value = stream
        .dict
        .get(key)
        .and_then(Object::as_i64)
        .map_err(|_| format!("missing {}", String::from_utf8_lossy(key)))?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| format!("invalid {} {}", String::from_utf8_lossy(key), value))
}

/// Number of colour components for the image's colour space
fn color_components(doc: &Document, stream: &Stream) -> Result<u8, String> {
    let color_space = stream
        .dict
        .get(b"ColorSpace")
        .map_err(|_| "missing ColorSpace".to_string())?;
    let color_space = super::pdf::resolve(doc, color_space)
        .map_err(|e| format!("unresolvable ColorSpace: {e}"))?;

    match color_space {
        Object::Name(name) => components_for_name(name),
        Object::Array(items) => {
            let family = items
                .first()
                .and_then(|o| o.as_name().ok())
                .ok_or_else(|| "empty ColorSpace array".to_string())?;
            match family {
                b"ICCBased" => {
                    let profile = items
                        .get(1)
                        .ok_or_else(|| "ICCBased without profile".to_string())?;
                    let profile = super::pdf::resolve(doc, profile)
                        .map_err(|e| format!("unresolvable ICC profile: {e}"))?;
                    let n = profile
                        .as_stream()
                        .ok()
                        .and_then(|s| s.dict.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok())
                        .ok_or_else(|| "ICC profile without N".to_string())?;
                    match n {
                        1 | 3 | 4 => Ok(n as u8),
                        other => Err(format!("unsupported ICC component count {other}")),
                    }
                }
                other => components_for_name(other),
            }
        }
        _ => Err("malformed ColorSpace".to_string()),
    }
}

fn components_for_name(name: &[u8]) -> Result<u8, String> {
    match name {
        b"DeviceGray" | b"CalGray" | b"G" => Ok(1),
        b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(3),
        b"DeviceCMYK" | b"CMYK" => Ok(4),
        other => Err(format!(
            "unsupported colour space {}",
            String::from_utf8_lossy(other)
        )),
    }
}

fn encode_png(doc: &Document, stream: &Stream, mut samples: Vec<u8>) -> Result<Vec<u8>, String> {
    let is_mask = stream
        .dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    if is_mask {
        return Err("stencil masks are not supported".to_string());
    }

    let bits = stream
        .dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .unwrap_or(8);
    if bits != 8 {
        return Err(format!("unsupported bit depth {bits}"));
    }

    let width = dimension(stream, b"Width")?;
    let height = dimension(stream, b"Height")?;
    let components = color_components(doc, stream)?;

    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(components as usize))
        .ok_or_else(|| {
            format!(
                "image dimensions overflow: {}x{}x{}",
                width, height, components
            )
        })?;
    if samples.len() < expected {
        return Err(format!(
            "sample data too short: {} bytes for {}x{}x{}",
            samples.len(),
            width,
            height,
            components
        ));
    }
    samples.truncate(expected);

    let img = match components {
        1 => ::image::GrayImage::from_raw(width, height, samples)
            .map(::image::DynamicImage::ImageLuma8),
        3 => ::image::RgbImage::from_raw(width, height, samples)
            .map(::image::DynamicImage::ImageRgb8),
        _ => ::image::RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
            .map(::image::DynamicImage::ImageRgb8),
    }
    .ok_or_else(|| "failed to create image from raw data".to_string())?;

    let mut png_data = Vec::new();
    img.write_to(&mut Cursor::new(&mut png_data), ::image::ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {e}"))?;
    Ok(png_data)
}

/// Convert CMYK bytes to RGB.
#[allow(clippy::many_single_char_names)]
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for px in cmyk.chunks_exact(4) {
        let k = 1.0 - f32::from(px[3]) / 255.0;
        for c in &px[..3] {
            let v = 255.0 * (1.0 - f32::from(*c) / 255.0) * k;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            rgb.push(v.round() as u8);
        }
    }
    rgb
}
