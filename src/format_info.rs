//! Format-specific info fields read from the image container itself:
//! JFIF density, embedded comments, PNG ancillary chunks. These are the
//! decoder-level counterpart to EXIF and are reported separately.

use image::ImageFormat;
use img_parts::jpeg::{markers, Jpeg};
use img_parts::png::Png;
use img_parts::{Bytes, ImageICC};
use log::debug;

use crate::metadata_types::{hex_string, MetadataRecord};

/// Info fields plus the DPI declared by the container, if any.
#[derive(Debug, Default)]
pub struct FormatInfo {
    pub fields: MetadataRecord,
    pub dpi: Option<(u32, u32)>,
}

/// Walk the container segments of an already-validated image. Never
/// fails; anything unparseable just yields fewer fields.
pub fn extract(bytes: &[u8], format: ImageFormat) -> FormatInfo {
    match format {
        ImageFormat::Jpeg => extract_jpeg(bytes),
        ImageFormat::Png => extract_png(bytes),
        _ => FormatInfo::default(),
    }
}

fn extract_jpeg(bytes: &[u8]) -> FormatInfo {
    let mut info = FormatInfo::default();

    let jpeg = match Jpeg::from_bytes(Bytes::copy_from_slice(bytes)) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            debug!("Cannot walk JPEG segments: {}", e);
            return info;
        }
    };

    for segment in jpeg.segments() {
        match segment.marker() {
            markers::APP0 => {
                if let Some(jfif) = parse_jfif(segment.contents()) {
                    info.fields.push(
                        "jfif_version",
                        format!("{}.{}", jfif.version.0, jfif.version.1),
                    );
                    info.fields.push("jfif_unit", jfif.unit.to_string());
                    info.fields
                        .push("jfif_density", format!("{} x {}", jfif.x_density, jfif.y_density));
                    info.dpi = jfif.dpi();
                }
            }
            markers::COM => {
                info.fields.push("comment", text_or_hex(segment.contents()));
            }
            _ => {}
        }
    }

    if let Some(icc) = jpeg.icc_profile() {
        info.fields.push("icc_profile", format!("{} bytes", icc.len()));
    }

    push_dpi_field(&mut info);
    info
}

fn extract_png(bytes: &[u8]) -> FormatInfo {
    let mut info = FormatInfo::default();

    let png = match Png::from_bytes(Bytes::copy_from_slice(bytes)) {
        Ok(png) => png,
        Err(e) => {
            debug!("Cannot walk PNG chunks: {}", e);
            return info;
        }
    };

    for chunk in png.chunks() {
        match &chunk.kind() {
            b"pHYs" => {
                info.dpi = parse_phys(chunk.contents());
            }
            b"gAMA" => {
                if let Some(gamma) = parse_gama(chunk.contents()) {
                    info.fields.push("gamma", gamma.to_string());
                }
            }
            b"sRGB" => {
                if let Some(intent) = chunk.contents().first() {
                    info.fields.push("srgb", intent.to_string());
                }
            }
            b"tEXt" => {
                if let Some((keyword, value)) = parse_text_chunk(chunk.contents()) {
                    info.fields.push(keyword, value);
                }
            }
            _ => {}
        }
    }

    if let Some(icc) = png.icc_profile() {
        info.fields.push("icc_profile", format!("{} bytes", icc.len()));
    }

    push_dpi_field(&mut info);
    info
}

fn push_dpi_field(info: &mut FormatInfo) {
    if let Some((x, y)) = info.dpi {
        info.fields.push("dpi", format!("{} x {}", x, y));
    }
}

struct JfifHeader {
    version: (u8, u8),
    unit: u8,
    x_density: u16,
    y_density: u16,
}

impl JfifHeader {
    /// Density as DPI: unit 1 is dots per inch, unit 2 dots per cm.
    fn dpi(&self) -> Option<(u32, u32)> {
        match self.unit {
            1 => Some((self.x_density as u32, self.y_density as u32)),
            2 => Some((
                (self.x_density as f64 * 2.54).round() as u32,
                (self.y_density as f64 * 2.54).round() as u32,
            )),
            _ => None,
        }
    }
}

fn parse_jfif(contents: &[u8]) -> Option<JfifHeader> {
    if contents.len() < 12 || &contents[..5] != b"JFIF\0" {
        return None;
    }
    Some(JfifHeader {
        version: (contents[5], contents[6]),
        unit: contents[7],
        x_density: u16::from_be_bytes([contents[8], contents[9]]),
        y_density: u16::from_be_bytes([contents[10], contents[11]]),
    })
}

/// pHYs declares pixels per unit; unit 1 is the metre.
fn parse_phys(contents: &[u8]) -> Option<(u32, u32)> {
    if contents.len() < 9 || contents[8] != 1 {
        return None;
    }
    let x = u32::from_be_bytes([contents[0], contents[1], contents[2], contents[3]]);
    let y = u32::from_be_bytes([contents[4], contents[5], contents[6], contents[7]]);
    let to_dpi = |ppm: u32| (ppm as f64 * 0.0254).round() as u32;
    Some((to_dpi(x), to_dpi(y)))
}

fn parse_gama(contents: &[u8]) -> Option<f64> {
    if contents.len() < 4 {
        return None;
    }
    let raw = u32::from_be_bytes([contents[0], contents[1], contents[2], contents[3]]);
    Some(raw as f64 / 100_000.0)
}

/// tEXt is a latin-1 keyword, a null separator and the text payload.
fn parse_text_chunk(contents: &[u8]) -> Option<(String, String)> {
    let split = contents.iter().position(|&b| b == 0)?;
    let keyword = text_or_hex(&contents[..split]);
    let value = text_or_hex(&contents[split + 1..]);
    if keyword.is_empty() {
        return None;
    }
    Some((keyword, value))
}

fn text_or_hex(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_matches('\0').trim().to_string(),
        Err(_) => hex_string(bytes),
    }
}
