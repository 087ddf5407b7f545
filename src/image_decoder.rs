use std::io::Cursor;

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, ImageReader};
use log::debug;

use crate::format_info;
use crate::metadata_types::MetadataRecord;

/// Decode-time failures. These are unrecoverable for the request and
/// surface to the client as a single descriptive error.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Cannot read image data: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("Unrecognized image format (expected JPEG, PNG, TIFF, BMP, GIF or WEBP)")]
    UnknownFormat,
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image dimensions {width}x{height} exceed the {max_dimension} pixel limit")]
    TooLarge {
        width: u32,
        height: u32,
        max_dimension: u32,
    },
}

/// An image decoded from an in-memory upload, together with everything
/// the metadata extractors need: the raster, the detected format, the
/// format-specific info fields and the parsed EXIF block when present.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    /// DPI from the container (JFIF density or PNG pHYs), when declared.
    pub dpi: Option<(u32, u32)>,
    /// Format-specific info fields, distinct from EXIF.
    pub info: MetadataRecord,
    pub exif: Option<exif::Exif>,
}

/// Decode raw upload bytes into a `DecodedImage`.
///
/// The format is detected from the content, never from the filename. A
/// missing or unparseable EXIF block is not an error; EXIF failures are
/// logged and the image decodes without it.
pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<DecodedImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
    let image = reader.decode()?;

    let (width, height) = image.dimensions();
    if width > max_dimension || height > max_dimension {
        return Err(DecodeError::TooLarge {
            width,
            height,
            max_dimension,
        });
    }

    let container_info = format_info::extract(bytes, format);

    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => Some(exif),
        Err(e) => {
            debug!("No usable EXIF block: {}", e);
            None
        }
    };

    Ok(DecodedImage {
        image,
        format,
        width,
        height,
        dpi: container_info.dpi,
        info: container_info.fields,
        exif,
    })
}

/// Uppercase format label, matching the names the accepted-format list
/// advertises.
pub fn format_label(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Png => "PNG",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WEBP",
        _ => "UNKNOWN",
    }
}

/// Color mode label in the conventional short form (L, RGB, RGBA, ...).
pub fn mode_label(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "L;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;32F",
        ColorType::Rgba32F => "RGBA;32F",
        _ => "Unknown",
    }
}

/// Bits per sample for the decoded raster.
pub fn bit_depth(color: ColorType) -> Option<u16> {
    let channels = color.channel_count() as u16;
    if channels == 0 {
        return None;
    }
    Some(color.bits_per_pixel() / channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    #[test]
    fn test_decode_all_accepted_formats() {
        for format in [
            ImageFormat::Jpeg,
            ImageFormat::Png,
            ImageFormat::Tiff,
            ImageFormat::Bmp,
            ImageFormat::Gif,
            ImageFormat::WebP,
        ] {
            let bytes = encode(format);
            let decoded = decode_image(&bytes, 10_000).unwrap();
            assert_eq!(decoded.format, format);
            assert_eq!((decoded.width, decoded.height), (4, 2));
        }
    }

    #[test]
    fn test_decode_detects_format_from_content() {
        // PNG bytes decode as PNG regardless of what the client claims
        let bytes = encode(ImageFormat::Png);
        let decoded = decode_image(&bytes, 10_000).unwrap();
        assert_eq!(decoded.format, ImageFormat::Png);
    }

    #[test]
    fn test_decode_rejects_non_image_bytes() {
        let result = decode_image(b"definitely not an image", 10_000);
        assert!(matches!(result, Err(DecodeError::UnknownFormat)));
    }

    #[test]
    fn test_decode_rejects_oversized_image() {
        let bytes = encode(ImageFormat::Png);
        let result = decode_image(&bytes, 2);
        assert!(matches!(result, Err(DecodeError::TooLarge { width: 4, .. })));
    }

    #[test]
    fn test_decode_without_exif_yields_none() {
        let bytes = encode(ImageFormat::Png);
        let decoded = decode_image(&bytes, 10_000).unwrap();
        assert!(decoded.exif.is_none());
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(ImageFormat::Jpeg), "JPEG");
        assert_eq!(format_label(ImageFormat::WebP), "WEBP");
        assert_eq!(format_label(ImageFormat::Ico), "UNKNOWN");
    }

    #[test]
    fn test_mode_label_and_bit_depth() {
        assert_eq!(mode_label(ColorType::Rgb8), "RGB");
        assert_eq!(mode_label(ColorType::La16), "LA;16");
        assert_eq!(bit_depth(ColorType::Rgb8), Some(8));
        assert_eq!(bit_depth(ColorType::Rgba16), Some(16));
    }
}
