use chrono::Utc;
use exif::{Field, In, Value};

use crate::image_decoder::{self, DecodedImage};
use crate::metadata_types::{clean_text, ExifValue, MetadataRecord};

/// One uploaded file as received from the HTTP layer: raw bytes plus the
/// client-declared attributes. Held only for the duration of a request.
pub struct UploadedFile {
    pub name: String,
    pub declared_type: String,
    pub bytes: Vec<u8>,
}

pub struct MetadataExtractor;

impl MetadataExtractor {
    /// File-level metadata: four fixed fields. Missing attributes render
    /// as empty strings; this never fails.
    pub fn extract_file_metadata(upload: &UploadedFile) -> MetadataRecord {
        let mut record = MetadataRecord::new();
        record.push("File Name", upload.name.clone());
        record.push(
            "File Size",
            format!("{:.2} KB", upload.bytes.len() as f64 / 1024.0),
        );
        record.push("File Type", upload.declared_type.clone());
        // The upload lives only in memory, so the receipt time is the one
        // honest timestamp available for it.
        record.push(
            "Uploaded At",
            Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        record
    }

    /// Basic image properties: exactly five fields, pure formatting over
    /// the decoded raster.
    pub fn extract_image_properties(decoded: &DecodedImage) -> MetadataRecord {
        let mut record = MetadataRecord::new();
        record.push("Image Format", image_decoder::format_label(decoded.format));
        record.push(
            "Image Mode",
            image_decoder::mode_label(decoded.image.color()),
        );
        record.push(
            "Image Size",
            format!("{} x {} pixels", decoded.width, decoded.height),
        );
        record.push(
            "Color Depth",
            match image_decoder::bit_depth(decoded.image.color()) {
                Some(bits) => format!("{} bits", bits),
                None => "N/A".to_string(),
            },
        );
        record.push(
            "DPI",
            match decoded.dpi {
                Some((x, y)) => format!("{} x {}", x, y),
                None => "N/A".to_string(),
            },
        );
        record
    }

    /// All EXIF tags of the primary image, by human-readable tag name.
    /// An image without an EXIF block yields an empty record, not an
    /// error; a tag seen twice keeps its first occurrence.
    pub fn extract_exif_data(decoded: &DecodedImage) -> MetadataRecord {
        let mut record = MetadataRecord::new();
        let Some(exif) = &decoded.exif else {
            return record;
        };

        for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
            let name = Self::field_name(field);
            if record.contains(&name) {
                continue;
            }
            record.push(name, Self::decode_value(field).render());
        }
        record
    }

    /// The format-specific info fields as a record. The caller filters
    /// out keys already present in the EXIF record before display.
    pub fn extract_additional_info(decoded: &DecodedImage) -> MetadataRecord {
        decoded.info.clone()
    }

    /// Tag name from the standard EXIF table; unregistered tags pass
    /// through as their numeric id.
    fn field_name(field: &Field) -> String {
        if field.tag.description().is_some() {
            field.tag.to_string()
        } else {
            field.tag.number().to_string()
        }
    }

    /// Reduce the library's value enum to the variants that need distinct
    /// rendering: byte strings, single rationals, everything else via the
    /// library's own formatting.
    fn decode_value(field: &Field) -> ExifValue {
        match &field.value {
            Value::Byte(bytes) => ExifValue::Bytes(bytes.clone()),
            Value::Undefined(bytes, _) => ExifValue::Bytes(bytes.clone()),
            Value::Ascii(lines) => {
                let mut joined = Vec::new();
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        joined.extend_from_slice(b", ");
                    }
                    joined.extend_from_slice(line);
                }
                ExifValue::Bytes(joined)
            }
            Value::Rational(v) if v.len() == 1 => ExifValue::Rational {
                num: v[0].num as i64,
                denom: v[0].denom as i64,
            },
            Value::SRational(v) if v.len() == 1 => ExifValue::Rational {
                num: v[0].num as i64,
                denom: v[0].denom as i64,
            },
            _ => ExifValue::Scalar(clean_text(&field.display_value().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Context, Rational, Tag};
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn decode_png() -> DecodedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, image::Rgb([1, 2, 3])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        crate::image_decoder::decode_image(&buf, 10_000).unwrap()
    }

    fn ascii_field(tag: Tag, text: &[u8]) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![text.to_vec()]),
        }
    }

    #[test]
    fn test_file_metadata_has_four_fields() {
        let upload = UploadedFile {
            name: "photo.jpg".to_string(),
            declared_type: "image/jpeg".to_string(),
            bytes: vec![0; 2048],
        };
        let record = MetadataExtractor::extract_file_metadata(&upload);

        assert_eq!(record.len(), 4);
        assert_eq!(record.get("File Name"), Some("photo.jpg"));
        assert_eq!(record.get("File Size"), Some("2.00 KB"));
        assert_eq!(record.get("File Type"), Some("image/jpeg"));
        assert!(record.contains("Uploaded At"));
    }

    #[test]
    fn test_file_metadata_tolerates_missing_attributes() {
        let upload = UploadedFile {
            name: String::new(),
            declared_type: String::new(),
            bytes: Vec::new(),
        };
        let record = MetadataExtractor::extract_file_metadata(&upload);

        assert_eq!(record.len(), 4);
        assert_eq!(record.get("File Name"), Some(""));
        assert_eq!(record.get("File Size"), Some("0.00 KB"));
    }

    #[test]
    fn test_image_properties_has_exactly_five_fields() {
        let record = MetadataExtractor::extract_image_properties(&decode_png());

        assert_eq!(record.len(), 5);
        assert_eq!(record.get("Image Format"), Some("PNG"));
        assert_eq!(record.get("Image Mode"), Some("RGB"));
        assert_eq!(record.get("Image Size"), Some("4 x 2 pixels"));
        assert_eq!(record.get("Color Depth"), Some("8 bits"));
        assert_eq!(record.get("DPI"), Some("N/A"));
    }

    #[test]
    fn test_exif_data_empty_without_exif_block() {
        let record = MetadataExtractor::extract_exif_data(&decode_png());
        assert!(record.is_empty());
    }

    #[test]
    fn test_exif_data_from_raw_block() {
        let make = ascii_field(Tag::Make, b"Acme");
        let exposure = Field {
            tag: Tag::ExposureTime,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num: 1, denom: 200 }]),
        };
        let mut writer = Writer::new();
        writer.push_field(&make);
        writer.push_field(&exposure);
        let mut cursor = Cursor::new(Vec::new());
        writer.write(&mut cursor, false).unwrap();
        let exif = exif::Reader::new().read_raw(cursor.into_inner()).unwrap();

        let mut decoded = decode_png();
        decoded.exif = Some(exif);
        let record = MetadataExtractor::extract_exif_data(&decoded);

        assert_eq!(record.get("Make"), Some("Acme"));
        assert_eq!(record.get("ExposureTime"), Some("1/200"));
    }

    #[test]
    fn test_field_name_resolves_known_tags() {
        let field = ascii_field(Tag::Make, b"Acme");
        assert_eq!(MetadataExtractor::field_name(&field), "Make");
    }

    #[test]
    fn test_field_name_falls_back_to_numeric_id() {
        let field = ascii_field(Tag(Context::Tiff, 65000), b"vendor");
        assert_eq!(MetadataExtractor::field_name(&field), "65000");
    }

    #[test]
    fn test_decode_single_rational_keeps_exact_pair() {
        let field = Field {
            tag: Tag::ExposureTime,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num: 1, denom: 200 }]),
        };
        assert_eq!(MetadataExtractor::decode_value(&field).render(), "1/200");
    }

    #[test]
    fn test_decode_invalid_utf8_bytes_as_hex() {
        let field = Field {
            tag: Tag::MakerNote,
            ifd_num: In::PRIMARY,
            value: Value::Undefined(vec![0xFF, 0xFE], 0),
        };
        assert_eq!(MetadataExtractor::decode_value(&field).render(), "fffe");
    }

    #[test]
    fn test_decode_ascii_as_text() {
        let field = ascii_field(Tag::Software, b"darktable 4.6");
        assert_eq!(
            MetadataExtractor::decode_value(&field).render(),
            "darktable 4.6"
        );
    }

    #[test]
    fn test_decode_short_via_library_formatting() {
        let field = Field {
            tag: Tag::PhotographicSensitivity,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![200]),
        };
        assert_eq!(MetadataExtractor::decode_value(&field).render(), "200");
    }

    #[test]
    fn test_additional_info_mirrors_container_fields() {
        let decoded = decode_png();
        let record = MetadataExtractor::extract_additional_info(&decoded);
        assert_eq!(record.len(), decoded.info.len());
    }
}
