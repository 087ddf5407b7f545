use serde::Serialize;

/// A single display-ready metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

/// An ordered name -> value mapping. Insertion order is preserved and
/// survives serialization (the record is serialized as a JSON array).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MetadataRecord {
    fields: Vec<MetadataField>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(MetadataField {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataField> {
        self.fields.iter()
    }
}

/// A decoded EXIF (or info-mapping) value, reduced to the handful of
/// shapes that need distinct rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    /// Raw byte string; rendered as UTF-8 text or lowercase hex.
    Bytes(Vec<u8>),
    /// Exact numerator/denominator pair; never reduced to a float.
    Rational { num: i64, denom: i64 },
    /// Anything else, pre-formatted by the EXIF library.
    Scalar(String),
}

impl ExifValue {
    /// Render the value as a display string.
    pub fn render(&self) -> String {
        match self {
            ExifValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => clean_text(text),
                Err(_) => hex_string(bytes),
            },
            ExifValue::Rational { num, denom } => format!("{}/{}", num, denom),
            ExifValue::Scalar(value) => value.clone(),
        }
    }
}

/// Strip null padding, surrounding quotes and whitespace from textual
/// EXIF values. Cameras pad fixed-size ASCII fields with trailing nulls.
pub fn clean_text(value: &str) -> String {
    value
        .replace('\0', "")
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}

/// Lowercase hex encoding for byte values that are not valid UTF-8.
pub fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_insertion_order() {
        let mut record = MetadataRecord::new();
        record.push("Image Format", "PNG");
        record.push("Image Mode", "RGB");
        record.push("DPI", "N/A");

        let names: Vec<&str> = record.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Image Format", "Image Mode", "DPI"]);
    }

    #[test]
    fn test_record_contains_and_get() {
        let mut record = MetadataRecord::new();
        record.push("Make", "Acme");

        assert!(record.contains("Make"));
        assert!(!record.contains("Model"));
        assert_eq!(record.get("Make"), Some("Acme"));
        assert_eq!(record.get("Model"), None);
    }

    #[test]
    fn test_record_serializes_as_array() {
        let mut record = MetadataRecord::new();
        record.push("File Name", "photo.jpg");

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"[{"name":"File Name","value":"photo.jpg"}]"#);
    }

    #[test]
    fn test_bytes_render_as_utf8() {
        let value = ExifValue::Bytes(b"Acme Corp\0\0".to_vec());
        assert_eq!(value.render(), "Acme Corp");
    }

    #[test]
    fn test_invalid_utf8_renders_as_lowercase_hex() {
        let value = ExifValue::Bytes(vec![0xFF, 0xFE]);
        assert_eq!(value.render(), "fffe");
    }

    #[test]
    fn test_rational_renders_exactly() {
        let value = ExifValue::Rational { num: 1, denom: 200 };
        assert_eq!(value.render(), "1/200");
    }

    #[test]
    fn test_rational_is_not_reduced() {
        let value = ExifValue::Rational { num: 10, denom: 2000 };
        assert_eq!(value.render(), "10/2000");
    }

    #[test]
    fn test_scalar_passes_through() {
        let value = ExifValue::Scalar("6".to_string());
        assert_eq!(value.render(), "6");
    }
}
