use serde::Serialize;

use crate::metadata_types::{MetadataField, MetadataRecord};

/// Presentation grouping for the EXIF record. Tags are assigned to the
/// first category whose member list names them; everything else lands in
/// Other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Camera,
    Capture,
    Image,
    Location,
    Other,
}

const CAMERA_TAGS: &[&str] = &["Make", "Model", "Software", "LensMake", "LensModel"];

// EXIF 2.3 renamed ISOSpeedRatings to PhotographicSensitivity; the tag
// table reports the new name, so both belong to Capture.
const CAPTURE_TAGS: &[&str] = &[
    "DateTimeOriginal",
    "ExposureTime",
    "FNumber",
    "ISOSpeedRatings",
    "PhotographicSensitivity",
    "FocalLength",
    "ExposureProgram",
    "Flash",
];

const IMAGE_TAGS: &[&str] = &[
    "ImageWidth",
    "ImageLength",
    "BitsPerSample",
    "Compression",
    "PhotometricInterpretation",
    "Orientation",
];

const LOCATION_TAGS: &[&str] = &["GPSInfo", "GPSLatitude", "GPSLongitude", "GPSAltitude"];

impl Category {
    /// The fixed display order.
    pub const ALL: [Category; 5] = [
        Category::Camera,
        Category::Capture,
        Category::Image,
        Category::Location,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Camera => "Camera",
            Category::Capture => "Capture",
            Category::Image => "Image",
            Category::Location => "Location",
            Category::Other => "Other",
        }
    }

    /// First-match-wins over the member lists in display order.
    pub fn for_tag(name: &str) -> Category {
        if CAMERA_TAGS.contains(&name) {
            Category::Camera
        } else if CAPTURE_TAGS.contains(&name) {
            Category::Capture
        } else if IMAGE_TAGS.contains(&name) {
            Category::Image
        } else if LOCATION_TAGS.contains(&name) {
            Category::Location
        } else {
            Category::Other
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One category with the tags that fell into it. Groups with no fields
/// are still emitted; the UI renders them as "No data available".
#[derive(Debug, Serialize)]
pub struct CategoryGroup {
    pub name: &'static str,
    pub fields: Vec<MetadataField>,
}

/// Group an EXIF record into the five fixed categories, preserving tag
/// order within each group.
pub fn categorize(record: &MetadataRecord) -> Vec<CategoryGroup> {
    Category::ALL
        .iter()
        .map(|category| CategoryGroup {
            name: category.as_str(),
            fields: record
                .iter()
                .filter(|f| Category::for_tag(&f.name) == *category)
                .cloned()
                .collect(),
        })
        .collect()
}
