use futures_util::TryStreamExt;
use log::{debug, info};
use serde::Serialize;
use warp::multipart::{FormData, Part};
use warp::{reject, Buf, Filter, Rejection, Reply};

use crate::categorizer::{categorize, CategoryGroup};
use crate::config::Config;
use crate::image_decoder::decode_image;
use crate::metadata_extractor::{MetadataExtractor, UploadedFile};
use crate::metadata_types::MetadataRecord;
use crate::warp_helpers::{with_config, DecodeFailure, ValidationError};

#[derive(Debug, Serialize)]
pub struct ExifSection {
    pub found: bool,
    pub categories: Vec<CategoryGroup>,
}

#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub file: MetadataRecord,
    pub image: MetadataRecord,
    pub exif: ExifSection,
    pub additional: MetadataRecord,
}

/// Inspect one uploaded image: decode it, run the extractors and return
/// the grouped metadata document. Decode failures map to a 400 with the
/// cause; EXIF problems never fail the request.
pub async fn inspect_upload(form: FormData, config: Config) -> Result<impl Reply, Rejection> {
    let upload = read_file_part(form).await?;
    debug!(
        "Inspecting upload {:?} ({} bytes, declared {:?})",
        upload.name,
        upload.bytes.len(),
        upload.declared_type
    );

    let decoded = decode_image(&upload.bytes, config.max_image_dimension).map_err(|e| {
        info!("Rejecting upload {:?}: {}", upload.name, e);
        reject::custom(DecodeFailure {
            message: e.to_string(),
        })
    })?;

    let file = MetadataExtractor::extract_file_metadata(&upload);
    let image = MetadataExtractor::extract_image_properties(&decoded);
    let exif = MetadataExtractor::extract_exif_data(&decoded);
    let additional =
        filter_additional(MetadataExtractor::extract_additional_info(&decoded), &exif);

    info!(
        "Inspected {:?}: {} EXIF tags, {} additional fields",
        upload.name,
        exif.len(),
        additional.len()
    );

    let response = MetadataResponse {
        file,
        image,
        exif: ExifSection {
            found: !exif.is_empty(),
            categories: categorize(&exif),
        },
        additional,
    };
    Ok(warp::reply::json(&response))
}

/// Info fields whose key already appears in the EXIF record are dropped
/// so the two sections never show the same entry twice.
fn filter_additional(info: MetadataRecord, exif: &MetadataRecord) -> MetadataRecord {
    let mut record = MetadataRecord::new();
    for field in info.iter() {
        if !exif.contains(&field.name) {
            record.push(field.name.clone(), field.value.clone());
        }
    }
    record
}

async fn read_file_part(mut form: FormData) -> Result<UploadedFile, Rejection> {
    while let Some(part) = form.try_next().await.map_err(|e| {
        reject::custom(ValidationError {
            message: format!("Invalid multipart form: {}", e),
        })
    })? {
        if part.name() != "file" {
            continue;
        }
        let name = part.filename().unwrap_or_default().to_string();
        let declared_type = part.content_type().unwrap_or_default().to_string();
        let bytes = collect_part_bytes(part).await?;
        return Ok(UploadedFile {
            name,
            declared_type,
            bytes,
        });
    }

    Err(reject::custom(ValidationError {
        message: "Missing \"file\" field in form data".to_string(),
    }))
}

async fn collect_part_bytes(part: Part) -> Result<Vec<u8>, Rejection> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, mut buf| async move {
            while buf.has_remaining() {
                let chunk = buf.chunk();
                acc.extend_from_slice(chunk);
                let len = chunk.len();
                buf.advance(len);
            }
            Ok(acc)
        })
        .await
        .map_err(|e| {
            reject::custom(ValidationError {
                message: format!("Failed to read upload: {}", e),
            })
        })
}

pub fn build_metadata_routes(
    config: Config,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "metadata")
        .and(warp::post())
        .and(warp::multipart::form().max_length(config.max_upload_bytes()))
        .and(with_config(config))
        .and_then(inspect_upload)
}
