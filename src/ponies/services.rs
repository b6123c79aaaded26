use bytes::Bytes;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::storage::StorageClient;

fn ext_for_mime(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Unix-seconds prefix keeps directory listings roughly chronological; the
/// UUID suffix carries the collision resistance.
fn unique_filename(ext: &str) -> String {
    format!(
        "{}-{}.{}",
        OffsetDateTime::now_utc().unix_timestamp(),
        Uuid::new_v4(),
        ext
    )
}

/// Validate an uploaded image, store it under a fresh name and return its
/// public URL.
pub async fn process_upload(
    storage: &dyn StorageClient,
    max_bytes: usize,
    content_type: &str,
    data: Bytes,
) -> Result<String, ApiError> {
    let ext = ext_for_mime(content_type).ok_or_else(|| {
        ApiError::Validation("Only jpeg, jpg, png, gif and webp images are allowed".into())
    })?;

    if data.is_empty() {
        return Err(ApiError::Validation("Uploaded file is empty".into()));
    }
    if data.len() > max_bytes {
        return Err(ApiError::Validation(format!(
            "File exceeds the maximum size of {} bytes",
            max_bytes
        )));
    }

    let filename = unique_filename(ext);
    storage.put_object(&filename, data).await?;

    info!(filename = %filename, "image stored");
    Ok(storage.public_url(&filename))
}
