//! Storage of uploaded payment screenshots on the local disk.

use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::Error;

/// The multipart field that holds the screenshot.
pub const SCREENSHOT_FIELD: &str = "screenshot";

/// A screenshot that has been written to the upload directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// The generated filename, e.g. "txn-1700000000000.png".
    pub file_name: String,
    /// The full path of the file on disk.
    pub path: PathBuf,
}

/// Generate the name a screenshot is stored under.
///
/// The name has the form `txn-<epoch millis><ext>` where `<ext>` is the
/// extension of `original_name` including the dot, or empty if it has none.
/// Two uploads within the same millisecond get the same name.
pub fn stored_file_name(original_name: &str, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let extension = Path::new(original_name)
        .extension()
        .map(|extension| format!(".{}", extension.to_string_lossy()))
        .unwrap_or_default();

    format!("txn-{millis}{extension}")
}

/// Write `data` to `upload_dir` under a generated name.
///
/// `upload_dir` is created if it does not exist.
///
/// # Errors
/// Returns an [Error::UploadError] if the directory cannot be created or the file cannot be written.
pub async fn store_upload(
    upload_dir: &Path,
    original_name: &str,
    data: &[u8],
) -> Result<StoredFile, Error> {
    tokio::fs::create_dir_all(upload_dir).await.map_err(|error| {
        Error::UploadError(format!(
            "could not create upload directory {}: {error}",
            upload_dir.display()
        ))
    })?;

    let file_name = stored_file_name(original_name, OffsetDateTime::now_utc());
    let path = upload_dir.join(&file_name);

    tokio::fs::write(&path, data).await.map_err(|error| {
        Error::UploadError(format!("could not write {}: {error}", path.display()))
    })?;

    tracing::debug!("stored {} bytes at {}", data.len(), path.display());

    Ok(StoredFile { file_name, path })
}
