//! Publishing a local dataset file to blob storage.

use std::path::Path;

use diet_insights_storage::{BlobMetadata, BlobProperties, BlobReference, StorageClient};

use crate::PipelineError;

#[derive(Debug)]
pub struct UploadReport {
    pub reference: BlobReference,
    pub bytes: u64,
    pub properties: BlobProperties,
    /// Container contents after the upload.
    pub blobs: Vec<BlobMetadata>,
    pub url: String,
}

/// Uploads `file` into `container` under its file name, replacing any
/// existing blob, then reads back its properties and the container listing.
///
/// # Errors
///
/// Returns [`PipelineError::MissingInput`] if `file` does not exist, and
/// the storage failure otherwise. An already-existing container is not an
/// error.
pub async fn upload_dataset(
    storage: &StorageClient,
    file: &Path,
    container: &str,
) -> Result<UploadReport, PipelineError> {
    let blob = file
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|_| file.is_file())
        .ok_or_else(|| PipelineError::MissingInput {
            path: file.to_path_buf(),
        })?;
    let reference = BlobReference::new(container, blob);

    let bytes = storage.upload_file(file, &reference, true).await?;

    log::info!("Verifying upload of {reference}");
    let properties = storage.properties(&reference).await?;
    let blobs = storage.list_blobs(container).await?;

    Ok(UploadReport {
        url: storage.blob_url(&reference),
        reference,
        bytes,
        properties,
        blobs,
    })
}
