use chrono::NaiveDate;
use dormhub::config::UploadConfig;
use dormhub::error::AppError;
use dormhub::media::{CloudinaryUploader, ImageUpload, ImageUploader, UploadError, UploadSigner};
use dormhub::property::fixtures::seed_snapshot;
use dormhub::property::{InMemoryPropertyRepository, StorageSnapshot};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The image host selected by configuration. Without Cloudinary credentials
/// every upload fails with a clear message instead of a network error.
pub(crate) enum ConfiguredUploader {
    Cloudinary(CloudinaryUploader),
    Disabled,
}

impl ConfiguredUploader {
    pub(crate) fn from_config(config: Option<UploadConfig>) -> Self {
        match config {
            Some(config) => {
                info!(cloud = %config.cloud_name, "room image uploads enabled");
                Self::Cloudinary(CloudinaryUploader::new(UploadSigner::new(config)))
            }
            None => {
                warn!("CLOUDINARY_* not set; room image uploads disabled");
                Self::Disabled
            }
        }
    }
}

impl ImageUploader for ConfiguredUploader {
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError> {
        match self {
            ConfiguredUploader::Cloudinary(uploader) => uploader.upload(image).await,
            ConfiguredUploader::Disabled => Err(UploadError::UploadFailed(
                "image uploads are not configured".to_string(),
            )),
        }
    }
}

pub(crate) fn seeded_repository() -> Result<InMemoryPropertyRepository, AppError> {
    Ok(InMemoryPropertyRepository::from_snapshot(seed_snapshot())?)
}

pub(crate) fn load_snapshot(path: &Path) -> Result<StorageSnapshot, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Reads a snapshot file into a store, refusing rows that break occupancy rules.
pub(crate) fn load_repository(path: &Path) -> Result<InMemoryPropertyRepository, AppError> {
    let repository = InMemoryPropertyRepository::from_snapshot(load_snapshot(path)?)?;
    info!(path = %path.display(), "snapshot loaded");
    Ok(repository)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_reports_the_bad_input() {
        assert_eq!(
            parse_date(" 2023-10-01 "),
            Ok(NaiveDate::from_ymd_opt(2023, 10, 1).expect("valid date"))
        );
        let err = parse_date("10/01/2023").expect_err("wrong format");
        assert!(err.contains("10/01/2023"));
    }

    #[tokio::test]
    async fn disabled_uploader_refuses_uploads() {
        let uploader = ConfiguredUploader::from_config(None);
        let result = uploader
            .upload(ImageUpload {
                file_name: "room.png".to_string(),
                content_type: "image/png".to_string(),
                bytes: vec![1, 2, 3],
            })
            .await;
        assert!(matches!(result, Err(UploadError::UploadFailed(_))));
    }

    #[test]
    fn missing_snapshot_file_is_an_io_error() {
        let err = load_snapshot(Path::new("./does-not-exist.json")).expect_err("missing file");
        assert!(matches!(err, AppError::Io(_)));
    }

    #[test]
    fn inconsistent_snapshot_file_is_refused() {
        let mut snapshot = seed_snapshot();
        snapshot.rooms[0].tenant_ids.clear();
        let path = std::env::temp_dir().join(format!(
            "dormhub-inconsistent-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, serde_json::to_vec(&snapshot).expect("serialize"))
            .expect("write snapshot");

        let result = load_repository(&path);
        std::fs::remove_file(&path).expect("clean up snapshot");

        let err = result.expect_err("tenant 1 is unlisted");
        assert!(matches!(err, AppError::Occupancy(_)));
        assert!(err.to_string().contains("tenant 1 points at room 1"));
    }
}
