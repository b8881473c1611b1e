use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::config::UploadConfig;

/// Form fields for one signed upload, minus the file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUpload {
    pub endpoint: String,
    pub api_key: String,
    pub params: BTreeMap<&'static str, String>,
    pub signature: String,
}

impl SignedUpload {
    pub const SIGNATURE_ALGORITHM: &'static str = "sha256";
}

/// Hex SHA-256 of the alphabetically sorted `key=value` pairs joined by `&`,
/// with the API secret appended.
pub fn sign_params(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let joined = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    hex::encode(Sha256::digest(format!("{joined}{api_secret}").as_bytes()))
}

#[derive(Clone)]
pub struct UploadSigner {
    config: UploadConfig,
}

impl UploadSigner {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn cloud_name(&self) -> &str {
        &self.config.cloud_name
    }

    pub fn sign(&self, timestamp: i64) -> SignedUpload {
        let mut params = BTreeMap::new();
        params.insert("overwrite", "true".to_string());
        params.insert("timestamp", timestamp.to_string());
        params.insert("unique_filename", "true".to_string());
        params.insert("upload_preset", self.config.upload_preset.clone());
        params.insert("use_filename", "true".to_string());

        let signature = sign_params(&params, &self.config.api_secret);

        SignedUpload {
            endpoint: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                self.config.cloud_name
            ),
            api_key: self.config.api_key.clone(),
            params,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UploadSigner {
        UploadSigner::new(UploadConfig {
            cloud_name: "dormhub".to_string(),
            api_key: "key-123".to_string(),
            api_secret: "secret".to_string(),
            upload_preset: "ml_default".to_string(),
        })
    }

    #[test]
    fn signature_covers_sorted_params_and_secret() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1700000000".to_string());
        params.insert("overwrite", "true".to_string());

        let expected = hex::encode(Sha256::digest(b"overwrite=true&timestamp=1700000000secret"));
        assert_eq!(sign_params(&params, "secret"), expected);
        assert_eq!(expected.len(), 64);
        assert!(expected.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn signed_upload_targets_cloud_endpoint() {
        let signed = signer().sign(1_700_000_000);
        assert_eq!(
            signed.endpoint,
            "https://api.cloudinary.com/v1_1/dormhub/image/upload"
        );
        assert_eq!(signed.api_key, "key-123");
        assert_eq!(signed.params["timestamp"], "1700000000");
        assert_eq!(signed.params["upload_preset"], "ml_default");
        assert_eq!(signed.signature, sign_params(&signed.params, "secret"));
    }

    #[test]
    fn signature_changes_with_timestamp() {
        let signer = signer();
        assert_ne!(signer.sign(1).signature, signer.sign(2).signature);
    }
}
