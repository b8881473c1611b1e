use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{info, warn};

use super::signer::{SignedUpload, UploadSigner};
use super::{ImageUpload, ImageUploader, UploadError};

/// Delivery URL resized to the 800x600 listing frame with automatic format
/// and quality.
pub fn optimized_url(cloud_name: &str, public_id: &str) -> String {
    format!(
        "https://res.cloudinary.com/{cloud_name}/image/upload/c_fill,w_800,h_600/f_auto/q_auto/{public_id}"
    )
}

const BODY_EXCERPT: usize = 200;

/// Turns the upload API's reply into the URL stored on the room. Failures
/// always carry the HTTP status, whatever the body looks like.
fn delivery_url(cloud_name: &str, status: StatusCode, body: &str) -> Result<String, String> {
    let parsed = serde_json::from_str::<Value>(body);

    if !status.is_success() {
        let message = match &parsed {
            Ok(json) => json
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| json.to_string()),
            Err(_) => excerpt(body),
        };
        return Err(format!("{status}: {message}"));
    }

    let json = parsed.map_err(|err| format!("{status}: unreadable upload response: {err}"))?;
    let Some(secure_url) = json.get("secure_url").and_then(Value::as_str) else {
        return Err("response is missing secure_url".to_string());
    };
    Ok(match json.get("public_id").and_then(Value::as_str) {
        Some(public_id) => optimized_url(cloud_name, public_id),
        None => secure_url.to_string(),
    })
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    match trimmed.char_indices().nth(BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Signed multipart uploads to the Cloudinary image API.
pub struct CloudinaryUploader {
    client: reqwest::Client,
    signer: UploadSigner,
}

impl CloudinaryUploader {
    pub fn new(signer: UploadSigner) -> Self {
        Self::with_client(reqwest::Client::new(), signer)
    }

    pub fn with_client(client: reqwest::Client, signer: UploadSigner) -> Self {
        Self { client, signer }
    }

    fn form(signed: SignedUpload, image: ImageUpload) -> Result<Form, UploadError> {
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|err| UploadError::UnsupportedMedia(err.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", signed.api_key)
            .text("signature", signed.signature)
            .text("signature_algorithm", SignedUpload::SIGNATURE_ALGORITHM);
        for (key, value) in signed.params {
            form = form.text(key, value);
        }
        Ok(form)
    }

    fn failure(failure: String) -> UploadError {
        warn!(%failure, "image upload failed");
        UploadError::UploadFailed(failure)
    }
}

impl std::fmt::Debug for CloudinaryUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryUploader")
            .field("cloud_name", &self.signer.cloud_name())
            .finish_non_exhaustive()
    }
}

impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, image: ImageUpload) -> Result<String, UploadError> {
        image.validate()?;

        let file_name = image.file_name.clone();
        let signed = self.signer.sign(Utc::now().timestamp());
        let endpoint = signed.endpoint.clone();
        let form = Self::form(signed, image)?;

        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| Self::failure(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| Self::failure(format!("{status}: unreadable upload response: {err}")))?;
        let url = delivery_url(self.signer.cloud_name(), status, &body).map_err(Self::failure)?;

        info!(file = %file_name, %url, "image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimized_url_applies_listing_transformations() {
        assert_eq!(
            optimized_url("dormhub", "rooms/101"),
            "https://res.cloudinary.com/dormhub/image/upload/c_fill,w_800,h_600/f_auto/q_auto/rooms/101"
        );
    }

    #[test]
    fn html_error_pages_keep_the_status() {
        let err = delivery_url(
            "dormhub",
            StatusCode::BAD_GATEWAY,
            "<html><body>upstream timed out</body></html>",
        )
        .expect_err("gateway failure");

        assert!(err.starts_with("502 Bad Gateway: "), "{err}");
        assert!(err.contains("upstream timed out"));
    }

    #[test]
    fn empty_error_bodies_still_name_the_status() {
        let err = delivery_url("dormhub", StatusCode::UNAUTHORIZED, "")
            .expect_err("rejected credentials");
        assert_eq!(err, "401 Unauthorized: empty response body");
    }

    #[test]
    fn json_errors_surface_the_api_message() {
        let err = delivery_url(
            "dormhub",
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"Invalid Signature"}}"#,
        )
        .expect_err("bad signature");
        assert_eq!(err, "400 Bad Request: Invalid Signature");
    }

    #[test]
    fn long_error_pages_are_cut_short() {
        let page = "x".repeat(BODY_EXCERPT * 3);
        let err = delivery_url("dormhub", StatusCode::SERVICE_UNAVAILABLE, &page)
            .expect_err("maintenance page");
        assert!(err.ends_with("..."));
        assert!(err.len() < page.len());
    }

    #[test]
    fn successful_uploads_prefer_the_optimized_url() {
        let url = delivery_url(
            "dormhub",
            StatusCode::OK,
            r#"{"secure_url":"https://res.cloudinary.com/dormhub/image/upload/v1/rooms/101.png","public_id":"rooms/101"}"#,
        )
        .expect("upload accepted");
        assert_eq!(url, optimized_url("dormhub", "rooms/101"));

        let err = delivery_url("dormhub", StatusCode::OK, "<html>ok</html>")
            .expect_err("success without json");
        assert!(err.starts_with("200 OK: unreadable upload response"), "{err}");
    }
}
