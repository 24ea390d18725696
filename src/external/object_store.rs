use crate::config::StorageConfig;
use anyhow::{Context, bail};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

/// Binary object store for user images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores the image and returns its public HTTPS URL.
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> anyhow::Result<String>;
}

/// Cloudinary signed upload API.
#[derive(Clone)]
pub struct CloudinaryStore {
    http: Client,
    cfg: StorageConfig,
}

impl CloudinaryStore {
    pub fn new(cfg: StorageConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.cfg.cloud_name.is_empty()
            && !self.cfg.api_key.is_empty()
            && !self.cfg.api_secret.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary request signature: SHA-1 over the alphabetically sorted
/// `key=value` pairs joined by `&`, with the API secret appended.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{:x}", Sha1::digest(format!("{joined}{api_secret}").as_bytes()))
}

#[async_trait]
impl ObjectStore for CloudinaryStore {
    async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> anyhow::Result<String> {
        if !self.is_configured() {
            bail!("object storage is not configured");
        }

        let timestamp = Utc::now().timestamp().to_string();
        let public_id = uuid::Uuid::new_v4().to_string();
        let signature = sign_params(
            &[
                ("folder", self.cfg.folder.as_str()),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            &self.cfg.api_secret,
        );

        let file = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .context("invalid content type")?;
        let form = Form::new()
            .text("api_key", self.cfg.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.cfg.folder.clone())
            .text("public_id", public_id)
            .text("signature", signature)
            .part("file", file);

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cfg.cloud_name
        );
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("image upload request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("image upload rejected: HTTP {}: {}", status.as_u16(), body);
        }

        let body: UploadResponse = resp.json().await.context("bad upload response")?;
        log::info!("Image stored at {}", body.secure_url);
        Ok(body.secure_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_params_sorts_and_hashes() {
        // SHA-1 of "folder=pics&public_id=abc&timestamp=1315060510secret"
        let expected = format!(
            "{:x}",
            Sha1::digest(b"folder=pics&public_id=abc&timestamp=1315060510secret")
        );
        let sig = sign_params(
            &[
                ("timestamp", "1315060510"),
                ("public_id", "abc"),
                ("folder", "pics"),
            ],
            "secret",
        );
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), 40);
    }

    #[tokio::test]
    async fn test_unconfigured_store_refuses_upload() {
        let store = CloudinaryStore::new(StorageConfig::default());
        assert!(!store.is_configured());
        let err = store
            .upload_image(vec![0xff, 0xd8], "a.jpg", "image/jpeg")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
