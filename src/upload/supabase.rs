// src/upload/supabase.rs — Supabase Storage adapter (REST API)

use async_trait::async_trait;
use reqwest::Client;

use super::ObjectStore;
use crate::infra::config::UploadConfig;
use crate::infra::errors::{Result, StudyError};

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, bucket: &str, service_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            service_key,
        }
    }

    /// Build from config, reading the service key from its env var.
    pub fn from_config(cfg: &UploadConfig) -> Result<Self> {
        url::Url::parse(&cfg.url)
            .map_err(|e| StudyError::Config(format!("upload.url '{}': {e}", cfg.url)))?;
        let key = std::env::var(&cfg.service_key_env).map_err(|_| {
            StudyError::Config(format!("{} is not set", cfg.service_key_env))
        })?;
        Ok(Self::new(&cfg.url, &cfg.bucket, key))
    }

    pub fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{path}", self.base_url, self.bucket)
    }

    fn bucket_url(&self) -> String {
        format!("{}/storage/v1/bucket/{}", self.base_url, self.bucket)
    }

    async fn error_from(path: &str, resp: reqwest::Response) -> StudyError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        StudyError::Storage {
            path: path.to_string(),
            message: format!("{status}: {body}"),
        }
    }
}

fn transport(path: &str, e: reqwest::Error) -> StudyError {
    StudyError::Storage {
        path: path.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl ObjectStore for SupabaseStore {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn check(&self) -> Result<()> {
        let resp = self
            .client
            .get(self.bucket_url())
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| transport(&self.bucket, e))?;
        if !resp.status().is_success() {
            return Err(Self::error_from(&self.bucket, resp).await);
        }
        Ok(())
    }

    async fn put(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.object_url(path))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| transport(path, e))?;
        if !resp.status().is_success() {
            return Err(Self::error_from(path, resp).await);
        }
        Ok(())
    }
}
