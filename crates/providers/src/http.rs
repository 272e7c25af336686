use crate::{MetadataProvider, ProviderError, RemoteMetadata, UploadFile, UPLOAD_FIELD};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct HttpProviderConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

/// Talks to a metadata server exposing `POST /upload`.
#[derive(Clone)]
pub struct HttpMetadataProvider {
    client: Client,
    cfg: Arc<HttpProviderConfig>,
}

impl HttpMetadataProvider {
    pub fn new(cfg: HttpProviderConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/upload", self.cfg.base_url.trim_end_matches('/'))
    }
}

fn build_form(files: Vec<UploadFile>) -> Result<Form, ProviderError> {
    let mut form = Form::new();
    for file in files {
        let mut part = Part::bytes(file.bytes).file_name(file.name);
        if let Some(mime) = &file.content_type {
            part = part
                .mime_str(mime)
                .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        }
        form = form.part(UPLOAD_FIELD, part);
    }
    Ok(form)
}

#[async_trait::async_trait]
impl MetadataProvider for HttpMetadataProvider {
    async fn describe(&self, files: Vec<UploadFile>) -> Result<Vec<RemoteMetadata>, ProviderError> {
        let url = self.upload_url();
        let expected = files.len();
        debug!("uploading {} files to {}", expected, url);

        let resp = self
            .client
            .post(&url)
            .multipart(build_form(files)?)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let parsed: Vec<RemoteMetadata> = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if parsed.len() != expected {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} records, got {}",
                expected,
                parsed.len()
            )));
        }
        Ok(parsed)
    }
}
