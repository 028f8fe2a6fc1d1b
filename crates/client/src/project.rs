use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::transport::ApiClient;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A PDF document to upload, with its pre-extracted text layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfSource {
    pub path: PathBuf,
    pub name: String,
    pub directory: String,
    pub ocr: bool,
    pub source_text: Option<String>,
    /// Forwarded verbatim; absent when no bounds were found
    pub text_bounds: Option<serde_json::Value>,
}

/// Source-creation surface used by the bundle importer.
///
/// Both calls fail with a `ClientError` whose `is_conflict()` is true when
/// the source already exists.
#[async_trait]
pub trait SourceApi: Send + Sync {
    async fn create_text_source(&self, name: &str, text: &str, directory: &str) -> Result<()>;

    async fn create_pdf_source(&self, source: &PdfSource) -> Result<()>;
}

#[derive(Clone)]
pub struct Project {
    client: ApiClient,
    identifier: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTextSource<'a> {
    project_identifier: &'a str,
    directory_identifier: &'a str,
    source_name: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedUrlRequest<'a> {
    project_identifier: &'a str,
    directory_identifier: &'a str,
    source_name: &'a str,
    content_type: &'a str,
}

#[derive(Deserialize)]
struct SignedUrl {
    url: String,
    key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePdfSource<'a> {
    project_identifier: &'a str,
    directory_identifier: &'a str,
    source_name: &'a str,
    file_key: &'a str,
    ocr: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_bounds: Option<&'a serde_json::Value>,
}

impl Project {
    pub(crate) fn new(client: ApiClient, identifier: String) -> Self {
        Self { client, identifier }
    }

    /// Fetch the project record. Fails if the project is not visible to the API key.
    pub async fn info(&self) -> Result<serde_json::Value> {
        let path = format!("/v1/project/{}", self.identifier);
        let response = self.client.get::<()>(&path, None, None).await?;
        Ok(response.json().await?)
    }

    /// Ask the API where to upload a PDF payload.
    async fn signed_upload_url(&self, source: &PdfSource) -> Result<SignedUrl> {
        let request = SignedUrlRequest {
            project_identifier: &self.identifier,
            directory_identifier: &source.directory,
            source_name: &source.name,
            content_type: PDF_CONTENT_TYPE,
        };

        let response = self
            .client
            .post("/v1/source/signed-url", Some(&request), None)
            .await?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SourceApi for Project {
    async fn create_text_source(&self, name: &str, text: &str, directory: &str) -> Result<()> {
        let request = CreateTextSource {
            project_identifier: &self.identifier,
            directory_identifier: directory,
            source_name: name,
            text,
        };

        self.client.post("/v1/source/text", Some(&request), None).await?;
        info!(project = %self.identifier, directory, source = name, "created text source");
        Ok(())
    }

    async fn create_pdf_source(&self, source: &PdfSource) -> Result<()> {
        let bytes = tokio::fs::read(&source.path)
            .await
            .map_err(|e| ClientError::Io {
                path: source.path.clone(),
                source: e,
            })?;

        let upload = self.signed_upload_url(source).await?;
        debug!(source = %source.name, bytes = bytes.len(), "uploading pdf payload");

        // Pre-signed target lives on another origin, so no API key is sent
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(PDF_CONTENT_TYPE));
        self.client.put(&upload.url, Some(bytes), Some(headers)).await?;

        let request = CreatePdfSource {
            project_identifier: &self.identifier,
            directory_identifier: &source.directory,
            source_name: &source.name,
            file_key: &upload.key,
            ocr: source.ocr,
            source_text: source.source_text.as_deref(),
            text_bounds: source.text_bounds.as_ref(),
        };

        self.client.post("/v1/source/pdf", Some(&request), None).await?;
        info!(
            project = %self.identifier,
            directory = %source.directory,
            source = %source.name,
            "created pdf source"
        );
        Ok(())
    }
}
