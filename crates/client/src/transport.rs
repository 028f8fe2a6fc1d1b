use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::project::Project;

/// Authenticated REST client for the annotation platform.
///
/// Paths are joined onto the configured base URL, so an absolute URL
/// (e.g. a pre-signed upload target) replaces it. The API key is only
/// attached to requests that stay on the base URL's origin; headers
/// passed by the caller are applied last and win over the defaults.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    auth_header: HeaderValue,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(ClientError::MissingApiKey)?;

        let mut auth_header = HeaderValue::from_str(&format!("Api-Key {}", api_key))?;
        auth_header.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: Url::parse(&config.api_url)?,
            auth_header,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Project-level API surface for `identifier` (project id or name)
    pub fn project(&self, identifier: impl Into<String>) -> Project {
        Project::new(self.clone(), identifier.into())
    }

    pub async fn get<B>(&self, path: &str, body: Option<&B>, headers: Option<HeaderMap>) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(Method::GET, path, headers)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(Method::GET, request).await
    }

    pub async fn post<B>(&self, path: &str, body: Option<&B>, headers: Option<HeaderMap>) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.request(Method::POST, path, headers)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(Method::POST, request).await
    }

    /// PUT raw bytes. Content type comes from `headers`.
    pub async fn put(&self, path: &str, data: Option<Vec<u8>>, headers: Option<HeaderMap>) -> Result<Response> {
        let mut request = self.request(Method::PUT, path, headers)?;
        if let Some(data) = data {
            request = request.body(data);
        }
        self.send(Method::PUT, request).await
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, path: &str, headers: Option<HeaderMap>) -> Result<RequestBuilder> {
        let url = self.resolve(path)?;
        let same_origin = url.origin() == self.base_url.origin();

        let mut request = self.client.request(method, url);
        if same_origin {
            request = request.header(AUTHORIZATION, self.auth_header.clone());
        }
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        Ok(request)
    }

    async fn send(&self, method: Method, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        debug!(method = %method, url = %response.url(), status = response.status().as_u16(), "request complete");
        check_status(method, response).await
    }
}

/// Turn any status >= 300 into `ClientError::Api`, logging the server message.
async fn check_status(method: Method, response: Response) -> Result<Response> {
    let status = response.status();
    if status.as_u16() < 300 {
        return Ok(response);
    }

    let url = response.url();
    let path = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    // Error bodies are optional and may not be JSON
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| "Unknown Error".to_string());

    error!(method = %method, path = %path, status = status.as_u16(), "{} {} failed with message: {}", method, path, message);

    Err(ClientError::Api {
        status,
        method,
        path,
        message,
    })
}
