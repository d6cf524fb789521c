pub mod types;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use types::JobHandle;

/// HTTP client bound to the base URI of the service under test.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
    base_uri: String,
}

/// A fully drained response.
#[derive(Debug)]
pub struct Reply {
    pub url: String,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ServiceClient {
    pub fn new(base_uri: &str, request_timeout: Duration) -> Result<Self> {
        let base_uri = base_uri.trim().trim_end_matches('/');
        if base_uri.is_empty() {
            return Err(AppError::Config("base URI must not be empty".to_string()));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_uri: base_uri.to_string(),
        })
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    pub async fn get(&self, path: &str) -> Result<Reply> {
        let url = self.url(path);
        let request = self.client.get(&url);
        Self::execute(url, request).await
    }

    pub async fn post_text(&self, path: &str, body: String) -> Result<Reply> {
        let url = self.url(path);
        let request = self
            .client
            .post(&url)
            .header("content-type", "text/plain")
            .body(body);
        Self::execute(url, request).await
    }

    /// Send the request and read the body to the end, so the connection goes
    /// back to the pool whatever the status was.
    async fn execute(url: String, request: RequestBuilder) -> Result<Reply> {
        let response = match request.send().await {
            Ok(r) => r,
            Err(source) => return Err(AppError::Transport { url, source }),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(source) => return Err(AppError::Transport { url, source }),
        };

        Ok(Reply { url, status, body })
    }
}

impl Reply {
    /// Accept any 2xx status.
    pub fn success(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(AppError::Status {
                url: self.url,
                status: self.status,
            })
        }
    }

    /// Accept exactly 200 OK.
    pub fn ok(self) -> Result<Self> {
        if self.status == StatusCode::OK {
            Ok(self)
        } else {
            Err(AppError::Status {
                url: self.url,
                status: self.status,
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| AppError::Parse {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Fill the `{id}` placeholder of an endpoint template with the job handle.
pub fn endpoint(template: &str, job: &JobHandle) -> String {
    template.replace("{id}", &urlencoding::encode(job.as_str()))
}
