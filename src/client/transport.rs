// This file is part of the terraform-provider-flexibleengine project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::CloudError;

const USER_AGENT: &str = concat!("terraform-provider-flexibleengine/", env!("CARGO_PKG_VERSION"));
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(value: Method) -> Self {
        match value {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// HTTP request with an optional JSON body
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP response, header names are lower case
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CloudError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the cloud
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, CloudError>;
}

/// TLS settings of the HTTP transport, certificates are PEM contents
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    pub insecure: bool,
    pub ca_cert: Option<String>,
    pub client_cert: Option<(String, String)>,
}

/// [`Transport`] over `reqwest`, retrying connection failures, 429 and 503
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpTransport {
    pub fn new(tls: &TlsOptions, max_retries: u32) -> Result<Self, CloudError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(tls.insecure);
        if let Some(ca_cert) = &tls.ca_cert {
            let cert = reqwest::Certificate::from_pem(ca_cert.as_bytes())
                .map_err(|err| CloudError::Config(format!("invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }
        if let Some((cert, key)) = &tls.client_cert {
            let pem = format!("{cert}\n{key}");
            let identity = reqwest::Identity::from_pem(pem.as_bytes())
                .map_err(|err| CloudError::Config(format!("invalid client certificate: {err}")))?;
            builder = builder.identity(identity);
        }
        let client = builder
            .build()
            .map_err(|err| CloudError::Config(err.to_string()))?;
        Ok(Self {
            client,
            max_retries,
        })
    }

    async fn send_once(&self, request: &Request) -> Result<Response, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str())
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                Some((name.as_str().to_owned(), value.to_str().ok()?.to_owned()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();
        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Response, CloudError> {
        let mut attempt = 0;
        loop {
            debug!(method = %request.method, url = request.url, attempt, "sending request");
            match self.send_once(request).await {
                Ok(response)
                    if matches!(response.status, 429 | 503) && attempt < self.max_retries =>
                {
                    warn!(
                        method = %request.method,
                        url = request.url,
                        status = response.status,
                        "retrying throttled request"
                    );
                }
                Err(err) if err.is_connect() && attempt < self.max_retries => {
                    warn!(method = %request.method, url = request.url, "retrying after connection error: {err}");
                }
                Ok(response) => {
                    debug!(method = %request.method, url = request.url, status = response.status, "received response");
                    return Ok(response);
                }
                Err(err) => return Err(CloudError::Transport(err.to_string())),
            }
            tokio::time::sleep(backoff(attempt)).await;
            attempt += 1;
        }
    }
}

/// 1s, 2s, 4s... capped at 30s
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.min(5)).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff(0), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(4), Duration::from_secs(16));
        assert_eq!(backoff(5), MAX_BACKOFF);
        assert_eq!(backoff(40), MAX_BACKOFF);
    }

    #[test]
    fn response_helpers() {
        let response = Response {
            status: 200,
            headers: [("x-subject-token".to_owned(), "abc".to_owned())].into(),
            body: br#"{"id": "42"}"#.to_vec(),
        };
        assert_eq!(response.header("X-Subject-Token"), Some("abc"));
        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["id"], "42");
    }
}
