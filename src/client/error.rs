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

use thiserror::Error;

use super::Method;

/// Errors raised while talking to the FlexibleEngine APIs
#[derive(Debug, Error)]
pub enum CloudError {
    /// The request could not be sent, or no response was received
    #[error("request failed: {0}")]
    Transport(String),
    /// The resource does not exist (HTTP 404)
    #[error("{method} {url}: resource not found: {body}")]
    NotFound {
        method: Method,
        url: String,
        body: String,
    },
    /// The token was rejected (HTTP 401)
    #[error("{method} {url}: unauthorized: {body}")]
    Unauthorized {
        method: Method,
        url: String,
        body: String,
    },
    /// The resource is busy (HTTP 409)
    #[error("{method} {url}: conflict: {body}")]
    Conflict {
        method: Method,
        url: String,
        body: String,
    },
    /// Server side failure (HTTP 5xx)
    #[error("{method} {url}: server error {status}: {body}")]
    Server {
        status: u16,
        method: Method,
        url: String,
        body: String,
    },
    /// Any other unexpected status code
    #[error("{method} {url}: expected HTTP response code {expected:?}, got {status}: {body}")]
    Http {
        status: u16,
        expected: Vec<u16>,
        method: Method,
        url: String,
        body: String,
    },
    /// Response body could not be decoded
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Authentication failed
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A wait did not reach its target before the deadline
    #[error("timeout while waiting for state to become {expected:?} (last state: {last_state:?})")]
    Timeout {
        last_state: String,
        expected: Vec<String>,
    },
    /// A wait observed a state that is neither pending nor target
    #[error("unexpected state '{state}', wanted target {expected:?}")]
    UnexpectedState { state: String, expected: Vec<String> },
    /// The resource disappeared while waiting for it
    #[error("couldn't find resource (21 retries)")]
    ResourceGone,
    /// Local file could not be read
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    /// Build the error matching an unexpected HTTP status
    pub fn from_status(
        status: u16,
        expected: &[u16],
        method: Method,
        url: &str,
        body: String,
    ) -> Self {
        let url = url.to_owned();
        match status {
            401 => CloudError::Unauthorized { method, url, body },
            404 => CloudError::NotFound { method, url, body },
            409 => CloudError::Conflict { method, url, body },
            500..=599 => CloudError::Server {
                status,
                method,
                url,
                body,
            },
            _ => CloudError::Http {
                status,
                expected: expected.to_vec(),
                method,
                url,
                body,
            },
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            CloudError::NotFound { .. } => Some(404),
            CloudError::Unauthorized { .. } => Some(401),
            CloudError::Conflict { .. } => Some(409),
            CloudError::Server { status, .. } | CloudError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::NotFound { .. })
    }

    /// Errors worth retrying at the operation level
    pub fn is_retryable(&self) -> bool {
        matches!(self.status(), Some(409 | 500 | 503))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        let not_found = CloudError::from_status(404, &[200], Method::Get, "u", String::new());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_retryable());

        for status in [409, 500, 503] {
            let err = CloudError::from_status(status, &[200], Method::Put, "u", String::new());
            assert!(err.is_retryable(), "{status} should be retryable");
            assert_eq!(err.status(), Some(status));
        }

        let bad = CloudError::from_status(400, &[200], Method::Post, "u", "oops".into());
        assert!(!bad.is_retryable());
        assert!(matches!(bad, CloudError::Http { status: 400, .. }));
        assert!(!CloudError::Auth("x".into()).is_retryable());
    }
}
