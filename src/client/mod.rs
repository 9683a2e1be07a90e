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

//! Thin async REST client for the FlexibleEngine APIs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

mod auth;
mod error;
#[cfg(test)]
pub(crate) mod fake;
mod transport;

pub use auth::{authenticate, Credentials, Session, Token};
pub use error::CloudError;
pub use transport::{HttpTransport, Method, Request, Response, TlsOptions, Transport};

pub const DEFAULT_CLOUD: &str = "prod-cloud-ocb.orange-business.com";

/// Default identity endpoint of a region
pub fn default_auth_url(region: &str, cloud: &str) -> String {
    format!("https://iam.{region}.{cloud}/v3")
}

/// Client bound to the base URL of a service
#[derive(Debug, Clone)]
pub struct ServiceClient {
    session: Arc<Session>,
    endpoint: String,
}

impl ServiceClient {
    pub fn new(session: Arc<Session>, endpoint: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Self { session, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &str {
        self.session.project_id()
    }

    /// Join path segments to the endpoint
    pub fn url(&self, parts: &[&str]) -> String {
        format!("{}{}", self.endpoint, parts.join("/"))
    }

    /// Join path segments to the endpoint and append query parameters
    pub fn url_with_query(
        &self,
        parts: &[&str],
        query: &[(&str, &str)],
    ) -> Result<String, CloudError> {
        let mut url = reqwest::Url::parse(&self.url(parts))
            .map_err(|err| CloudError::Config(format!("invalid endpoint {}: {err}", self.endpoint)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url.into())
    }

    pub async fn get(&self, url: &str) -> Result<Response, CloudError> {
        self.request(Method::Get, url, None, &[200]).await
    }

    pub async fn post(&self, url: &str, body: serde_json::Value) -> Result<Response, CloudError> {
        self.request(Method::Post, url, Some(&body), &[200, 201, 202])
            .await
    }

    pub async fn put(&self, url: &str, body: serde_json::Value) -> Result<Response, CloudError> {
        self.request(Method::Put, url, Some(&body), &[200, 201, 202])
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<Response, CloudError> {
        self.request(Method::Delete, url, None, &[200, 202, 204])
            .await
    }

    /// Send an authenticated request, authenticating again once if the token is rejected
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        ok_codes: &[u16],
    ) -> Result<Response, CloudError> {
        let mut token = self.session.token().await;
        let mut renewed = false;
        loop {
            let mut request = Request::new(method, url).header("X-Auth-Token", token.as_str());
            if let Some(body) = body {
                request = request.json(body.clone());
            }
            let response = self.session.transport().send(&request).await?;
            if response.status == 401 && !renewed {
                debug!(%method, url, "token rejected");
                token = self.session.reauthenticate(&token).await?;
                renewed = true;
                continue;
            }
            if ok_codes.contains(&response.status) {
                return Ok(response);
            }
            return Err(CloudError::from_status(
                response.status,
                ok_codes,
                method,
                url,
                response.text(),
            ));
        }
    }
}

/// Provider wide configuration: region, endpoints and authenticated session
#[derive(Debug)]
pub struct Config {
    pub region: String,
    pub cloud: String,
    endpoints: BTreeMap<String, String>,
    session: Arc<Session>,
}

impl Config {
    pub fn new(
        region: String,
        cloud: String,
        endpoints: BTreeMap<String, String>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            region,
            cloud,
            endpoints,
            session,
        }
    }

    /// Authenticate and build the configuration
    pub async fn connect(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        region: String,
        cloud: String,
        endpoints: BTreeMap<String, String>,
    ) -> Result<Self, CloudError> {
        let session = Session::connect(transport, credentials).await?;
        Ok(Self::new(region, cloud, endpoints, Arc::new(session)))
    }

    /// Region of a resource, falling back to the provider region
    pub fn region<'s>(&'s self, region: &'s str) -> &'s str {
        if region.is_empty() {
            &self.region
        } else {
            region
        }
    }

    /// Base URL of a service, honoring the endpoint overrides
    pub fn service_endpoint(&self, service: &str, region: &str) -> String {
        match self.endpoints.get(service) {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{service}.{}.{}/", self.region(region), self.cloud),
        }
    }

    fn client(&self, base: String, path: &str) -> ServiceClient {
        let base = format!("{}/{path}", base.trim_end_matches('/'));
        ServiceClient::new(self.session.clone(), base)
    }

    /// VPC v1 (VPCs and subnets)
    pub fn vpc_v1(&self, region: &str) -> ServiceClient {
        let path = format!("v1/{}/", self.session.project_id());
        self.client(self.service_endpoint("vpc", region), &path)
    }

    /// Networking v2.0 (VPC routes)
    pub fn networking_v2(&self, region: &str) -> ServiceClient {
        self.client(self.service_endpoint("vpc", region), "v2.0/")
    }

    /// Enhanced load balancer v2.0, served by the VPC endpoint unless overridden
    pub fn elb_v2(&self, region: &str) -> ServiceClient {
        let base = match self.endpoints.get("elb") {
            Some(endpoint) => endpoint.clone(),
            None => self.service_endpoint("vpc", region),
        };
        self.client(base, "v2.0/")
    }

    /// Cloud container engine v3
    pub fn cce_v3(&self, region: &str) -> ServiceClient {
        let path = format!("api/v3/projects/{}/", self.session.project_id());
        self.client(self.service_endpoint("cce", region), &path)
    }

    /// MapReduce service v1.1
    pub fn mrs_v1(&self, region: &str) -> ServiceClient {
        let path = format!("v1.1/{}/", self.session.project_id());
        self.client(self.service_endpoint("mrs", region), &path)
    }
}
