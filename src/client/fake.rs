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

//! In-memory transport replaying scripted responses

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{CloudError, Method, Request, Response, Transport};

/// Responses are queued per method and URL path (query excluded).
/// The last queued response of a route is replayed forever.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Response>>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    pub fn respond(&self, method: Method, path: &str, status: u16, body: serde_json::Value) {
        self.respond_with_headers(method, path, status, &[], body);
    }

    pub fn respond_empty(&self, method: Method, path: &str, status: u16) {
        self.push(
            method,
            path,
            Response {
                status,
                ..Default::default()
            },
        );
    }

    pub fn respond_with_headers(
        &self,
        method: Method,
        path: &str,
        status: u16,
        headers: &[(&str, &str)],
        body: serde_json::Value,
    ) {
        self.push(
            method,
            path,
            Response {
                status,
                headers: headers
                    .iter()
                    .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
                    .collect(),
                body: body.to_string().into_bytes(),
            },
        );
    }

    fn push(&self, method: Method, path: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent with the given method to the given path
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && path_of(&request.url) == path)
            .collect()
    }
}

fn path_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .map(|url| url.path().to_owned())
        .unwrap_or_else(|_| url.to_owned())
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &Request) -> Result<Response, CloudError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(&(request.method, path_of(&request.url))) else {
            return Ok(Response {
                status: 404,
                body: format!("no route for {} {}", request.method, request.url).into_bytes(),
                ..Default::default()
            });
        };
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(response.unwrap_or_default())
    }
}

/// Session on a fake transport, with the token `tok` and the project `p-1`
pub async fn fake_session(fake: &Arc<FakeTransport>) -> Arc<super::Session> {
    let credentials = super::Credentials {
        auth_url: "https://iam.eu-west-0.example.com/v3".into(),
        token: Some("tok".into()),
        tenant_id: Some("p-1".into()),
        ..Default::default()
    };
    Arc::new(
        super::Session::connect(fake.clone(), credentials)
            .await
            .unwrap(),
    )
}
