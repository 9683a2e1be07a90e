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

use std::fmt::Debug;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CloudError, Method, Request, Transport};

/// Keystone v3 credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub auth_url: String,
    pub user_name: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub domain_id: Option<String>,
    pub domain_name: Option<String>,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_url", &self.auth_url)
            .field("user_name", &self.user_name)
            .field("user_id", &self.user_id)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("token", &self.token.as_ref().map(|_| "****"))
            .field("domain_id", &self.domain_id)
            .field("domain_name", &self.domain_name)
            .field("tenant_id", &self.tenant_id)
            .field("tenant_name", &self.tenant_name)
            .finish()
    }
}

impl Credentials {
    fn tokens_url(&self) -> String {
        format!("{}/auth/tokens", self.auth_url.trim_end_matches('/'))
    }

    fn domain(&self) -> Option<serde_json::Value> {
        match (&self.domain_id, &self.domain_name) {
            (Some(id), _) => Some(json!({ "id": id })),
            (None, Some(name)) => Some(json!({ "name": name })),
            (None, None) => None,
        }
    }

    /// Body of the password authentication request, scoped to the project
    pub(crate) fn password_body(&self) -> serde_json::Value {
        let mut user = Map::new();
        if let Some(id) = &self.user_id {
            user.insert("id".into(), json!(id));
        } else if let Some(name) = &self.user_name {
            user.insert("name".into(), json!(name));
            if let Some(domain) = self.domain() {
                user.insert("domain".into(), domain);
            }
        }
        user.insert("password".into(), json!(self.password));

        let project = match (&self.tenant_id, &self.tenant_name) {
            (Some(id), _) => json!({ "id": id }),
            (None, name) => {
                let mut project = Map::new();
                project.insert("name".into(), json!(name));
                if let Some(domain) = self.domain() {
                    project.insert("domain".into(), domain);
                }
                serde_json::Value::Object(project)
            }
        };

        json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": { "user": user },
                },
                "scope": { "project": project },
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: TokenInfo,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    project: Option<ProjectInfo>,
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    id: String,
}

/// Scoped token
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub id: String,
    pub project_id: String,
}

impl Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("id", &"****")
            .field("project_id", &self.project_id)
            .finish()
    }
}

fn project_of(body: TokenBody) -> Result<String, CloudError> {
    body.token
        .project
        .map(|project| project.id)
        .ok_or_else(|| CloudError::Auth("token is not scoped to a project".into()))
}

/// Get a project scoped token, either from the password or by inspecting a given token
pub async fn authenticate(
    transport: &dyn Transport,
    credentials: &Credentials,
) -> Result<Token, CloudError> {
    let url = credentials.tokens_url();
    if let Some(token) = &credentials.token {
        let project_id = if let Some(tenant_id) = &credentials.tenant_id {
            tenant_id.clone()
        } else {
            let request = Request::new(Method::Get, url.as_str())
                .header("X-Auth-Token", token.as_str())
                .header("X-Subject-Token", token.as_str());
            let response = transport.send(&request).await?;
            if response.status != 200 {
                return Err(CloudError::Auth(format!(
                    "token validation returned {}: {}",
                    response.status,
                    response.text()
                )));
            }
            project_of(response.json()?)?
        };
        debug!(project_id, "using provided token");
        return Ok(Token {
            id: token.clone(),
            project_id,
        });
    }

    let request = Request::new(Method::Post, url.as_str()).json(credentials.password_body());
    let response = transport.send(&request).await?;
    if !matches!(response.status, 200 | 201) {
        return Err(CloudError::Auth(format!(
            "{} returned {}: {}",
            url,
            response.status,
            response.text()
        )));
    }
    let id = response
        .header("X-Subject-Token")
        .ok_or_else(|| CloudError::Auth("missing X-Subject-Token header".into()))?
        .to_owned();
    let project_id = project_of(response.json()?)?;
    info!(project_id, "authenticated against {url}");
    Ok(Token { id, project_id })
}

/// Authenticated session shared by every service client
#[derive(Debug)]
pub struct Session {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    token: RwLock<String>,
    project_id: String,
}

impl Session {
    pub async fn connect(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
    ) -> Result<Self, CloudError> {
        let token = authenticate(transport.as_ref(), &credentials).await?;
        Ok(Self {
            transport,
            credentials,
            token: RwLock::new(token.id),
            project_id: token.project_id,
        })
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub async fn token(&self) -> String {
        self.token.read().await.clone()
    }

    /// Replace a token rejected by the cloud, unless another task already did
    pub async fn reauthenticate(&self, stale: &str) -> Result<String, CloudError> {
        let mut token = self.token.write().await;
        if *token != stale {
            return Ok(token.clone());
        }
        if self.credentials.token.is_some() {
            return Err(CloudError::Auth(
                "the provided token was rejected and cannot be renewed".into(),
            ));
        }
        info!("token expired, authenticating again");
        let renewed = authenticate(self.transport.as_ref(), &self.credentials).await?;
        *token = renewed.id;
        Ok(token.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::client::fake::FakeTransport;

    fn password_credentials() -> Credentials {
        Credentials {
            auth_url: "https://iam.eu-west-0.example.com/v3/".into(),
            user_name: Some("alice".into()),
            password: Some("secret".into()),
            domain_name: Some("acme".into()),
            tenant_name: Some("eu-west-0_project".into()),
            ..Default::default()
        }
    }

    #[test]
    fn password_body_is_project_scoped() {
        let body = password_credentials().password_body();
        let user = &body["auth"]["identity"]["password"]["user"];
        assert_eq!(user["name"], "alice");
        assert_eq!(user["domain"]["name"], "acme");
        assert_eq!(user["password"], "secret");
        let project = &body["auth"]["scope"]["project"];
        assert_eq!(project["name"], "eu-west-0_project");
        assert_eq!(project["domain"]["name"], "acme");
    }

    #[test]
    fn debug_hides_secrets() {
        let debug = format!("{:?}", password_credentials());
        assert!(!debug.contains("secret"));
    }

    #[tokio::test]
    async fn password_authentication() {
        let fake = Arc::new(FakeTransport::default());
        fake.respond_with_headers(
            Method::Post,
            "/v3/auth/tokens",
            201,
            &[("X-Subject-Token", "tok-1")],
            json!({"token": {"project": {"id": "p-1"}}}),
        );
        let session = Session::connect(fake.clone(), password_credentials())
            .await
            .unwrap();
        assert_eq!(session.project_id(), "p-1");
        assert_eq!(session.token().await, "tok-1");

        let requests = fake.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://iam.eu-west-0.example.com/v3/auth/tokens");
    }

    #[tokio::test]
    async fn token_with_tenant_skips_requests() {
        let fake = Arc::new(FakeTransport::default());
        let credentials = Credentials {
            auth_url: "https://iam.example.com/v3".into(),
            token: Some("given".into()),
            tenant_id: Some("p-2".into()),
            ..Default::default()
        };
        let session = Session::connect(fake.clone(), credentials).await.unwrap();
        assert_eq!(session.project_id(), "p-2");
        assert!(fake.requests().is_empty());
        assert!(matches!(
            session.reauthenticate("given").await,
            Err(CloudError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn rejected_password() {
        let fake = Arc::new(FakeTransport::default());
        fake.respond(
            Method::Post,
            "/v3/auth/tokens",
            401,
            json!({"error": {"message": "bad"}}),
        );
        let err = Session::connect(fake, password_credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Auth(_)));
    }
}
