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

//! VPC v1 and VPC routes v2.0

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::client::{CloudError, ServiceClient};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Vpc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cidr: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Subnet {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cidr: String,
    #[serde(default)]
    pub vpc_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub route_type: String,
    #[serde(default)]
    pub nexthop: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub vpc_id: String,
    #[serde(default)]
    pub tenant_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateRouteOpts {
    #[serde(rename = "type")]
    pub route_type: String,
    pub nexthop: String,
    pub destination: String,
    pub vpc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Route filters, unset fields match every route
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteFilter {
    pub id: Option<String>,
    pub vpc_id: Option<String>,
    pub route_type: Option<String>,
    pub destination: Option<String>,
    pub tenant_id: Option<String>,
}

impl RouteFilter {
    fn query(&self) -> Vec<(&str, &str)> {
        [
            ("id", &self.id),
            ("vpc_id", &self.vpc_id),
            ("type", &self.route_type),
            ("destination", &self.destination),
            ("tenant_id", &self.tenant_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| Some((name, value.as_deref()?)))
        .collect()
    }

    pub fn matches(&self, route: &Route) -> bool {
        let check = |filter: &Option<String>, value: &str| {
            filter.as_deref().map_or(true, |filter| filter == value)
        };
        check(&self.id, &route.id)
            && check(&self.vpc_id, &route.vpc_id)
            && check(&self.route_type, &route.route_type)
            && check(&self.destination, &route.destination)
            && check(&self.tenant_id, &route.tenant_id)
    }
}

#[derive(Deserialize)]
struct VpcBody {
    vpc: Vpc,
}

#[derive(Deserialize)]
struct SubnetBody {
    subnet: Subnet,
}

#[derive(Deserialize)]
struct RouteBody {
    route: Route,
}

#[derive(Deserialize)]
struct RoutesBody {
    #[serde(default)]
    routes: Vec<Route>,
}

/// `client` is a VPC v1 client
pub async fn get_vpc(client: &ServiceClient, id: &str) -> Result<Vpc, CloudError> {
    let response = client.get(&client.url(&["vpcs", id])).await?;
    Ok(response.json::<VpcBody>()?.vpc)
}

/// `client` is a VPC v1 client
pub async fn get_subnet(client: &ServiceClient, id: &str) -> Result<Subnet, CloudError> {
    let response = client.get(&client.url(&["subnets", id])).await?;
    Ok(response.json::<SubnetBody>()?.subnet)
}

/// `client` is a networking v2.0 client
pub async fn create_route(
    client: &ServiceClient,
    opts: &CreateRouteOpts,
) -> Result<Route, CloudError> {
    debug!(?opts, "creating VPC route");
    let response = client
        .post(&client.url(&["vpc", "routes"]), json!({ "route": opts }))
        .await?;
    Ok(response.json::<RouteBody>()?.route)
}

pub async fn get_route(client: &ServiceClient, id: &str) -> Result<Route, CloudError> {
    let response = client.get(&client.url(&["vpc", "routes", id])).await?;
    Ok(response.json::<RouteBody>()?.route)
}

/// List the routes matching the filter
pub async fn list_routes(
    client: &ServiceClient,
    filter: &RouteFilter,
) -> Result<Vec<Route>, CloudError> {
    let url = client.url_with_query(&["vpc", "routes"], &filter.query())?;
    let response = client.get(&url).await?;
    let routes = response.json::<RoutesBody>()?.routes;
    Ok(routes
        .into_iter()
        .filter(|route| filter.matches(route))
        .collect())
}

pub async fn delete_route(client: &ServiceClient, id: &str) -> Result<(), CloudError> {
    client.delete(&client.url(&["vpc", "routes", id])).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::client::fake::{fake_session, FakeTransport};
    use crate::client::Method;

    #[tokio::test]
    async fn list_filters_routes() {
        let fake = Arc::new(FakeTransport::default());
        let client = ServiceClient::new(fake_session(&fake).await, "https://vpc.example.com/v2.0/");
        fake.respond(
            Method::Get,
            "/v2.0/vpc/routes",
            200,
            json!({"routes": [
                {"id": "r1", "type": "peering", "nexthop": "p1", "destination": "10.0.0.0/24", "vpc_id": "v1", "tenant_id": "t"},
                {"id": "r2", "type": "peering", "nexthop": "p2", "destination": "10.0.1.0/24", "vpc_id": "v2", "tenant_id": "t"},
            ]}),
        );
        let filter = RouteFilter {
            vpc_id: Some("v1".into()),
            ..Default::default()
        };
        let routes = list_routes(&client, &filter).await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].id, "r1");
        assert_eq!(
            fake.requests()[0].url,
            "https://vpc.example.com/v2.0/vpc/routes?vpc_id=v1"
        );
    }

    #[tokio::test]
    async fn create_wraps_route() {
        let fake = Arc::new(FakeTransport::default());
        let client = ServiceClient::new(fake_session(&fake).await, "https://vpc.example.com/v2.0/");
        fake.respond(
            Method::Post,
            "/v2.0/vpc/routes",
            201,
            json!({"route": {"id": "r9", "type": "peering", "nexthop": "p", "destination": "0.0.0.0/0", "vpc_id": "v"}}),
        );
        let opts = CreateRouteOpts {
            route_type: "peering".into(),
            nexthop: "p".into(),
            destination: "0.0.0.0/0".into(),
            vpc_id: "v".into(),
            tenant_id: None,
        };
        let route = create_route(&client, &opts).await.unwrap();
        assert_eq!(route.id, "r9");
        let body = fake.requests()[0].body.clone().unwrap();
        assert_eq!(body["route"]["type"], "peering");
        assert!(body["route"].get("tenant_id").is_none());
    }
}
