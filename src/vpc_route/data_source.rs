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

use async_trait::async_trait;
use tracing::debug;

use tf_provider::{schema::Schema, value::{ValueEmpty, ValueString}, DataSource, Diagnostics};

use crate::{
    provider::ConfigHandle,
    services::vpc::{list_routes, RouteFilter},
    utils::{report, WithSchema},
};

use super::state::RouteDataState;

#[derive(Debug, Default, Clone)]
pub struct VpcRouteDataSource {
    config: ConfigHandle,
}

impl VpcRouteDataSource {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }
}

fn filter(value: &ValueString<'_>) -> Option<String> {
    value
        .as_deref_option()
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[async_trait]
impl DataSource for VpcRouteDataSource {
    type State<'a> = RouteDataState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RouteDataState::schema())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let cloud = self.config.get(diags)?;
        let region = cloud.region(config.region.as_str()).to_owned();
        let client = cloud.networking_v2(&region);

        let route_filter = RouteFilter {
            id: filter(&config.id),
            vpc_id: filter(&config.vpc_id),
            route_type: filter(&config.route_type),
            destination: filter(&config.destination),
            tenant_id: filter(&config.tenant_id),
        };
        let routes = match list_routes(&client, &route_filter).await {
            Ok(routes) => routes,
            Err(err) => {
                report(diags, "Unable to retrieve vpc routes", err);
                return None;
            }
        };

        match routes.as_slice() {
            [] => {
                diags.root_error_short(
                    "Your query returned no results. Please change your search criteria and try again.",
                );
                None
            }
            [route] => {
                debug!(id = route.id, "retrieved vpc route");
                Some(RouteDataState::from_route(route, &region))
            }
            _ => {
                diags.root_error_short(
                    "Your query returned more than one result. Please try a more specific search criteria",
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::client::fake::{fake_session, FakeTransport};
    use crate::client::{Config, Method};

    async fn data_source(fake: &Arc<FakeTransport>) -> VpcRouteDataSource {
        let handle = ConfigHandle::default();
        handle.set(Config::new(
            "eu-west-0".into(),
            "example.com".into(),
            Default::default(),
            fake_session(fake).await,
        ));
        VpcRouteDataSource::new(handle)
    }

    fn route(id: &str, vpc_id: &str) -> serde_json::Value {
        json!({"id": id, "type": "peering", "nexthop": "peer-1", "destination": "192.168.0.0/16", "vpc_id": vpc_id, "tenant_id": "t-1"})
    }

    #[tokio::test]
    async fn single_match() {
        let fake = Arc::new(FakeTransport::default());
        fake.respond(
            Method::Get,
            "/v2.0/vpc/routes",
            200,
            json!({"routes": [route("r1", "v1"), route("r2", "v2")]}),
        );
        let source = data_source(&fake).await;
        let mut diags = Diagnostics::default();
        let config = RouteDataState {
            vpc_id: "v1".into(),
            ..Default::default()
        };
        let state = source
            .read(&mut diags, config, ValueEmpty::default())
            .await
            .unwrap();
        assert!(diags.errors.is_empty());
        assert_eq!(state.id.as_str(), "r1");
        assert_eq!(state.nexthop.as_str(), "peer-1");
        assert_eq!(state.region.as_str(), "eu-west-0");
        assert_eq!(
            fake.requests()[0].url,
            "https://vpc.eu-west-0.example.com/v2.0/vpc/routes?vpc_id=v1"
        );
    }

    #[tokio::test]
    async fn no_or_several_matches() {
        let fake = Arc::new(FakeTransport::default());
        fake.respond(
            Method::Get,
            "/v2.0/vpc/routes",
            200,
            json!({"routes": [route("r1", "v1"), route("r2", "v1")]}),
        );
        let source = data_source(&fake).await;

        let mut diags = Diagnostics::default();
        let config = RouteDataState {
            vpc_id: "v1".into(),
            ..Default::default()
        };
        assert!(source
            .read(&mut diags, config, ValueEmpty::default())
            .await
            .is_none());
        assert_eq!(diags.errors.len(), 1);
        assert!(diags.errors[0].summary.contains("more than one"));

        let mut diags = Diagnostics::default();
        let config = RouteDataState {
            vpc_id: "v3".into(),
            ..Default::default()
        };
        assert!(source
            .read(&mut diags, config, ValueEmpty::default())
            .await
            .is_none());
        assert!(diags.errors[0].summary.contains("no results"));
    }
}
