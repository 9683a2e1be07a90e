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
use tracing::{debug, info};

use tf_provider::{
    schema::Schema,
    value::{Value, ValueEmpty, ValueString},
    AttributePath,
    Diagnostics,
    Resource,
};

use crate::{
    provider::ConfigHandle,
    services::vpc::{create_route, delete_route, get_route, CreateRouteOpts},
    timeouts::{delete_timeout, validate_timeouts, TimeoutDefaults},
    utils::{changed_attributes, known, report, unknown_if_null, WithSchema},
    wait::StateChangeConf,
};

use super::state::RouteState;

const TIMEOUTS: TimeoutDefaults = TimeoutDefaults::minutes(10, 10, 10);

#[derive(Debug, Default, Clone)]
pub struct VpcRouteResource {
    config: ConfigHandle,
}

impl VpcRouteResource {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Resource for VpcRouteResource {
    type State<'a> = Value<RouteState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(RouteState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        let Value::Value(config) = config else {
            return Some(());
        };
        if let Value::Value(route_type) = &config.route_type {
            if route_type != "peering" {
                diags.error(
                    "Invalid route type",
                    format!("Only `peering` routes are supported, got `{route_type}`"),
                    AttributePath::new("type"),
                );
            }
        }
        validate_timeouts(diags, &config.timeouts, AttributePath::new("timeouts"));
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = known(diags, state)?;
        let cloud = self.config.get(diags)?;
        let region = cloud.region(state.region.as_str()).to_owned();
        let client = cloud.networking_v2(&region);

        match get_route(&client, state.id.as_str()).await {
            Ok(route) => {
                debug!(?route, "retrieved vpc route");
                state.set_route(&route, &region);
                Some((Value::Value(state), private_state))
            }
            Err(err) if err.is_not_found() => {
                info!(id = state.id.as_str(), "vpc route is gone, removing it from the state");
                Some((Value::Null, private_state))
            }
            Err(err) => {
                report(diags, "Error retrieving vpc route", err);
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            state.id = Value::Unknown;
            unknown_if_null(&mut state.region);
            unknown_if_null(&mut state.tenant_id);
        }
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let prior = known(diags, prior_state)?;
        let proposed = known(diags, proposed_state)?;
        let replace = changed_attributes!(
            prior,
            proposed,
            [region, route_type as "type", nexthop, destination, vpc_id, tenant_id]
        );
        Some((Value::Value(proposed), prior_private_state, replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = known(diags, planned_state)?;
        let cloud = self.config.get(diags)?;
        let region = cloud.region(state.region.as_deref_option().unwrap_or_default()).to_owned();
        let client = cloud.networking_v2(&region);

        let opts = CreateRouteOpts {
            route_type: state.route_type.as_str().to_owned(),
            nexthop: state.nexthop.as_str().to_owned(),
            destination: state.destination.as_str().to_owned(),
            vpc_id: state.vpc_id.as_str().to_owned(),
            tenant_id: state
                .tenant_id
                .as_deref_option()
                .filter(|tenant| !tenant.is_empty())
                .map(str::to_owned),
        };
        let created = match create_route(&client, &opts).await {
            Ok(route) => route,
            Err(err) => {
                report(diags, "Error creating vpc route", err);
                return None;
            }
        };
        info!(id = created.id, "vpc route created");

        match get_route(&client, &created.id).await {
            Ok(route) => state.set_route(&route, &region),
            Err(err) => {
                report(diags, "Error retrieving vpc route", err);
                state.set_route(&created, &region);
            }
        }
        Some((Value::Value(state), planned_private_state))
    }

    async fn update<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        // Every route attribute forces a replacement, only timeouts can change here
        Some((planned_state, planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let state = known(diags, prior_state)?;
        let cloud = self.config.get(diags)?;
        let client = cloud.networking_v2(state.region.as_str());
        let id = state.id.as_str();

        match delete_route(&client, id).await {
            Ok(()) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                report(diags, "Error deleting vpc route", err);
                return None;
            }
        }

        let client = &client;
        let conf = StateChangeConf::new(
            &["ACTIVE"],
            &["DELETED"],
            delete_timeout(&state.timeouts, TIMEOUTS),
        );
        let waited = conf
            .wait_for_state(|| async move {
                match get_route(client, id).await {
                    Ok(_) => Ok(Some(((), "ACTIVE".to_owned()))),
                    Err(err) if err.is_not_found() => Ok(Some(((), "DELETED".to_owned()))),
                    Err(err) => Err(err),
                }
            })
            .await;
        if let Err(err) = waited {
            report(diags, "Error waiting for vpc route to be deleted", err);
            return None;
        }
        info!(id, "vpc route deleted");
        Some(())
    }

    async fn import<'a>(
        &self,
        _diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = RouteState {
            id: ValueString::from(id),
            ..Default::default()
        };
        Some((Value::Value(state), Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::client::fake::{fake_session, FakeTransport};
    use crate::client::{Config, Method};

    async fn resource(fake: &Arc<FakeTransport>) -> VpcRouteResource {
        let handle = ConfigHandle::default();
        handle.set(Config::new(
            "eu-west-0".into(),
            "example.com".into(),
            Default::default(),
            fake_session(fake).await,
        ));
        VpcRouteResource::new(handle)
    }

    fn planned() -> RouteState<'static> {
        RouteState {
            id: Value::Unknown,
            region: Value::Unknown,
            route_type: "peering".into(),
            nexthop: "peer-1".into(),
            destination: "192.168.0.0/16".into(),
            vpc_id: "v1".into(),
            tenant_id: Value::Unknown,
            timeouts: Value::Null,
        }
    }

    #[tokio::test]
    async fn create_then_read() {
        let fake = Arc::new(FakeTransport::default());
        let route = json!({"route": {"id": "r1", "type": "peering", "nexthop": "peer-1", "destination": "192.168.0.0/16", "vpc_id": "v1", "tenant_id": "t-1"}});
        fake.respond(Method::Post, "/v2.0/vpc/routes", 200, route.clone());
        fake.respond(Method::Get, "/v2.0/vpc/routes/r1", 200, route);
        let resource = resource(&fake).await;

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                Value::Value(planned()),
                Value::Null,
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        let state = state.unwrap();
        assert_eq!(state.id.as_str(), "r1");
        assert_eq!(state.region.as_str(), "eu-west-0");
        assert_eq!(state.tenant_id.as_str(), "t-1");
        let body = fake.requests_to(Method::Post, "/v2.0/vpc/routes")[0]
            .body
            .clone()
            .unwrap();
        assert!(body["route"].get("tenant_id").is_none());
    }

    #[tokio::test]
    async fn created_route_kept_when_read_fails() {
        let fake = Arc::new(FakeTransport::default());
        let route = json!({"route": {"id": "r1", "type": "peering", "nexthop": "peer-1", "destination": "192.168.0.0/16", "vpc_id": "v1", "tenant_id": "t-1"}});
        fake.respond(Method::Post, "/v2.0/vpc/routes", 200, route);
        fake.respond(Method::Get, "/v2.0/vpc/routes/r1", 500, json!({"message": "boom"}));
        let resource = resource(&fake).await;

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .create(
                &mut diags,
                Value::Value(planned()),
                Value::Null,
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert_eq!(diags.errors.len(), 1);
        let state = state.unwrap();
        assert_eq!(state.id.as_str(), "r1");
        assert_eq!(state.tenant_id.as_str(), "t-1");
    }

    #[tokio::test]
    async fn read_removes_missing_route() {
        let fake = Arc::new(FakeTransport::default());
        fake.respond(Method::Get, "/v2.0/vpc/routes/r1", 404, json!({}));
        let resource = resource(&fake).await;
        let mut state = planned();
        state.id = "r1".into();

        let mut diags = Diagnostics::default();
        let (state, _) = resource
            .read(&mut diags, Value::Value(state), Default::default(), Default::default())
            .await
            .unwrap();
        assert!(state.is_null());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn every_attribute_forces_replacement() {
        let fake = Arc::new(FakeTransport::default());
        let resource = resource(&fake).await;
        let mut prior = planned();
        prior.id = "r1".into();
        let mut proposed = prior.clone();
        proposed.destination = "10.0.0.0/8".into();

        let mut diags = Diagnostics::default();
        let (_, _, replace) = resource
            .plan_update(
                &mut diags,
                Value::Value(prior),
                Value::Value(proposed),
                Value::Null,
                Default::default(),
                Default::default(),
            )
            .await
            .unwrap();
        assert_eq!(replace, vec![AttributePath::new("destination")]);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_waits_for_deletion() {
        let fake = Arc::new(FakeTransport::default());
        fake.respond_empty(Method::Delete, "/v2.0/vpc/routes/r1", 204);
        fake.respond(Method::Get, "/v2.0/vpc/routes/r1", 200, json!({"route": {"id": "r1"}}));
        fake.respond(Method::Get, "/v2.0/vpc/routes/r1", 404, json!({}));
        let resource = resource(&fake).await;
        let mut state = planned();
        state.id = "r1".into();
        state.region = "eu-west-0".into();

        let mut diags = Diagnostics::default();
        assert!(resource
            .destroy(
                &mut diags,
                Value::Value(state),
                Default::default(),
                Default::default(),
            )
            .await
            .is_some());
        assert_eq!(fake.requests_to(Method::Get, "/v2.0/vpc/routes/r1").len(), 2);
    }

    #[tokio::test]
    async fn only_peering_routes() {
        let resource = VpcRouteResource::default();
        let mut config = planned();
        config.route_type = "local".into();
        let mut diags = Diagnostics::default();
        assert!(resource
            .validate(&mut diags, Value::Value(config))
            .await
            .is_none());
        assert_eq!(diags.errors[0].attribute, AttributePath::new("type"));
    }
}
