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

use std::time::Duration;

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
    client::{CloudError, ServiceClient},
    provider::ConfigHandle,
    services::cce::{
        create_node_pool, delete_node_pool, get_node_pool, update_node_pool, NodePool,
    },
    timeouts::{create_timeout, delete_timeout, update_timeout, TimeoutDefaults},
    utils::{changed_attributes, known, report, WithNormalize, WithSchema, WithValidate},
    wait::StateChangeConf,
};

use super::state::NodePoolState;
use super::validate::RANDOM_AZ;

const TIMEOUTS: TimeoutDefaults = TimeoutDefaults::minutes(20, 20, 20);
const POLL: Duration = Duration::from_secs(5);

#[derive(Debug, Default, Clone)]
pub struct CceNodePoolResource {
    config: ConfigHandle,
}

impl CceNodePoolResource {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }
}

/// Wait until the node pool has finished synchronizing
async fn wait_ready(
    client: &ServiceClient,
    cluster_id: &str,
    id: &str,
    timeout: Duration,
) -> Result<NodePool, CloudError> {
    StateChangeConf::new(&["Synchronizing"], &["Synchronized"], timeout)
        .delay(POLL)
        .poll_interval(POLL)
        .wait_for_state(|| async move {
            match get_node_pool(client, cluster_id, id).await {
                Ok(pool) => {
                    let phase = pool.phase().to_owned();
                    Ok(Some((pool, phase)))
                }
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        })
        .await
}

#[async_trait]
impl Resource for CceNodePoolResource {
    type State<'a> = Value<NodePoolState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(NodePoolState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if let Value::Value(config) = config {
            config.validate(diags, AttributePath::default()).await;
        }
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
        let client = cloud.cce_v3(&region);

        match get_node_pool(&client, state.cluster_id.as_str(), state.id.as_str()).await {
            Ok(pool) => {
                debug!(?pool, "retrieved node pool");
                state.set_node_pool(&pool, &region);
                Some((Value::Value(state), private_state))
            }
            Err(err) if err.is_not_found() => {
                info!(id = state.id.as_str(), "node pool is gone, removing it from the state");
                Some((Value::Null, private_state))
            }
            Err(err) => {
                report(diags, "Error retrieving node pool", err);
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            state.normalize(diags);
            state.id = Value::Unknown;
            state.status = Value::Unknown;
            state.billing_mode = Value::Unknown;
            state.current_node_count = Value::Unknown;
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
        let mut proposed = known(diags, proposed_state)?;
        proposed.normalize(diags);
        // `random` resolves to the zone picked by CCE
        if proposed.availability_zone.as_deref_option() == Some(RANDOM_AZ)
            && prior.availability_zone.is_value()
        {
            proposed.availability_zone = prior.availability_zone.clone();
        }

        let replace = changed_attributes!(
            prior,
            proposed,
            [
                region,
                cluster_id,
                flavor_id,
                availability_zone,
                os,
                key_pair,
                password,
                root_volume,
                data_volumes,
                subnet_id,
                ecs_group_id,
                max_pods,
                preinstall,
                postinstall,
                node_type as "type",
            ]
        );
        let updated = changed_attributes!(
            prior,
            proposed,
            [
                name,
                initial_node_count,
                scale_enable,
                min_node_count,
                max_node_count,
                scale_down_cooldown_time,
                priority,
                labels,
                tags,
                taints,
            ]
        );
        if !updated.is_empty() {
            proposed.status = Value::Unknown;
            proposed.current_node_count = Value::Unknown;
        }
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
        let client = cloud.cce_v3(&region);
        let cluster_id = state.cluster_id.as_str().to_owned();

        let pool = match state.to_node_pool() {
            Ok(pool) => pool,
            Err(err) => {
                diags.root_error("Error building node pool", err.to_string());
                return None;
            }
        };
        let created = match create_node_pool(&client, &cluster_id, &pool).await {
            Ok(pool) => pool,
            Err(err) => {
                report(diags, "Error creating node pool", err);
                return None;
            }
        };
        let id = created.metadata.uid.clone();
        info!(cluster_id, id, "node pool created, waiting for it to be ready");

        let timeout = create_timeout(&state.timeouts, TIMEOUTS);
        match wait_ready(&client, &cluster_id, &id, timeout).await {
            Ok(pool) => state.set_node_pool(&pool, &region),
            Err(err) => {
                report(diags, "Error waiting for node pool to become ready", err);
                // The pool exists: keep it tracked from the creation response
                state.set_node_pool(&created, &region);
            }
        }
        Some((Value::Value(state), planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = known(diags, planned_state)?;
        let cloud = self.config.get(diags)?;
        let region = cloud.region(state.region.as_str()).to_owned();
        let client = cloud.cce_v3(&region);
        let cluster_id = state.cluster_id.as_str().to_owned();
        let id = state.id.as_str().to_owned();

        if let Err(err) = update_node_pool(&client, &cluster_id, &id, &state.to_update()).await {
            report(diags, "Error updating node pool", err);
            return None;
        }
        info!(cluster_id, id, "node pool updated, waiting for it to be ready");

        let timeout = update_timeout(&state.timeouts, TIMEOUTS);
        match wait_ready(&client, &cluster_id, &id, timeout).await {
            Ok(pool) => {
                state.set_node_pool(&pool, &region);
                Some((Value::Value(state), planned_private_state))
            }
            Err(err) => {
                report(diags, "Error waiting for node pool to become ready", err);
                None
            }
        }
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
        let client = &cloud.cce_v3(state.region.as_str());
        let cluster_id = state.cluster_id.as_str();
        let id = state.id.as_str();

        match delete_node_pool(client, cluster_id, id).await {
            Ok(()) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                report(diags, "Error deleting node pool", err);
                return None;
            }
        }

        // The phase can still be empty right after the deletion request
        let conf = StateChangeConf::new(
            &["Deleting", "Synchronized"],
            &["Deleted"],
            delete_timeout(&state.timeouts, TIMEOUTS),
        )
        .delay(POLL)
        .poll_interval(POLL);
        let waited = conf
            .wait_for_state(|| async move {
                match get_node_pool(client, cluster_id, id).await {
                    Ok(pool) => Ok(Some(((), pool.phase().to_owned()))),
                    Err(err) if err.is_not_found() => Ok(Some(((), "Deleted".to_owned()))),
                    Err(err) => Err(err),
                }
            })
            .await;
        if let Err(err) = waited {
            report(diags, "Error waiting for node pool to be deleted", err);
            return None;
        }
        info!(cluster_id, id, "node pool deleted");
        Some(())
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some((cluster_id, id)) = id.split_once('/').filter(|(cluster_id, id)| {
            !cluster_id.is_empty() && !id.is_empty()
        }) else {
            diags.root_error(
                "Invalid import id",
                format!("Expected `<cluster_id>/<id>`, got `{id}`"),
            );
            return None;
        };
        let state = NodePoolState {
            id: ValueString::from(id.to_owned()),
            cluster_id: ValueString::from(cluster_id.to_owned()),
            ..Default::default()
        };
        Some((Value::Value(state), Default::default()))
    }
}
