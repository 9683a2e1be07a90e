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
    services::{
        mrs::{create_cluster, delete_cluster, get_cluster, Cluster},
        vpc::{get_subnet, get_vpc},
    },
    timeouts::{create_timeout, delete_timeout, TimeoutDefaults},
    utils::{changed_attributes, known, report, WithNormalize, WithSchema, WithValidate},
    wait::StateChangeConf,
};

use super::state::ClusterState;

const TIMEOUTS: TimeoutDefaults = TimeoutDefaults::minutes(60, 60, 20);
const TERMINATED: &str = "terminated";

#[derive(Debug, Default, Clone)]
pub struct MrsClusterResource {
    config: ConfigHandle,
}

impl MrsClusterResource {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }
}

/// Wait for a new cluster to leave the `starting` state
async fn wait_running(
    client: &ServiceClient,
    id: &str,
    timeout: Duration,
) -> Result<Cluster, CloudError> {
    StateChangeConf::new(&["starting"], &["running"], timeout)
        .delay(Duration::from_secs(600))
        .poll_interval(Duration::from_secs(20))
        .wait_for_state(|| async move {
            match get_cluster(client, id).await {
                Ok(cluster) => {
                    let state = cluster.cluster_state.clone();
                    Ok(Some((cluster, state)))
                }
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        })
        .await
}

#[async_trait]
impl Resource for MrsClusterResource {
    type State<'a> = Value<ClusterState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ClusterState::schema())
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
        let client = cloud.mrs_v1(&region);

        let cluster = match get_cluster(&client, state.id.as_str()).await {
            Ok(cluster) => cluster,
            Err(err) if err.is_not_found() => {
                info!(id = state.id.as_str(), "cluster is gone, removing it from the state");
                return Some((Value::Null, private_state));
            }
            Err(err) => {
                report(diags, "Error retrieving MRS cluster", err);
                return None;
            }
        };
        if cluster.cluster_state == TERMINATED {
            info!(id = state.id.as_str(), "cluster is terminated, removing it from the state");
            return Some((Value::Null, private_state));
        }
        debug!(id = cluster.cluster_id, state = cluster.cluster_state, "retrieved cluster");

        if let Err(err) = state.set_cluster(&cluster, &region) {
            diags.root_error("Error reading MRS cluster", err.to_string());
            return None;
        }
        Some((Value::Value(state), private_state))
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
            state.unknown_computed();
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

        // Only the timeouts can change in place
        let replace = changed_attributes!(
            prior,
            proposed,
            [
                region,
                master_node_num,
                master_node_size,
                core_node_num,
                core_node_size,
                available_zone_id,
                cluster_name,
                vpc_id,
                subnet_id,
                billing_type,
                cluster_version,
                cluster_type,
                volume_type,
                volume_size,
                node_public_cert_name,
                safe_mode,
                cluster_admin_secret,
                log_collection,
                component_list,
                add_jobs,
            ]
        );
        if !replace.is_empty() {
            proposed.unknown_computed();
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
        let client = cloud.mrs_v1(&region);
        let vpc_client = cloud.vpc_v1(&region);

        let vpc = match get_vpc(&vpc_client, state.vpc_id.as_str()).await {
            Ok(vpc) => vpc,
            Err(err) => {
                report(diags, "Error retrieving the cluster VPC", err);
                return None;
            }
        };
        let subnet = match get_subnet(&vpc_client, state.subnet_id.as_str()).await {
            Ok(subnet) => subnet,
            Err(err) => {
                report(diags, "Error retrieving the cluster subnet", err);
                return None;
            }
        };

        let opts = state.to_create_opts(&region, &vpc.name, &subnet.name);
        let created = match create_cluster(&client, &opts).await {
            Ok(created) => created,
            Err(err) => {
                report(diags, "Error creating MRS cluster", err);
                return None;
            }
        };
        let id = created.cluster_id;
        info!(id, "cluster created, waiting for it to run");

        let timeout = create_timeout(&state.timeouts, TIMEOUTS);
        match wait_running(&client, &id, timeout).await {
            Ok(cluster) => {
                if let Err(err) = state.set_cluster(&cluster, &region) {
                    diags.root_error("Error reading MRS cluster", err.to_string());
                    state.set_created(&id, &region);
                }
            }
            Err(err) => {
                report(diags, "Error waiting for MRS cluster to become ready", err);
                state.set_created(&id, &region);
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
        let client = &cloud.mrs_v1(state.region.as_str());
        let id = state.id.as_str();

        match get_cluster(client, id).await {
            Ok(cluster) if cluster.cluster_state == TERMINATED => return Some(()),
            Ok(_) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                report(diags, "Error retrieving MRS cluster", err);
                return None;
            }
        }
        match delete_cluster(client, id).await {
            Ok(()) => (),
            Err(err) if err.is_not_found() => return Some(()),
            Err(err) => {
                report(diags, "Error deleting MRS cluster", err);
                return None;
            }
        }

        let waited = StateChangeConf::new(
            &["running", "terminating"],
            &[TERMINATED, "DELETED"],
            delete_timeout(&state.timeouts, TIMEOUTS),
        )
        .delay(Duration::from_secs(40))
        .poll_interval(Duration::from_secs(10))
        .wait_for_state(|| async move {
            match get_cluster(client, id).await {
                Ok(cluster) => Ok(Some(((), cluster.cluster_state))),
                Err(err) if err.is_not_found() => Ok(Some(((), "DELETED".to_owned()))),
                Err(err) => Err(err),
            }
        })
        .await;
        if let Err(err) = waited {
            report(diags, "Error waiting for MRS cluster to be deleted", err);
            return None;
        }
        info!(id, "cluster deleted");
        Some(())
    }

    async fn import<'a>(
        &self,
        _diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = ClusterState {
            id: ValueString::from(id),
            ..Default::default()
        };
        Some((Value::Value(state), Default::default()))
    }
}
