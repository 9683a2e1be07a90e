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

//! Conversions between the node pool state and the CCE API documents

use std::borrow::Cow;
use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use sha_crypt::{sha512_simple, CryptError, Sha512Params, ROUNDS_DEFAULT};
use thiserror::Error;

use tf_provider::value::{Value, ValueList, ValueMap, ValueNumber, ValueString};

use crate::{
    services::cce::{
        Autoscaling, Login, NodeNicSpec, NodePool, NodePoolMetadata, NodePoolSpec, NodeTemplate,
        PrimaryNic, ResourceTag, Taint, UpdateNodePool, UpdateNodePoolSpec, UpdateNodeTemplate,
        UserPassword, Volume, API_VERSION, NODE_POOL_KIND,
    },
    utils::optional_string,
};

use super::state::{NodePoolState, TaintState, VolumeState};

/// Labels set by CCE itself on every node
const SYSTEM_LABEL_PREFIX: &str = "cce.cloud.com/";
/// Tag added by CCE to the nodes it provisions
const SYSTEM_TAG: &str = "CCE-Dynamic-Provisioning-Node";

pub(super) const PRE_INSTALL: &str = "alpha.cce/preInstall";
pub(super) const POST_INSTALL: &str = "alpha.cce/postInstall";
pub(super) const MAX_PODS: &str = "maxPods";

#[derive(Debug, Error)]
#[error("cannot hash the node password: {0:?}")]
pub struct PasswordError(CryptError);

/// Salted SHA-512 crypt hash, the only form CCE accepts for the root password
fn hash_password(password: &str) -> Result<String, PasswordError> {
    let params = Sha512Params::new(ROUNDS_DEFAULT).map_err(PasswordError)?;
    sha512_simple(password, &params).map_err(PasswordError)
}

fn string(value: &ValueString<'_>) -> String {
    value.as_deref_option().unwrap_or_default().to_owned()
}

fn number(value: ValueNumber) -> i64 {
    value.unwrap_or_default()
}

fn string_map(value: &ValueMap<'_, ValueString<'_>>) -> BTreeMap<String, String> {
    value
        .iter()
        .flatten()
        .filter_map(|(key, value)| value.as_deref_option().map(|v| (key.to_string(), v.to_owned())))
        .collect()
}

fn value_map<'a>(
    prior: &ValueMap<'_, ValueString<'_>>,
    remote: BTreeMap<String, String>,
) -> ValueMap<'a, ValueString<'a>> {
    if remote.is_empty() && prior.is_null() {
        Value::Null
    } else {
        Value::Value(
            remote
                .into_iter()
                .map(|(key, value)| (Cow::Owned(key), ValueString::from(value)))
                .collect(),
        )
    }
}

fn volume(state: &Value<VolumeState<'_>>) -> Volume {
    match state {
        Value::Value(volume) => Volume {
            size: number(volume.size),
            volumetype: string(&volume.volumetype),
            extend_param: string(&volume.extend_param),
        },
        _ => Volume::default(),
    }
}

fn volume_state<'a>(prior: Option<&Value<VolumeState<'_>>>, volume: &Volume) -> Value<VolumeState<'a>> {
    let prior_param = prior
        .and_then(|prior| prior.as_ref_option())
        .map_or(Value::Null, |prior| prior.extend_param.clone());
    Value::Value(VolumeState {
        size: Value::Value(volume.size),
        volumetype: volume.volumetype.clone().into(),
        extend_param: optional_string(&prior_param, &volume.extend_param),
    })
}

fn user_tags(state: &NodePoolState<'_>) -> Vec<ResourceTag> {
    string_map(&state.tags)
        .into_iter()
        .map(|(key, value)| ResourceTag { key, value })
        .collect()
}

fn taints(state: &NodePoolState<'_>) -> Vec<Taint> {
    state
        .taints
        .iter()
        .flatten()
        .filter_map(|taint| taint.as_ref_option())
        .map(|taint| Taint {
            key: string(&taint.key),
            value: string(&taint.value),
            effect: string(&taint.effect),
        })
        .collect()
}

fn autoscaling(state: &NodePoolState<'_>) -> Autoscaling {
    Autoscaling {
        enable: state.scale_enable.unwrap_or_default(),
        min_node_count: number(state.min_node_count),
        max_node_count: number(state.max_node_count),
        scale_down_cooldown_time: number(state.scale_down_cooldown_time),
        priority: number(state.priority),
    }
}

fn extend_param(state: &NodePoolState<'_>) -> serde_json::Map<String, serde_json::Value> {
    let mut params = serde_json::Map::new();
    if let Value::Value(max_pods) = state.max_pods {
        params.insert(MAX_PODS.to_owned(), json!(max_pods));
    }
    for (key, script) in [(PRE_INSTALL, &state.preinstall), (POST_INSTALL, &state.postinstall)] {
        if let Some(script) = script.as_deref_option().filter(|script| !script.is_empty()) {
            params.insert(key.to_owned(), json!(STANDARD.encode(script)));
        }
    }
    params
}

impl<'a> NodePoolState<'a> {
    /// Node pool document sent at creation
    ///
    /// The password is hashed here, the state keeps it as configured.
    pub fn to_node_pool(&self) -> Result<NodePool, PasswordError> {
        let subnet_id = string(&self.subnet_id);
        let user_password = match self.password.as_deref_option() {
            Some(password) => Some(UserPassword {
                username: "root".to_owned(),
                password: hash_password(password)?,
            }),
            None => None,
        };
        Ok(NodePool {
            kind: NODE_POOL_KIND.to_owned(),
            api_version: API_VERSION.to_owned(),
            metadata: NodePoolMetadata {
                name: string(&self.name),
                uid: String::new(),
            },
            spec: NodePoolSpec {
                pool_type: string(&self.node_type),
                node_template: NodeTemplate {
                    flavor: string(&self.flavor_id),
                    az: string(&self.availability_zone),
                    os: string(&self.os),
                    login: Login {
                        ssh_key: string(&self.key_pair),
                        user_password,
                    },
                    root_volume: volume(&self.root_volume),
                    data_volumes: self.data_volumes.iter().flatten().map(volume).collect(),
                    count: 1,
                    billing_mode: 0,
                    node_nic_spec: (!subnet_id.is_empty()).then(|| NodeNicSpec {
                        primary_nic: PrimaryNic { subnet_id },
                    }),
                    extend_param: extend_param(self),
                    ecs_group_id: string(&self.ecs_group_id),
                    user_tags: user_tags(self),
                    k8s_tags: string_map(&self.labels),
                    taints: taints(self),
                },
                autoscaling: autoscaling(self),
                initial_node_count: number(self.initial_node_count),
            },
            status: Default::default(),
        })
    }

    /// Updatable fields of the node pool
    pub fn to_update(&self) -> UpdateNodePool {
        UpdateNodePool {
            kind: NODE_POOL_KIND.to_owned(),
            api_version: API_VERSION.to_owned(),
            metadata: NodePoolMetadata {
                name: string(&self.name),
                uid: String::new(),
            },
            spec: UpdateNodePoolSpec {
                initial_node_count: number(self.initial_node_count),
                autoscaling: autoscaling(self),
                node_template: UpdateNodeTemplate {
                    user_tags: user_tags(self),
                    k8s_tags: string_map(&self.labels),
                    taints: taints(self),
                },
            },
        }
    }

    /// Copy the attributes of a node pool retrieved from the cloud
    ///
    /// `password`, `max_pods` and the install scripts are not returned by the API and keep their value.
    pub fn set_node_pool(&mut self, pool: &NodePool, region: &str) {
        let template = &pool.spec.node_template;

        self.id = pool.metadata.uid.clone().into();
        self.region = region.to_owned().into();
        self.name = pool.metadata.name.clone().into();
        self.flavor_id = template.flavor.clone().into();
        self.initial_node_count = Value::Value(pool.spec.initial_node_count);
        self.availability_zone = template.az.clone().into();
        self.os = template.os.clone().into();
        self.key_pair = optional_string(&self.key_pair, &template.login.ssh_key);
        self.root_volume = volume_state(Some(&self.root_volume), &template.root_volume);
        let prior_volumes = self.data_volumes.as_ref_option();
        let data_volumes: ValueList<_> = Value::Value(
            template
                .data_volumes
                .iter()
                .enumerate()
                .map(|(i, data)| {
                    volume_state(prior_volumes.and_then(|prior| prior.get(i)), data)
                })
                .collect(),
        );
        self.data_volumes = data_volumes;
        self.subnet_id = template
            .node_nic_spec
            .as_ref()
            .map(|nic| nic.primary_nic.subnet_id.clone())
            .unwrap_or_default()
            .into();
        self.ecs_group_id = optional_string(&self.ecs_group_id, &template.ecs_group_id);
        if !pool.spec.pool_type.is_empty() {
            self.node_type = pool.spec.pool_type.clone().into();
        }

        let scaling = &pool.spec.autoscaling;
        self.scale_enable = Value::Value(scaling.enable);
        self.min_node_count = Value::Value(scaling.min_node_count);
        self.max_node_count = Value::Value(scaling.max_node_count);
        self.scale_down_cooldown_time = Value::Value(scaling.scale_down_cooldown_time);
        self.priority = Value::Value(scaling.priority);

        let labels = template
            .k8s_tags
            .iter()
            .filter(|(key, _)| !key.starts_with(SYSTEM_LABEL_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        self.labels = value_map(&self.labels, labels);
        let tags = template
            .user_tags
            .iter()
            .filter(|tag| tag.key != SYSTEM_TAG)
            .map(|tag| (tag.key.clone(), tag.value.clone()))
            .collect();
        self.tags = value_map(&self.tags, tags);

        let prior_taints = self.taints.as_ref_option();
        let taints: Vec<_> = template
            .taints
            .iter()
            .enumerate()
            .map(|(i, taint)| {
                let prior_value = prior_taints
                    .and_then(|prior| prior.get(i))
                    .and_then(|prior| prior.as_ref_option())
                    .map_or(Value::Null, |prior| prior.value.clone());
                Value::Value(TaintState {
                    key: taint.key.clone().into(),
                    value: optional_string(&prior_value, &taint.value),
                    effect: taint.effect.clone().into(),
                })
            })
            .collect();
        self.taints = if taints.is_empty() && self.taints.is_null() {
            Value::Null
        } else {
            Value::Value(taints)
        };

        self.status = pool.status.phase.clone().into();
        self.billing_mode = Value::Value(template.billing_mode);
        self.current_node_count = Value::Value(pool.status.current_node);
    }
}
