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

//! Cloud container engine v3 node pools

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{CloudError, ServiceClient};

pub const NODE_POOL_KIND: &str = "NodePool";
pub const API_VERSION: &str = "v3";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePool {
    #[serde(default)]
    pub kind: String,
    #[serde(rename = "apiVersion", alias = "apiversion", default)]
    pub api_version: String,
    #[serde(default)]
    pub metadata: NodePoolMetadata,
    #[serde(default)]
    pub spec: NodePoolSpec,
    #[serde(default, skip_serializing)]
    pub status: NodePoolStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolSpec {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub pool_type: String,
    #[serde(default)]
    pub node_template: NodeTemplate,
    #[serde(default)]
    pub autoscaling: Autoscaling,
    #[serde(default)]
    pub initial_node_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub az: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub os: String,
    #[serde(default)]
    pub login: Login,
    #[serde(default)]
    pub root_volume: Volume,
    #[serde(default)]
    pub data_volumes: Vec<Volume>,
    #[serde(default)]
    pub count: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub billing_mode: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_nic_spec: Option<NodeNicSpec>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extend_param: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ecs_group_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_tags: Vec<ResourceTag>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub k8s_tags: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<Taint>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Login {
    #[serde(rename = "sshKey", default, skip_serializing_if = "String::is_empty")]
    pub ssh_key: String,
    #[serde(
        rename = "userPassword",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub user_password: Option<UserPassword>,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPassword {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Debug for UserPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPassword")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub volumetype: String,
    #[serde(
        rename = "extendParam",
        default,
        skip_serializing_if = "String::is_empty",
        deserialize_with = "super::lenient_string"
    )]
    pub extend_param: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeNicSpec {
    #[serde(default)]
    pub primary_nic: PrimaryNic,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryNic {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnet_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Autoscaling {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub min_node_count: i64,
    #[serde(default)]
    pub max_node_count: i64,
    #[serde(default)]
    pub scale_down_cooldown_time: i64,
    #[serde(default)]
    pub priority: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolStatus {
    #[serde(default)]
    pub current_node: i64,
    #[serde(default)]
    pub phase: String,
}

impl NodePool {
    /// Phase used while waiting: an empty phase means the pool is ready
    pub fn phase(&self) -> &str {
        if self.status.phase.is_empty() {
            "Synchronized"
        } else {
            &self.status.phase
        }
    }
}

/// Fields of a node pool that can be updated in place
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodePool {
    pub kind: String,
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub metadata: NodePoolMetadata,
    pub spec: UpdateNodePoolSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodePoolSpec {
    pub initial_node_count: i64,
    pub autoscaling: Autoscaling,
    pub node_template: UpdateNodeTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeTemplate {
    pub user_tags: Vec<ResourceTag>,
    pub k8s_tags: BTreeMap<String, String>,
    pub taints: Vec<Taint>,
}

pub async fn create_node_pool(
    client: &ServiceClient,
    cluster_id: &str,
    pool: &NodePool,
) -> Result<NodePool, CloudError> {
    debug!(cluster_id, name = pool.metadata.name, "creating node pool");
    let response = client
        .post(
            &client.url(&["clusters", cluster_id, "nodepools"]),
            serde_json::to_value(pool)?,
        )
        .await?;
    response.json()
}

pub async fn get_node_pool(
    client: &ServiceClient,
    cluster_id: &str,
    id: &str,
) -> Result<NodePool, CloudError> {
    let response = client
        .get(&client.url(&["clusters", cluster_id, "nodepools", id]))
        .await?;
    response.json()
}

pub async fn update_node_pool(
    client: &ServiceClient,
    cluster_id: &str,
    id: &str,
    update: &UpdateNodePool,
) -> Result<NodePool, CloudError> {
    debug!(cluster_id, id, ?update, "updating node pool");
    let response = client
        .put(
            &client.url(&["clusters", cluster_id, "nodepools", id]),
            serde_json::to_value(update)?,
        )
        .await?;
    response.json()
}

pub async fn delete_node_pool(
    client: &ServiceClient,
    cluster_id: &str,
    id: &str,
) -> Result<(), CloudError> {
    client
        .delete(&client.url(&["clusters", cluster_id, "nodepools", id]))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn node_pool_document() {
        let pool: NodePool = serde_json::from_value(json!({
            "kind": "NodePool",
            "apiVersion": "v3",
            "metadata": {"name": "pool", "uid": "np-1"},
            "spec": {
                "type": "vm",
                "initialNodeCount": 2,
                "nodeTemplate": {
                    "flavor": "s3.large.2",
                    "az": "eu-west-0a",
                    "login": {"sshKey": "kp"},
                    "rootVolume": {"size": 40, "volumetype": "SATA"},
                    "dataVolumes": [{"size": 100, "volumetype": "SSD"}],
                    "k8sTags": {"app": "web"},
                    "extendParam": {"maxPods": 110},
                },
                "autoscaling": {"enable": true, "minNodeCount": 1, "maxNodeCount": 5},
            },
            "status": {"currentNode": 2, "phase": ""},
        }))
        .unwrap();
        assert_eq!(pool.metadata.uid, "np-1");
        assert_eq!(pool.spec.node_template.data_volumes[0].size, 100);
        assert_eq!(pool.spec.autoscaling.max_node_count, 5);
        assert_eq!(pool.phase(), "Synchronized");

        let body = serde_json::to_value(&pool).unwrap();
        assert!(body.get("status").is_none());
        assert_eq!(body["spec"]["nodeTemplate"]["k8sTags"]["app"], "web");
        assert!(body["spec"]["nodeTemplate"].get("userTags").is_none());
    }
}
