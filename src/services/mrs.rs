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

//! MapReduce service v1.1 clusters

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{lenient_i64, lenient_string};
use crate::client::{CloudError, ServiceClient};

#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateClusterOpts {
    pub billing_type: i64,
    pub data_center: String,
    pub master_node_num: i64,
    pub master_node_size: String,
    pub core_node_num: i64,
    pub core_node_size: String,
    pub available_zone_id: String,
    pub cluster_name: String,
    pub vpc: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub subnet_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster_version: String,
    pub cluster_type: i64,
    pub volume_type: String,
    pub volume_size: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub node_public_cert_name: String,
    pub safe_mode: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cluster_admin_secret: String,
    pub login_mode: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub log_collection: i64,
    pub component_list: Vec<ComponentOpts>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_jobs: Vec<JobOpts>,
}

impl Debug for CreateClusterOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateClusterOpts")
            .field("billing_type", &self.billing_type)
            .field("data_center", &self.data_center)
            .field("master_node_num", &self.master_node_num)
            .field("master_node_size", &self.master_node_size)
            .field("core_node_num", &self.core_node_num)
            .field("core_node_size", &self.core_node_size)
            .field("available_zone_id", &self.available_zone_id)
            .field("cluster_name", &self.cluster_name)
            .field("vpc", &self.vpc)
            .field("vpc_id", &self.vpc_id)
            .field("subnet_id", &self.subnet_id)
            .field("subnet_name", &self.subnet_name)
            .field("cluster_version", &self.cluster_version)
            .field("cluster_type", &self.cluster_type)
            .field("volume_type", &self.volume_type)
            .field("volume_size", &self.volume_size)
            .field("safe_mode", &self.safe_mode)
            .field("login_mode", &self.login_mode)
            .field("log_collection", &self.log_collection)
            .field("component_list", &self.component_list)
            .field("add_jobs", &self.add_jobs)
            .finish_non_exhaustive()
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComponentOpts {
    pub component_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobOpts {
    pub job_type: i64,
    pub job_name: String,
    pub jar_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub arguments: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub input: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub job_log: String,
    #[serde(skip_serializing_if = "is_false")]
    pub shutdown_cluster: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub file_action: String,
    pub submit_job_once_cluster_run: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hql: String,
    pub hive_script_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CreateClusterResult {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub result: bool,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cluster {
    pub cluster_id: String,
    pub cluster_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub master_node_num: String,
    #[serde(deserialize_with = "lenient_string")]
    pub core_node_num: String,
    pub cluster_state: String,
    #[serde(deserialize_with = "lenient_string")]
    pub create_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub update_at: String,
    #[serde(deserialize_with = "lenient_string")]
    pub billing_type: String,
    pub data_center: String,
    pub vpc: String,
    pub vpc_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub duration: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fee: String,
    pub hadoop_version: String,
    pub master_node_size: String,
    pub core_node_size: String,
    pub component_list: Vec<Component>,
    pub external_ip: String,
    pub external_alternate_ip: String,
    pub internal_ip: String,
    pub deployment_id: String,
    pub remark: String,
    pub order_id: String,
    pub az_id: String,
    pub az_name: String,
    pub master_node_product_id: String,
    pub master_node_spec_id: String,
    pub core_node_product_id: String,
    pub core_node_spec_id: String,
    pub instance_id: String,
    pub vnc: String,
    pub tenant_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub volume_size: i64,
    pub volume_type: String,
    pub subnet_id: String,
    pub subnet_name: String,
    pub security_groups_id: String,
    pub slave_security_groups_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub safe_mode: i64,
    pub cluster_version: String,
    pub node_public_cert_name: String,
    pub master_node_ip: String,
    pub private_ip_first: String,
    pub error_info: String,
    #[serde(deserialize_with = "lenient_string")]
    pub charging_start_time: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub log_collection: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub cluster_type: i64,
    pub master_data_volume_type: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub master_data_volume_size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Component {
    pub component_id: String,
    pub component_name: String,
    pub component_version: String,
    pub component_desc: String,
}

#[derive(Deserialize)]
struct ClusterBody {
    cluster: Cluster,
}

pub async fn create_cluster(
    client: &ServiceClient,
    opts: &CreateClusterOpts,
) -> Result<CreateClusterResult, CloudError> {
    debug!(?opts, "creating MRS cluster");
    let response = client
        .post(&client.url(&["run-job-flow"]), serde_json::to_value(opts)?)
        .await?;
    let result: CreateClusterResult = response.json()?;
    if result.cluster_id.is_empty() {
        return Err(CloudError::Http {
            status: response.status,
            expected: vec![response.status],
            method: crate::client::Method::Post,
            url: client.url(&["run-job-flow"]),
            body: format!("cluster creation was not accepted: {}", result.msg),
        });
    }
    Ok(result)
}

pub async fn get_cluster(client: &ServiceClient, id: &str) -> Result<Cluster, CloudError> {
    let response = client.get(&client.url(&["cluster_infos", id])).await?;
    Ok(response.json::<ClusterBody>()?.cluster)
}

pub async fn delete_cluster(client: &ServiceClient, id: &str) -> Result<(), CloudError> {
    client.delete(&client.url(&["clusters", id])).await?;
    Ok(())
}
