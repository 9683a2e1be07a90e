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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tf_provider::{
    map,
    schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema},
    value::{self, Value, ValueBool, ValueList, ValueNumber, ValueString},
};

use crate::{
    timeouts::{timeouts_block, Timeouts},
    utils::{attribute, sensitive, WithSchema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClusterState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub master_node_num: ValueNumber,
    pub master_node_size: ValueString<'a>,
    pub core_node_num: ValueNumber,
    pub core_node_size: ValueString<'a>,
    pub available_zone_id: ValueString<'a>,
    pub cluster_name: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub subnet_id: ValueString<'a>,
    pub billing_type: ValueNumber,
    pub cluster_version: ValueString<'a>,
    pub cluster_type: ValueNumber,
    pub volume_type: ValueString<'a>,
    pub volume_size: ValueNumber,
    pub node_public_cert_name: ValueString<'a>,
    pub safe_mode: ValueNumber,
    pub cluster_admin_secret: ValueString<'a>,
    pub log_collection: ValueNumber,
    pub component_list: ValueList<Value<ComponentState<'a>>>,
    pub add_jobs: ValueList<Value<JobState<'a>>>,

    pub order_id: ValueString<'a>,
    pub cluster_id: ValueString<'a>,
    pub available_zone_name: ValueString<'a>,
    pub instance_id: ValueString<'a>,
    pub hadoop_version: ValueString<'a>,
    pub master_node_ip: ValueString<'a>,
    pub external_ip: ValueString<'a>,
    pub private_ip_first: ValueString<'a>,
    pub internal_ip: ValueString<'a>,
    pub slave_security_groups_id: ValueString<'a>,
    pub security_groups_id: ValueString<'a>,
    pub external_alternate_ip: ValueString<'a>,
    pub master_node_spec_id: ValueString<'a>,
    pub core_node_spec_id: ValueString<'a>,
    pub master_node_product_id: ValueString<'a>,
    pub core_node_product_id: ValueString<'a>,
    pub vnc: ValueString<'a>,
    pub fee: ValueString<'a>,
    pub deployment_id: ValueString<'a>,
    pub cluster_state: ValueString<'a>,
    pub error_info: ValueString<'a>,
    pub remark: ValueString<'a>,
    pub tenant_id: ValueString<'a>,
    pub update_at: ValueString<'a>,
    pub create_at: ValueString<'a>,
    pub charging_start_time: ValueString<'a>,
    pub duration: ValueString<'a>,

    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ComponentState<'a> {
    #[serde(borrow = "'a")]
    pub component_name: ValueString<'a>,
    pub component_id: ValueString<'a>,
    pub component_version: ValueString<'a>,
    pub component_desc: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobState<'a> {
    pub job_type: ValueNumber,
    #[serde(borrow = "'a")]
    pub job_name: ValueString<'a>,
    pub jar_path: ValueString<'a>,
    pub arguments: ValueString<'a>,
    pub input: ValueString<'a>,
    pub output: ValueString<'a>,
    pub job_log: ValueString<'a>,
    pub shutdown_cluster: ValueBool,
    pub file_action: ValueString<'a>,
    pub submit_job_once_cluster_run: ValueBool,
    pub hql: ValueString<'a>,
    pub hive_script_path: ValueString<'a>,
}

/// Attributes read from the cluster description
const COMPUTED: [(&str, &str); 27] = [
    ("order_id", "Order ID of the cluster"),
    ("cluster_id", "ID of the cluster"),
    ("available_zone_name", "Name of the availability zone"),
    ("instance_id", "Instance ID of the cluster"),
    ("hadoop_version", "Hadoop version of the cluster"),
    ("master_node_ip", "IP address of the master node"),
    ("external_ip", "External IP address of the cluster"),
    ("private_ip_first", "Primary private IP address"),
    ("internal_ip", "Internal IP address of the cluster"),
    ("slave_security_groups_id", "Security group of the core nodes"),
    ("security_groups_id", "Security group of the master nodes"),
    ("external_alternate_ip", "Backup external IP address"),
    ("master_node_spec_id", "Specification ID of the master nodes"),
    ("core_node_spec_id", "Specification ID of the core nodes"),
    ("master_node_product_id", "Product ID of the master nodes"),
    ("core_node_product_id", "Product ID of the core nodes"),
    ("vnc", "URI for remotely logging into the cluster"),
    ("fee", "Cluster creation fee"),
    ("deployment_id", "Deployment ID of the cluster"),
    ("cluster_state", "Status of the cluster"),
    ("error_info", "Error message of the cluster"),
    ("remark", "Remarks of the cluster"),
    ("tenant_id", "Project ID of the cluster"),
    ("update_at", "Last update time of the cluster"),
    ("create_at", "Creation time of the cluster"),
    ("charging_start_time", "Start time of the billing"),
    ("duration", "Cluster subscription duration"),
];

fn arguments() -> HashMap<String, Attribute> {
    use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
    map! {
        "id" => attribute(AttributeType::String, Computed, "ID of the cluster"),
        "region" => attribute(AttributeType::String, OptionalComputed, "Region of the cluster, defaults to the provider region"),
        "master_node_num" => attribute(AttributeType::Number, Required, "Number of master nodes"),
        "master_node_size" => attribute(AttributeType::String, Required, "Flavor of the master nodes"),
        "core_node_num" => attribute(AttributeType::Number, Required, "Number of core nodes, from 3 to 100"),
        "core_node_size" => attribute(AttributeType::String, Required, "Flavor of the core nodes"),
        "available_zone_id" => attribute(AttributeType::String, Required, "ID of the availability zone"),
        "cluster_name" => attribute(AttributeType::String, Required, "Name of the cluster"),
        "vpc_id" => attribute(AttributeType::String, Required, "VPC of the cluster"),
        "subnet_id" => attribute(AttributeType::String, Required, "Subnet of the cluster"),
        "billing_type" => attribute(AttributeType::Number, OptionalComputed, "Billing type, 12 by default"),
        "cluster_version" => attribute(AttributeType::String, OptionalComputed, "Version of the cluster"),
        "cluster_type" => attribute(AttributeType::Number, OptionalComputed, "Type of the cluster: 0 for analysis, 1 for streaming"),
        "volume_type" => attribute(AttributeType::String, Required, "Type of the data disks: SATA or SSD"),
        "volume_size" => attribute(AttributeType::Number, Required, "Size of the data disk of each node in GB"),
        "node_public_cert_name" => attribute(AttributeType::String, Required, "Key pair used to log into the nodes"),
        "safe_mode" => attribute(AttributeType::Number, Required, "1 for Kerberos authentication, 0 otherwise"),
        "cluster_admin_secret" => sensitive(attribute(AttributeType::String, Optional, "Password of the cluster administrator")),
        "log_collection" => attribute(AttributeType::Number, OptionalComputed, "Whether logs are collected when the cluster fails"),
    }
}

impl<'a> WithSchema for ClusterState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, OptionalComputed, Required};

        let mut attributes = arguments();
        for (name, description) in COMPUTED {
            attributes.insert(
                name.to_owned(),
                attribute(AttributeType::String, Computed, description),
            );
        }

        let job_string =
            |description: &str| attribute(AttributeType::String, OptionalComputed, description);
        Schema {
            version: 1,
            block: Block {
                attributes,
                blocks: map! {
                    "component_list" => NestedBlock::List(Block {
                        attributes: map! {
                            "component_name" => attribute(AttributeType::String, Required, "Name of the component"),
                            "component_id" => attribute(AttributeType::String, Computed, "ID of the component"),
                            "component_version" => attribute(AttributeType::String, Computed, "Version of the component"),
                            "component_desc" => attribute(AttributeType::String, Computed, "Description of the component"),
                        },
                        description: Description::plain("Components installed on the cluster"),
                        ..Default::default()
                    }),
                    "add_jobs" => NestedBlock::List(Block {
                        attributes: map! {
                            "job_type" => attribute(AttributeType::Number, Required, "Job type: 1 MapReduce, 2 Spark, 3 Hive Script, 4 HiveQL, 5 DistCp, 6 Spark Script, 7 Spark SQL"),
                            "job_name" => attribute(AttributeType::String, Required, "Name of the job"),
                            "jar_path" => attribute(AttributeType::String, Required, "Path of the program executing the job"),
                            "arguments" => job_string("Arguments of the program"),
                            "input" => job_string("Path of the input data"),
                            "output" => job_string("Path of the output data"),
                            "job_log" => job_string("Path of the job logs"),
                            "shutdown_cluster" => attribute(AttributeType::Bool, OptionalComputed, "Whether the cluster is terminated after the job"),
                            "file_action" => job_string("Data import and export action"),
                            "submit_job_once_cluster_run" => attribute(AttributeType::Bool, Required, "Whether the job is submitted once the cluster runs"),
                            "hql" => job_string("HiveQL statement"),
                            "hive_script_path" => job_string("Path of the SQL program"),
                        },
                        description: Description::plain("Jobs submitted when the cluster is created"),
                        ..Default::default()
                    }),
                    "timeouts" => timeouts_block(),
                },
                description: Description::plain("MapReduce service cluster"),
                ..Default::default()
            },
        }
    }
}
