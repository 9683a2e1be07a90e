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

use serde::{Deserialize, Serialize};

use tf_provider::{
    map,
    schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema},
    value::{self, Value, ValueBool, ValueList, ValueMap, ValueNumber, ValueString},
};

use crate::{
    timeouts::{timeouts_block, Timeouts},
    utils::{attribute, sensitive, WithSchema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NodePoolState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub cluster_id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub flavor_id: ValueString<'a>,
    pub initial_node_count: ValueNumber,
    pub availability_zone: ValueString<'a>,
    pub os: ValueString<'a>,
    pub key_pair: ValueString<'a>,
    pub password: ValueString<'a>,
    pub root_volume: Value<VolumeState<'a>>,
    pub data_volumes: ValueList<Value<VolumeState<'a>>>,
    pub subnet_id: ValueString<'a>,
    pub ecs_group_id: ValueString<'a>,
    pub max_pods: ValueNumber,
    pub preinstall: ValueString<'a>,
    pub postinstall: ValueString<'a>,
    #[serde(rename = "type")]
    pub node_type: ValueString<'a>,
    pub scale_enable: ValueBool,
    pub min_node_count: ValueNumber,
    pub max_node_count: ValueNumber,
    pub scale_down_cooldown_time: ValueNumber,
    pub priority: ValueNumber,
    pub labels: ValueMap<'a, ValueString<'a>>,
    pub tags: ValueMap<'a, ValueString<'a>>,
    pub taints: ValueList<Value<TaintState<'a>>>,
    pub status: ValueString<'a>,
    pub billing_mode: ValueNumber,
    pub current_node_count: ValueNumber,
    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VolumeState<'a> {
    pub size: ValueNumber,
    #[serde(borrow = "'a")]
    pub volumetype: ValueString<'a>,
    pub extend_param: ValueString<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaintState<'a> {
    #[serde(borrow = "'a")]
    pub key: ValueString<'a>,
    pub value: ValueString<'a>,
    pub effect: ValueString<'a>,
}

fn volume_block(description: &str) -> Block {
    use AttributeConstraint::{Optional, Required};
    Block {
        attributes: map! {
            "size" => attribute(AttributeType::Number, Required, "Disk size in GB"),
            "volumetype" => attribute(AttributeType::String, Required, "Disk type: SATA, SAS or SSD"),
            "extend_param" => attribute(AttributeType::String, Optional, "Disk expansion parameters"),
        },
        description: Description::plain(description),
        ..Default::default()
    }
}

fn string_map(constraint: AttributeConstraint, description: &str) -> Attribute {
    attribute(
        AttributeType::Map(AttributeType::String.into()),
        constraint,
        description,
    )
}

impl<'a> WithSchema for NodePoolState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "ID of the node pool"),
                    "region" => attribute(AttributeType::String, OptionalComputed, "Region of the node pool, defaults to the provider region"),
                    "cluster_id" => attribute(AttributeType::String, Required, "ID of the cluster owning the node pool"),
                    "name" => attribute(AttributeType::String, Required, "Name of the node pool"),
                    "flavor_id" => attribute(AttributeType::String, Required, "Flavor of the nodes"),
                    "initial_node_count" => attribute(AttributeType::Number, Required, "Initial number of nodes"),
                    "availability_zone" => attribute(AttributeType::String, OptionalComputed, "Availability zone of the nodes, `random` by default"),
                    "os" => attribute(AttributeType::String, OptionalComputed, "Operating system of the nodes"),
                    "key_pair" => attribute(AttributeType::String, Optional, "Key pair used to log into the nodes, conflicts with `password`"),
                    "password" => sensitive(attribute(AttributeType::String, Optional, "Root password of the nodes, conflicts with `key_pair`")),
                    "subnet_id" => attribute(AttributeType::String, OptionalComputed, "Subnet of the nodes primary NIC"),
                    "ecs_group_id" => attribute(AttributeType::String, Optional, "ECS server group of the nodes"),
                    "max_pods" => attribute(AttributeType::Number, Optional, "Maximum number of pods per node"),
                    "preinstall" => attribute(AttributeType::String, Optional, "Script run before the Kubernetes installation"),
                    "postinstall" => attribute(AttributeType::String, Optional, "Script run after the Kubernetes installation"),
                    "type" => attribute(AttributeType::String, OptionalComputed, "Node type: `vm` or `ElasticBMS`"),
                    "scale_enable" => attribute(AttributeType::Bool, OptionalComputed, "Whether autoscaling is enabled"),
                    "min_node_count" => attribute(AttributeType::Number, OptionalComputed, "Minimum number of nodes when autoscaling"),
                    "max_node_count" => attribute(AttributeType::Number, OptionalComputed, "Maximum number of nodes when autoscaling"),
                    "scale_down_cooldown_time" => attribute(AttributeType::Number, OptionalComputed, "Interval in minutes between scale down operations"),
                    "priority" => attribute(AttributeType::Number, OptionalComputed, "Weight of the node pool when scaling up"),
                    "labels" => string_map(Optional, "Kubernetes labels of the nodes"),
                    "tags" => string_map(Optional, "Tags of the node ECS instances"),
                    "status" => attribute(AttributeType::String, Computed, "Status of the node pool"),
                    "billing_mode" => attribute(AttributeType::Number, Computed, "Billing mode of the nodes"),
                    "current_node_count" => attribute(AttributeType::Number, Computed, "Current number of nodes"),
                },
                blocks: map! {
                    "root_volume" => NestedBlock::Single(volume_block("System disk of the nodes")),
                    "data_volumes" => NestedBlock::List(volume_block("Data disks of the nodes, at least one")),
                    "taints" => NestedBlock::List(Block {
                        attributes: map! {
                            "key" => attribute(AttributeType::String, AttributeConstraint::Required, "Taint key"),
                            "value" => attribute(AttributeType::String, AttributeConstraint::Optional, "Taint value"),
                            "effect" => attribute(AttributeType::String, AttributeConstraint::Required, "Taint effect: NoSchedule, PreferNoSchedule or NoExecute"),
                        },
                        description: Description::plain("Kubernetes taints of the nodes"),
                        ..Default::default()
                    }),
                    "timeouts" => timeouts_block(),
                },
                description: Description::plain("Node pool of a cloud container engine cluster"),
                ..Default::default()
            },
        }
    }
}
