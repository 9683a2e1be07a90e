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
    schema::{AttributeConstraint, AttributeType, Block, Description, Schema},
    value::{self, Value, ValueString},
};

use crate::{
    services::vpc::Route,
    timeouts::{timeouts_block, Timeouts},
    utils::{attribute, WithSchema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RouteState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    #[serde(rename = "type")]
    pub route_type: ValueString<'a>,
    pub nexthop: ValueString<'a>,
    pub destination: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub tenant_id: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RouteDataState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    #[serde(rename = "type")]
    pub route_type: ValueString<'a>,
    pub nexthop: ValueString<'a>,
    pub destination: ValueString<'a>,
    pub vpc_id: ValueString<'a>,
    pub tenant_id: ValueString<'a>,
}

impl<'a> RouteState<'a> {
    /// Copy the attributes of a route retrieved from the cloud
    pub fn set_route(&mut self, route: &Route, region: &str) {
        self.id = route.id.clone().into();
        self.region = region.to_owned().into();
        self.route_type = route.route_type.clone().into();
        self.nexthop = route.nexthop.clone().into();
        self.destination = route.destination.clone().into();
        self.vpc_id = route.vpc_id.clone().into();
        self.tenant_id = route.tenant_id.clone().into();
    }
}

impl<'a> RouteDataState<'a> {
    pub fn from_route(route: &Route, region: &str) -> Self {
        Self {
            id: route.id.clone().into(),
            region: region.to_owned().into(),
            route_type: route.route_type.clone().into(),
            nexthop: route.nexthop.clone().into(),
            destination: route.destination.clone().into(),
            vpc_id: route.vpc_id.clone().into(),
            tenant_id: route.tenant_id.clone().into(),
        }
    }
}

impl<'a> WithSchema for RouteState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{OptionalComputed, Required};
        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => attribute(AttributeType::String, AttributeConstraint::Computed, "ID of the route"),
                    "region" => attribute(AttributeType::String, OptionalComputed, "Region of the route, defaults to the provider region"),
                    "type" => attribute(AttributeType::String, Required, "Type of the route, only `peering` is supported"),
                    "nexthop" => attribute(AttributeType::String, Required, "Next hop of the route, the ID of the VPC peering connection"),
                    "destination" => attribute(AttributeType::String, Required, "Destination CIDR block of the route"),
                    "vpc_id" => attribute(AttributeType::String, Required, "ID of the VPC the route belongs to"),
                    "tenant_id" => attribute(AttributeType::String, OptionalComputed, "Project owning the route"),
                },
                blocks: map! {
                    "timeouts" => timeouts_block(),
                },
                description: Description::plain("Static route of a VPC"),
                ..Default::default()
            },
        }
    }
}

impl<'a> WithSchema for RouteDataState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, OptionalComputed};
        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => attribute(AttributeType::String, OptionalComputed, "ID of the route to retrieve"),
                    "region" => attribute(AttributeType::String, OptionalComputed, "Region to search in, defaults to the provider region"),
                    "type" => attribute(AttributeType::String, OptionalComputed, "Type of the route"),
                    "nexthop" => attribute(AttributeType::String, Computed, "Next hop of the route"),
                    "destination" => attribute(AttributeType::String, OptionalComputed, "Destination CIDR block of the route"),
                    "vpc_id" => attribute(AttributeType::String, OptionalComputed, "ID of the VPC the route belongs to"),
                    "tenant_id" => attribute(AttributeType::String, OptionalComputed, "Project owning the route"),
                },
                description: Description::plain("Look up a single VPC route"),
                ..Default::default()
            },
        }
    }
}
