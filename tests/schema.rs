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

use std::collections::BTreeSet;

use serde::Serialize;
use tf_provider::{
    schema::{Block, NestedBlock, Schema},
    DataSource,
    Diagnostics,
    Provider,
    Resource,
};

use terraform_provider_flexibleengine::{
    CceNodePoolResource, CertificateState, ClusterState, ComponentState, FlexibleEngineProvider,
    JobState, LbCertificateResource, MrsClusterResource, NodePoolState, ProviderConfig,
    RouteDataState, RouteState, TaintState, VolumeState, VpcRouteDataSource, VpcRouteResource,
};

fn schema_names(block: &Block) -> BTreeSet<String> {
    block
        .attributes
        .keys()
        .chain(block.blocks.keys())
        .cloned()
        .collect()
}

fn state_names<T: Serialize>(state: T) -> BTreeSet<String> {
    match serde_json::to_value(state).unwrap() {
        serde_json::Value::Object(fields) => fields.keys().cloned().collect(),
        other => panic!("state is not an object: {other}"),
    }
}

fn nested<'b>(block: &'b Block, name: &str) -> &'b Block {
    match block.blocks.get(name) {
        Some(
            NestedBlock::Single(block)
            | NestedBlock::List(block)
            | NestedBlock::Set(block)
            | NestedBlock::Map(block)
            | NestedBlock::Group(block)
            | NestedBlock::Optional(block),
        ) => block,
        None => panic!("missing block {name}"),
    }
}

fn resource_schema<R: Resource>(resource: R) -> Schema {
    let mut diags = Diagnostics::default();
    Resource::schema(&resource, &mut diags).unwrap()
}

#[test]
fn provider_schema_matches_config() {
    let mut diags = Diagnostics::default();
    let schema = Provider::schema(&FlexibleEngineProvider::default(), &mut diags).unwrap();
    assert_eq!(
        schema_names(&schema.block),
        state_names(ProviderConfig::default())
    );
}

#[test]
fn vpc_route_schemas_match_states() {
    let schema = resource_schema(VpcRouteResource::default());
    assert_eq!(schema_names(&schema.block), state_names(RouteState::default()));

    let mut diags = Diagnostics::default();
    let schema = DataSource::schema(&VpcRouteDataSource::default(), &mut diags).unwrap();
    assert_eq!(
        schema_names(&schema.block),
        state_names(RouteDataState::default())
    );
}

#[test]
fn lb_certificate_schema_matches_state() {
    let schema = resource_schema(LbCertificateResource::default());
    assert_eq!(
        schema_names(&schema.block),
        state_names(CertificateState::default())
    );
    assert!(schema.block.attributes["private_key"].sensitive);
}

#[test]
fn cce_node_pool_schema_matches_state() {
    let schema = resource_schema(CceNodePoolResource::default());
    let block = &schema.block;
    assert_eq!(schema_names(block), state_names(NodePoolState::default()));
    assert_eq!(
        schema_names(nested(block, "root_volume")),
        state_names(VolumeState::default())
    );
    assert_eq!(
        schema_names(nested(block, "data_volumes")),
        state_names(VolumeState::default())
    );
    assert_eq!(
        schema_names(nested(block, "taints")),
        state_names(TaintState::default())
    );
    assert!(block.attributes["password"].sensitive);
}

#[test]
fn mrs_cluster_schema_matches_state() {
    let schema = resource_schema(MrsClusterResource::default());
    let block = &schema.block;
    assert_eq!(schema_names(block), state_names(ClusterState::default()));
    assert_eq!(
        schema_names(nested(block, "component_list")),
        state_names(ComponentState::default())
    );
    assert_eq!(
        schema_names(nested(block, "add_jobs")),
        state_names(JobState::default())
    );
    assert!(block.attributes["cluster_admin_secret"].sensitive);
}

#[test]
fn every_resource_has_timeouts() {
    for schema in [
        resource_schema(VpcRouteResource::default()),
        resource_schema(LbCertificateResource::default()),
        resource_schema(CceNodePoolResource::default()),
        resource_schema(MrsClusterResource::default()),
    ] {
        let timeouts = nested(&schema.block, "timeouts");
        assert_eq!(
            schema_names(timeouts),
            ["create", "delete", "update"].map(String::from).into()
        );
    }
}
