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

use tf_provider::{value::Value, AttributePath, Diagnostics, Provider, Resource};

use terraform_provider_flexibleengine::{
    CceNodePoolResource, FlexibleEngineProvider, NodePoolState, ProviderConfig, PROVIDER_NAME,
};

#[test]
fn served_name() {
    assert_eq!(PROVIDER_NAME, "flexibleengine");
}

#[tokio::test]
async fn negative_retries_are_rejected() {
    let provider = FlexibleEngineProvider::default();
    let mut diags = Diagnostics::default();
    let config = ProviderConfig {
        region: "eu-west-0".into(),
        token: "tok".into(),
        tenant_id: "p-1".into(),
        max_retries: Value::Value(-1),
        ..Default::default()
    };
    assert!(Provider::validate(&provider, &mut diags, config).await.is_none());
    assert!(diags
        .errors
        .iter()
        .any(|diag| diag.attribute == AttributePath::new("max_retries")));
}

#[tokio::test]
async fn resources_need_a_configured_provider() {
    let resource = CceNodePoolResource::default();
    let mut diags = Diagnostics::default();
    let state = NodePoolState {
        id: "np-1".into(),
        cluster_id: "cl-1".into(),
        ..Default::default()
    };
    let read = Resource::read(
        &resource,
        &mut diags,
        Value::Value(state),
        Default::default(),
        Default::default(),
    )
    .await;
    assert!(read.is_none());
    assert_eq!(diags.errors.len(), 1);
}

#[tokio::test]
async fn node_pool_import_id() {
    let resource = CceNodePoolResource::default();
    let mut diags = Diagnostics::default();
    let (state, _) = Resource::import(&resource, &mut diags, "cl-1/np-1".to_owned())
        .await
        .unwrap();
    let state = state.unwrap();
    assert_eq!(state.cluster_id.as_str(), "cl-1");
    assert_eq!(state.id.as_str(), "np-1");

    assert!(Resource::import(&resource, &mut diags, "np-1".to_owned())
        .await
        .is_none());
}
