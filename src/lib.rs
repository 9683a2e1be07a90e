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

//! Terraform provider for the FlexibleEngine cloud
//!
//! The provider manages VPC routes, ELB certificates, CCE node pools and MRS clusters.
//! It is served with [`tf_provider::serve`] under the name `flexibleengine`.

mod cce_node_pool;
mod lb_certificate;
mod mrs_cluster;
mod provider;
mod utils;
mod vpc_route;

pub mod client;
pub mod logging;
pub mod services;
pub mod timeouts;
pub mod wait;

pub use cce_node_pool::{CceNodePoolResource, NodePoolState, TaintState, VolumeState};
pub use lb_certificate::{CertificateState, LbCertificateResource};
pub use mrs_cluster::{ClusterState, ComponentState, ConvertError, JobState, MrsClusterResource};
pub use provider::{ConfigHandle, FlexibleEngineProvider, ProviderConfig};
pub use vpc_route::{RouteDataState, RouteState, VpcRouteDataSource, VpcRouteResource};

/// Name under which the provider is served
pub const PROVIDER_NAME: &str = "flexibleengine";
