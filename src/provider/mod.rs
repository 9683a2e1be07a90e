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
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::info;

use tf_provider::{
    map,
    schema::Schema,
    value::ValueEmpty,
    Diagnostics,
    DynamicDataSource,
    DynamicResource,
    Provider,
};

use crate::{
    cce_node_pool::CceNodePoolResource,
    client::{Config, HttpTransport},
    lb_certificate::LbCertificateResource,
    mrs_cluster::MrsClusterResource,
    utils::{report, WithSchema},
    vpc_route::{VpcRouteDataSource, VpcRouteResource},
};

mod settings;
mod state;

pub(crate) use settings::{process_env, Settings};
pub use state::ProviderConfig;

/// Configured cloud access shared between the provider and its resources
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle(Arc<RwLock<Option<Arc<Config>>>>);

impl ConfigHandle {
    pub fn set(&self, config: Config) {
        if let Ok(mut guard) = self.0.write() {
            *guard = Some(Arc::new(config));
        }
    }

    /// Get the configuration, reporting an error if the provider is not configured yet
    pub fn get(&self, diags: &mut Diagnostics) -> Option<Arc<Config>> {
        let config = self.0.read().ok().and_then(|guard| guard.clone());
        if config.is_none() {
            diags.root_error(
                "Provider is not configured",
                "The flexibleengine provider must be configured before its resources are used",
            );
        }
        config
    }
}

#[derive(Debug, Default, Clone)]
pub struct FlexibleEngineProvider {
    config: ConfigHandle,
}

impl FlexibleEngineProvider {
    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }
}

#[async_trait]
impl Provider for FlexibleEngineProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        let settings = Settings::resolve(diags, &config, process_env);
        settings.validate(diags, false);
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let settings = Settings::resolve(diags, &config, process_env);
        settings.validate(diags, true);
        let unknown = settings.unknown_attributes();
        if !unknown.is_empty() {
            diags.root_error(
                "Provider configuration is not known",
                format!(
                    "The following attributes must be known before configuring the provider: {}",
                    unknown.join(", ")
                ),
            );
        }
        if !diags.errors.is_empty() {
            return None;
        }

        let tls = settings.tls_options(diags)?;
        let transport = match HttpTransport::new(&tls, settings.max_retries()) {
            Ok(transport) => transport,
            Err(err) => {
                report(diags, "Could not create the HTTP client", err);
                return None;
            }
        };
        let region = settings.region();
        info!(terraform_version, region, "configuring the flexibleengine provider");
        match Config::connect(
            Arc::new(transport),
            settings.credentials(),
            region,
            settings.cloud(),
            settings.endpoints(),
        )
        .await
        {
            Ok(config) => {
                self.config.set(config);
                Some(())
            }
            Err(err) => {
                report(diags, "Could not authenticate to FlexibleEngine", err);
                None
            }
        }
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        Some(map! {
            "vpc_route_v2" => VpcRouteResource::new(self.config.clone()),
            "lb_certificate_v2" => LbCertificateResource::new(self.config.clone()),
            "cce_node_pool_v3" => CceNodePoolResource::new(self.config.clone()),
            "mrs_cluster_v1" => MrsClusterResource::new(self.config.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {
            "vpc_route_v2" => VpcRouteDataSource::new(self.config.clone()),
        })
    }
}
