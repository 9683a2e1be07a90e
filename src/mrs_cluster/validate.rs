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


use async_trait::async_trait;

use tf_provider::{value::Value, AttributePath, Diagnostics};

use crate::{
    timeouts::validate_timeouts,
    utils::{unknown_if_null, WithNormalize, WithValidate},
};

use super::{convert::DEFAULT_BILLING_TYPE, state::ClusterState};

const VOLUME_TYPES: [&str; 2] = ["SATA", "SSD"];
const CORE_NODES: std::ops::RangeInclusive<i64> = 3..=100;

#[async_trait]
impl<'a> WithValidate for ClusterState<'a> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Value::Value(count) = self.core_node_num {
            if !CORE_NODES.contains(&count) {
                diags.error(
                    "Invalid number of core nodes",
                    format!("`core_node_num` must be in [3, 100], got {count}"),
                    attr_path.clone().attribute("core_node_num"),
                );
            }
        }
        if let Value::Value(volume_type) = &self.volume_type {
            if !VOLUME_TYPES.contains(&volume_type.as_ref()) {
                diags.error(
                    "Invalid volume type",
                    format!("Volume type must be one of {VOLUME_TYPES:?}, got `{volume_type}`"),
                    attr_path.clone().attribute("volume_type"),
                );
            }
        }
        if let Value::Null = self.component_list {
            diags.error_short(
                "At least one component is required",
                attr_path.clone().attribute("component_list"),
            );
        } else if let Value::Value(components) = &self.component_list {
            if components.is_empty() {
                diags.error_short(
                    "At least one component is required",
                    attr_path.clone().attribute("component_list"),
                );
            }
        }

        validate_timeouts(diags, &self.timeouts, attr_path.attribute("timeouts"));
    }
}

impl<'a> WithNormalize for ClusterState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.billing_type.is_null() {
            self.billing_type = Value::Value(DEFAULT_BILLING_TYPE);
        }
        unknown_if_null(&mut self.region);
        unknown_if_null(&mut self.cluster_version);
        unknown_if_null(&mut self.cluster_type);
        unknown_if_null(&mut self.log_collection);

        if let Value::Value(jobs) = &mut self.add_jobs {
            for job in jobs.iter_mut().flat_map(|job| job.as_mut_option()) {
                for value in [
                    &mut job.arguments,
                    &mut job.input,
                    &mut job.output,
                    &mut job.job_log,
                    &mut job.file_action,
                    &mut job.hql,
                    &mut job.hive_script_path,
                ] {
                    if value.is_null() {
                        *value = "".into();
                    }
                }
                if job.shutdown_cluster.is_null() {
                    job.shutdown_cluster = Value::Value(false);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mrs_cluster::state::{ComponentState, JobState};

    fn config() -> ClusterState<'static> {
        ClusterState {
            core_node_num: Value::Value(3),
            volume_type: "SATA".into(),
            component_list: Value::Value(vec![Value::Value(ComponentState {
                component_name: "Hadoop".into(),
                ..Default::default()
            })]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn valid_configuration() {
        let mut diags = Diagnostics::default();
        config().validate(&mut diags, AttributePath::default()).await;
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn bad_values() {
        let mut state = config();
        state.core_node_num = Value::Value(2);
        state.volume_type = "NVME".into();
        state.component_list = Value::Value(vec![]);
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default()).await;
        let paths: Vec<_> = diags.errors.iter().map(|d| d.attribute.clone()).collect();
        assert_eq!(
            paths,
            vec![
                AttributePath::new("core_node_num"),
                AttributePath::new("volume_type"),
                AttributePath::new("component_list"),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_values_are_not_checked() {
        let mut state = config();
        state.core_node_num = Value::Unknown;
        state.volume_type = Value::Unknown;
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default()).await;
        assert!(diags.errors.is_empty());
    }

    #[test]
    fn defaults() {
        let mut state = config();
        state.add_jobs = Value::Value(vec![Value::Value(JobState {
            job_name: "wordcount".into(),
            hql: "SELECT 1".into(),
            ..Default::default()
        })]);
        state.normalize(&mut Diagnostics::default());
        assert_eq!(state.billing_type, Value::Value(DEFAULT_BILLING_TYPE));
        assert!(state.cluster_version.is_unknown());
        assert!(state.log_collection.is_unknown());
        let jobs = state.add_jobs.unwrap();
        let job = jobs[0].as_ref_option().unwrap();
        assert_eq!(job.input.as_str(), "");
        assert_eq!(job.hql.as_str(), "SELECT 1");
        assert_eq!(job.shutdown_cluster, Value::Value(false));
    }
}
