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

use std::num::ParseIntError;

use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use tf_provider::value::{Value, ValueNumber, ValueString};

use crate::services::mrs::{Cluster, ComponentOpts, CreateClusterOpts, JobOpts};

use super::state::{ClusterState, ComponentState};

pub(super) const DEFAULT_BILLING_TYPE: i64 = 12;
const LOGIN_WITH_KEY_PAIR: i64 = 1;

const TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// A cluster attribute that could not be converted
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid {field} `{value}`: {source}")]
    Number {
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
    #[error("invalid {field} `{value}`: {source}")]
    Timestamp {
        field: &'static str,
        value: String,
        source: time::error::ComponentRange,
    },
    #[error("could not format {field}: {source}")]
    Format {
        field: &'static str,
        source: time::error::Format,
    },
}

fn parse_number(field: &'static str, value: &str) -> Result<i64, ConvertError> {
    value.trim().parse().map_err(|source| ConvertError::Number {
        field,
        value: value.to_owned(),
        source,
    })
}

/// Epoch seconds formatted as `YYYY-MM-DD hh:mm:ss` in UTC, empty when unset
pub(super) fn format_timestamp(field: &'static str, value: &str) -> Result<String, ConvertError> {
    if value.trim().is_empty() {
        return Ok(String::new());
    }
    let seconds = parse_number(field, value)?;
    let at = OffsetDateTime::from_unix_timestamp(seconds).map_err(|source| {
        ConvertError::Timestamp {
            field,
            value: value.to_owned(),
            source,
        }
    })?;
    at.format(TIMESTAMP)
        .map_err(|source| ConvertError::Format { field, source })
}

fn string(value: &ValueString<'_>) -> String {
    value.as_deref_option().unwrap_or_default().to_owned()
}

fn number(value: ValueNumber) -> i64 {
    value.unwrap_or_default()
}

impl<'a> ClusterState<'a> {
    /// Creation request, `vpc` and `subnet` are the names of `vpc_id` and `subnet_id`
    pub fn to_create_opts(&self, region: &str, vpc: &str, subnet: &str) -> CreateClusterOpts {
        CreateClusterOpts {
            billing_type: self.billing_type.unwrap_or(DEFAULT_BILLING_TYPE),
            data_center: region.to_owned(),
            master_node_num: number(self.master_node_num),
            master_node_size: string(&self.master_node_size),
            core_node_num: number(self.core_node_num),
            core_node_size: string(&self.core_node_size),
            available_zone_id: string(&self.available_zone_id),
            cluster_name: string(&self.cluster_name),
            vpc: vpc.to_owned(),
            vpc_id: string(&self.vpc_id),
            subnet_id: string(&self.subnet_id),
            subnet_name: subnet.to_owned(),
            cluster_version: string(&self.cluster_version),
            cluster_type: number(self.cluster_type),
            volume_type: string(&self.volume_type),
            volume_size: number(self.volume_size),
            node_public_cert_name: string(&self.node_public_cert_name),
            safe_mode: number(self.safe_mode),
            cluster_admin_secret: string(&self.cluster_admin_secret),
            login_mode: LOGIN_WITH_KEY_PAIR,
            log_collection: number(self.log_collection),
            component_list: self
                .component_list
                .iter()
                .flatten()
                .filter_map(|component| component.as_ref_option())
                .map(|component| ComponentOpts {
                    component_name: string(&component.component_name),
                })
                .collect(),
            add_jobs: self
                .add_jobs
                .iter()
                .flatten()
                .filter_map(|job| job.as_ref_option())
                .map(|job| JobOpts {
                    job_type: number(job.job_type),
                    job_name: string(&job.job_name),
                    jar_path: string(&job.jar_path),
                    arguments: string(&job.arguments),
                    input: string(&job.input),
                    output: string(&job.output),
                    job_log: string(&job.job_log),
                    shutdown_cluster: job.shutdown_cluster.unwrap_or_default(),
                    file_action: string(&job.file_action),
                    submit_job_once_cluster_run: job.submit_job_once_cluster_run.unwrap_or_default(),
                    hql: string(&job.hql),
                    hive_script_path: string(&job.hive_script_path),
                })
                .collect(),
        }
    }

    fn computed_strings(&mut self) -> [&mut ValueString<'a>; 28] {
        [
            &mut self.id,
            &mut self.order_id,
            &mut self.cluster_id,
            &mut self.available_zone_name,
            &mut self.instance_id,
            &mut self.hadoop_version,
            &mut self.master_node_ip,
            &mut self.external_ip,
            &mut self.private_ip_first,
            &mut self.internal_ip,
            &mut self.slave_security_groups_id,
            &mut self.security_groups_id,
            &mut self.external_alternate_ip,
            &mut self.master_node_spec_id,
            &mut self.core_node_spec_id,
            &mut self.master_node_product_id,
            &mut self.core_node_product_id,
            &mut self.vnc,
            &mut self.fee,
            &mut self.deployment_id,
            &mut self.cluster_state,
            &mut self.error_info,
            &mut self.remark,
            &mut self.tenant_id,
            &mut self.update_at,
            &mut self.create_at,
            &mut self.charging_start_time,
            &mut self.duration,
        ]
    }

    fn components_mut(&mut self) -> impl Iterator<Item = &mut ComponentState<'a>> {
        self.component_list
            .as_mut_option()
            .into_iter()
            .flat_map(|components| components.iter_mut().flat_map(|c| c.as_mut_option()))
    }

    /// Mark every attribute read from the cluster description as unknown
    pub fn unknown_computed(&mut self) {
        for value in self.computed_strings() {
            *value = Value::Unknown;
        }
        for component in self.components_mut() {
            component.component_id = Value::Unknown;
            component.component_version = Value::Unknown;
            component.component_desc = Value::Unknown;
        }
    }

    /// Record a cluster that was created but could not be read back
    ///
    /// The id is kept so the cluster stays tracked, computed values still unknown become null.
    pub fn set_created(&mut self, id: &str, region: &str) {
        for value in self.computed_strings() {
            if value.is_unknown() {
                *value = Value::Null;
            }
        }
        for component in self.components_mut() {
            for value in [
                &mut component.component_id,
                &mut component.component_version,
                &mut component.component_desc,
            ] {
                if value.is_unknown() {
                    *value = Value::Null;
                }
            }
        }
        for value in [&mut self.cluster_type, &mut self.log_collection] {
            if value.is_unknown() {
                *value = Value::Null;
            }
        }
        if self.cluster_version.is_unknown() {
            self.cluster_version = Value::Null;
        }
        self.id = id.to_owned().into();
        self.cluster_id = id.to_owned().into();
        self.region = region.to_owned().into();
    }

    /// Copy the attributes of a cluster retrieved from the cloud
    ///
    /// `billing_type`, `cluster_admin_secret` and `add_jobs` are not returned and keep their value.
    pub fn set_cluster(&mut self, cluster: &Cluster, region: &str) -> Result<(), ConvertError> {
        let master_node_num = parse_number("master_node_num", &cluster.master_node_num)?;
        let core_node_num = parse_number("core_node_num", &cluster.core_node_num)?;
        let update_at = format_timestamp("update_at", &cluster.update_at)?;
        let create_at = format_timestamp("create_at", &cluster.create_at)?;
        let charging_start_time =
            format_timestamp("charging_start_time", &cluster.charging_start_time)?;

        let text = |value: &str| -> ValueString<'a> { value.to_owned().into() };

        self.id = text(&cluster.cluster_id);
        self.region = text(region);
        self.order_id = text(&cluster.order_id);
        self.cluster_id = text(&cluster.cluster_id);
        self.available_zone_name = text(&cluster.az_name);
        self.available_zone_id = text(&cluster.az_id);
        self.cluster_name = text(&cluster.cluster_name);
        self.cluster_version = text(&cluster.cluster_version);
        self.cluster_type = Value::Value(cluster.cluster_type);
        self.cluster_state = text(&cluster.cluster_state);
        self.volume_type = text(&cluster.master_data_volume_type);
        self.volume_size = Value::Value(cluster.master_data_volume_size);
        self.vpc_id = text(&cluster.vpc_id);
        self.subnet_id = text(&cluster.subnet_id);
        self.master_node_num = Value::Value(master_node_num);
        self.core_node_num = Value::Value(core_node_num);
        self.core_node_size = text(&cluster.core_node_size);
        self.node_public_cert_name = text(&cluster.node_public_cert_name);
        self.safe_mode = Value::Value(cluster.safe_mode);
        self.log_collection = Value::Value(cluster.log_collection);
        self.master_node_size = text(&cluster.master_node_size);
        self.instance_id = text(&cluster.instance_id);
        self.hadoop_version = text(&cluster.hadoop_version);
        self.master_node_ip = text(&cluster.master_node_ip);
        self.external_ip = text(&cluster.external_ip);
        self.private_ip_first = text(&cluster.private_ip_first);
        self.internal_ip = text(&cluster.internal_ip);
        self.slave_security_groups_id = text(&cluster.slave_security_groups_id);
        self.security_groups_id = text(&cluster.security_groups_id);
        self.external_alternate_ip = text(&cluster.external_alternate_ip);
        self.master_node_spec_id = text(&cluster.master_node_spec_id);
        self.core_node_spec_id = text(&cluster.core_node_spec_id);
        self.master_node_product_id = text(&cluster.master_node_product_id);
        self.core_node_product_id = text(&cluster.core_node_product_id);
        self.duration = text(&cluster.duration);
        self.vnc = text(&cluster.vnc);
        self.fee = text(&cluster.fee);
        self.deployment_id = text(&cluster.deployment_id);
        self.error_info = text(&cluster.error_info);
        self.remark = text(&cluster.remark);
        self.tenant_id = text(&cluster.tenant_id);
        self.update_at = update_at.into();
        self.create_at = create_at.into();
        self.charging_start_time = charging_start_time.into();

        self.component_list = Value::Value(
            cluster
                .component_list
                .iter()
                .map(|component| {
                    Value::Value(ComponentState {
                        component_name: text(&component.component_name),
                        component_id: text(&component.component_id),
                        component_version: text(&component.component_version),
                        component_desc: text(&component.component_desc),
                    })
                })
                .collect(),
        );
        if self.billing_type.is_unknown() {
            self.billing_type = Value::Value(DEFAULT_BILLING_TYPE);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mrs_cluster::state::JobState;

    #[test]
    fn timestamps_are_utc() {
        assert_eq!(
            format_timestamp("create_at", "1700000000").unwrap(),
            "2023-11-14 22:13:20"
        );
        assert_eq!(format_timestamp("create_at", "").unwrap(), "");
        assert!(format_timestamp("create_at", "yesterday")
            .unwrap_err()
            .to_string()
            .contains("create_at"));
    }

    #[test]
    fn read_cluster() {
        let cluster: Cluster = serde_json::from_value(json!({
            "clusterId": "c1",
            "clusterName": "mrs",
            "masterNodeNum": "2",
            "coreNodeNum": "3",
            "clusterState": "running",
            "createAt": "1700000000",
            "updateAt": "1700000100",
            "chargingStartTime": "1700000000",
            "azId": "az-1",
            "azName": "eu-west-0a",
            "masterDataVolumeType": "SATA",
            "masterDataVolumeSize": 100,
            "volumeType": "SSD",
            "componentList": [{
                "componentId": "MRS 1.8.10_001",
                "componentName": "Hadoop",
                "componentVersion": "2.8.3",
                "componentDesc": "A distributed data processing framework",
            }],
        }))
        .unwrap();

        let mut state = ClusterState {
            billing_type: Value::Unknown,
            cluster_admin_secret: "s3cr3t".into(),
            ..Default::default()
        };
        state.set_cluster(&cluster, "eu-west-0").unwrap();
        assert_eq!(state.id.as_str(), "c1");
        assert_eq!(state.master_node_num, Value::Value(2));
        assert_eq!(state.core_node_num, Value::Value(3));
        assert_eq!(state.volume_type.as_str(), "SATA");
        assert_eq!(state.volume_size, Value::Value(100));
        assert_eq!(state.available_zone_name.as_str(), "eu-west-0a");
        assert_eq!(state.update_at.as_str(), "2023-11-14 22:15:00");
        assert_eq!(state.billing_type, Value::Value(DEFAULT_BILLING_TYPE));
        assert_eq!(state.cluster_admin_secret.as_str(), "s3cr3t");
        let components = state.component_list.unwrap();
        assert_eq!(components[0].as_ref_option().unwrap().component_version.as_str(), "2.8.3");
    }

    #[test]
    fn bad_node_count() {
        let cluster = Cluster {
            master_node_num: "two".into(),
            core_node_num: "3".into(),
            ..Default::default()
        };
        let err = ClusterState::default()
            .set_cluster(&cluster, "eu-west-0")
            .unwrap_err();
        assert!(matches!(err, ConvertError::Number { field: "master_node_num", .. }));
    }

    #[test]
    fn creation_options() {
        let state = ClusterState {
            billing_type: Value::Null,
            master_node_num: Value::Value(2),
            core_node_num: Value::Value(3),
            cluster_version: Value::Unknown,
            component_list: Value::Value(vec![Value::Value(ComponentState {
                component_name: "Hadoop".into(),
                ..Default::default()
            })]),
            add_jobs: Value::Value(vec![Value::Value(JobState {
                job_type: Value::Value(1),
                job_name: "wordcount".into(),
                jar_path: "s3a://bucket/program.jar".into(),
                submit_job_once_cluster_run: Value::Value(true),
                ..Default::default()
            })]),
            ..Default::default()
        };
        let opts = state.to_create_opts("eu-west-0", "vpc-name", "subnet-name");
        assert_eq!(opts.billing_type, DEFAULT_BILLING_TYPE);
        assert_eq!(opts.data_center, "eu-west-0");
        assert_eq!(opts.login_mode, LOGIN_WITH_KEY_PAIR);
        assert_eq!(opts.vpc, "vpc-name");
        assert_eq!(opts.subnet_name, "subnet-name");
        assert_eq!(opts.cluster_version, "");
        assert_eq!(opts.component_list[0].component_name, "Hadoop");
        assert!(opts.add_jobs[0].submit_job_once_cluster_run);
    }
}
