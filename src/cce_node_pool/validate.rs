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

use super::state::NodePoolState;

const NODE_TYPES: [&str; 2] = ["vm", "ElasticBMS"];
const TAINT_EFFECTS: [&str; 3] = ["NoSchedule", "PreferNoSchedule", "NoExecute"];
pub(super) const RANDOM_AZ: &str = "random";

#[async_trait]
impl<'a> WithValidate for NodePoolState<'a> {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        match (&self.key_pair, &self.password) {
            (Value::Value(_), Value::Value(_)) => diags.error(
                "Conflicting login methods",
                "Only one of `key_pair` and `password` can be set",
                attr_path.clone().attribute("password"),
            ),
            (Value::Null, Value::Null) => diags.error(
                "Missing login method",
                "One of `key_pair` or `password` must be set",
                attr_path.clone().attribute("key_pair"),
            ),
            _ => (),
        }

        if let Value::Value(node_type) = &self.node_type {
            if !NODE_TYPES.contains(&node_type.as_ref()) {
                diags.error(
                    "Invalid node type",
                    format!("Node type must be one of {NODE_TYPES:?}, got `{node_type}`"),
                    attr_path.clone().attribute("type"),
                );
            }
        }

        match &self.data_volumes {
            Value::Value(volumes) if volumes.is_empty() => diags.error_short(
                "At least one data volume is required",
                attr_path.clone().attribute("data_volumes"),
            ),
            Value::Null => diags.error_short(
                "At least one data volume is required",
                attr_path.clone().attribute("data_volumes"),
            ),
            _ => (),
        }

        if let Value::Value(taints) = &self.taints {
            for (i, taint) in taints.iter().enumerate() {
                let Value::Value(effect) = taint.as_ref().and_then(|taint| taint.effect.as_ref())
                else {
                    continue;
                };
                if !TAINT_EFFECTS.contains(&effect.as_ref()) {
                    diags.error(
                        "Invalid taint effect",
                        format!("Taint effect must be one of {TAINT_EFFECTS:?}, got `{effect}`"),
                        attr_path
                            .clone()
                            .attribute("taints")
                            .index(i as i64)
                            .attribute("effect"),
                    );
                }
            }
        }

        if let (Value::Value(min), Value::Value(max)) = (self.min_node_count, self.max_node_count) {
            if min > max {
                diags.error(
                    "Invalid autoscaling bounds",
                    format!("`min_node_count` ({min}) is greater than `max_node_count` ({max})"),
                    attr_path.clone().attribute("min_node_count"),
                );
            }
        }
        if let Value::Value(count) = self.initial_node_count {
            if count < 0 {
                diags.error_short(
                    "`initial_node_count` must not be negative",
                    attr_path.clone().attribute("initial_node_count"),
                );
            }
        }

        validate_timeouts(diags, &self.timeouts, attr_path.attribute("timeouts"));
    }
}

impl<'a> WithNormalize for NodePoolState<'a> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.availability_zone.is_null() {
            self.availability_zone = RANDOM_AZ.into();
        }
        for value in [
            &mut self.min_node_count,
            &mut self.max_node_count,
            &mut self.scale_down_cooldown_time,
            &mut self.priority,
        ] {
            if value.is_null() {
                *value = Value::Value(0);
            }
        }
        if self.scale_enable.is_null() {
            self.scale_enable = Value::Value(false);
        }
        unknown_if_null(&mut self.region);
        unknown_if_null(&mut self.os);
        unknown_if_null(&mut self.subnet_id);
        unknown_if_null(&mut self.node_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cce_node_pool::state::{TaintState, VolumeState};

    fn config() -> NodePoolState<'static> {
        NodePoolState {
            key_pair: "kp".into(),
            data_volumes: Value::Value(vec![Value::Value(VolumeState::default())]),
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
    async fn login_methods_are_exclusive() {
        let mut state = config();
        state.password = "secret".into();
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default()).await;
        assert_eq!(diags.errors[0].attribute, AttributePath::new("password"));

        state.key_pair = Value::Null;
        state.password = Value::Null;
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default()).await;
        assert_eq!(diags.errors[0].attribute, AttributePath::new("key_pair"));

        state.password = Value::Unknown;
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default()).await;
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn bad_values() {
        let mut state = config();
        state.node_type = "bare-metal".into();
        state.data_volumes = Value::Value(vec![]);
        state.taints = Value::Value(vec![Value::Value(TaintState {
            key: "k".into(),
            value: Value::Null,
            effect: "Evict".into(),
        })]);
        state.min_node_count = Value::Value(3);
        state.max_node_count = Value::Value(1);
        let mut diags = Diagnostics::default();
        state.validate(&mut diags, AttributePath::default()).await;
        let paths: Vec<_> = diags.errors.iter().map(|d| d.attribute.clone()).collect();
        assert_eq!(
            paths,
            vec![
                AttributePath::new("type"),
                AttributePath::new("data_volumes"),
                AttributePath::new("taints").index(0).attribute("effect"),
                AttributePath::new("min_node_count"),
            ]
        );
    }

    #[test]
    fn defaults() {
        let mut state = config();
        state.max_node_count = Value::Value(5);
        state.normalize(&mut Diagnostics::default());
        assert_eq!(state.availability_zone.as_str(), RANDOM_AZ);
        assert_eq!(state.min_node_count, Value::Value(0));
        assert_eq!(state.max_node_count, Value::Value(5));
        assert_eq!(state.scale_enable, Value::Value(false));
        assert!(state.os.is_unknown());
    }
}
