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

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tf_provider::{
    map,
    schema::{Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock},
    value::{Value, ValueString},
    AttributePath,
    Diagnostics,
};

/// Operation timeouts of a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Timeouts<'a> {
    #[serde(borrow = "'a")]
    pub create: ValueString<'a>,
    pub update: ValueString<'a>,
    pub delete: ValueString<'a>,
}

/// Timeouts used when the configuration does not set them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutDefaults {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl TimeoutDefaults {
    pub const fn minutes(create: u64, update: u64, delete: u64) -> Self {
        Self {
            create: Duration::from_secs(create * 60),
            update: Duration::from_secs(update * 60),
            delete: Duration::from_secs(delete * 60),
        }
    }
}

pub fn timeouts_block() -> NestedBlock {
    let timeout = |operation: &str| Attribute {
        attr_type: AttributeType::String,
        description: Description::plain(format!(
            "Maximum duration of the {operation} operation (eg: 10m, 1h30m)"
        )),
        constraint: AttributeConstraint::Optional,
        ..Default::default()
    };
    NestedBlock::Optional(Block {
        attributes: map! {
            "create" => timeout("create"),
            "update" => timeout("update"),
            "delete" => timeout("delete"),
        },
        description: Description::plain("Timeouts of the resource operations"),
        ..Default::default()
    })
}

/// Timeout of an operation, falling back to the default
fn pick(configured: Value<&ValueString<'_>>, default: Duration) -> Duration {
    configured
        .as_ref_option()
        .and_then(|value| value.as_deref_option())
        .and_then(parse_duration)
        .unwrap_or(default)
}

pub fn create_timeout(timeouts: &Value<Timeouts<'_>>, defaults: TimeoutDefaults) -> Duration {
    pick(timeouts.as_ref().map(|t| &t.create), defaults.create)
}

pub fn update_timeout(timeouts: &Value<Timeouts<'_>>, defaults: TimeoutDefaults) -> Duration {
    pick(timeouts.as_ref().map(|t| &t.update), defaults.update)
}

pub fn delete_timeout(timeouts: &Value<Timeouts<'_>>, defaults: TimeoutDefaults) -> Duration {
    pick(timeouts.as_ref().map(|t| &t.delete), defaults.delete)
}

/// Report durations that cannot be parsed
pub fn validate_timeouts(
    diags: &mut Diagnostics,
    timeouts: &Value<Timeouts<'_>>,
    attr_path: AttributePath,
) {
    let Value::Value(timeouts) = timeouts else {
        return;
    };
    for (name, value) in [
        ("create", &timeouts.create),
        ("update", &timeouts.update),
        ("delete", &timeouts.delete),
    ] {
        if let Value::Value(duration) = value {
            if parse_duration(duration).is_none() {
                diags.error(
                    "Invalid timeout",
                    format!("`{duration}` is not a valid duration, use a form like 1h30m, 20m or 45s"),
                    attr_path.clone().index(0).attribute(name),
                );
            }
        }
    }
}

/// Parse a duration like `1h30m`, `20m`, `45s`, `1.5h` or `500ms`
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    if text == "0" {
        return Some(Duration::ZERO);
    }
    if text.is_empty() {
        return None;
    }
    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut seconds = 0.0;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest.find(|c| !is_number(c)).unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let number: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];
        let unit_len = rest.find(is_number).unwrap_or(rest.len());
        let factor = match &rest[..unit_len] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 0.001,
            _ => return None,
        };
        seconds += number * factor;
        rest = &rest[unit_len..];
    }
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(parse_duration("20m"), Some(Duration::from_secs(1200)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("m10"), None);
        assert_eq!(parse_duration("3 days"), None);
    }

    #[test]
    fn overflowing_durations_are_invalid() {
        let huge = format!("{}h", "9".repeat(400));
        assert_eq!(parse_duration(&huge), None);
        assert_eq!(parse_duration("99999999999999999999h"), None);

        let timeouts = Value::Value(Timeouts {
            create: ValueString::from("99999999999999999999h"),
            update: Value::Null,
            delete: Value::Null,
        });
        let mut diags = Diagnostics::default();
        validate_timeouts(&mut diags, &timeouts, AttributePath::new("timeouts"));
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, "Invalid timeout");
    }

    #[test]
    fn defaults_and_overrides() {
        let defaults = TimeoutDefaults::minutes(10, 10, 5);
        let timeouts = Value::Value(Timeouts {
            create: ValueString::from("1h"),
            update: Value::Null,
            delete: ValueString::from("garbage"),
        });
        assert_eq!(create_timeout(&timeouts, defaults), Duration::from_secs(3600));
        assert_eq!(update_timeout(&timeouts, defaults), Duration::from_secs(600));
        assert_eq!(delete_timeout(&timeouts, defaults), Duration::from_secs(300));
        assert_eq!(create_timeout(&Value::Null, defaults), Duration::from_secs(600));

        let mut diags = Diagnostics::default();
        validate_timeouts(&mut diags, &timeouts, AttributePath::new("timeouts"));
        assert_eq!(diags.errors.len(), 1);
    }
}
