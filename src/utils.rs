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

use tf_provider::{
    schema::{Attribute, AttributeConstraint, AttributeType, Description, Schema},
    value::{Value, ValueString},
    AttributePath,
    Diagnostics,
};

use crate::client::CloudError;

pub(crate) trait WithSchema {
    fn schema() -> Schema;
}

#[async_trait]
pub(crate) trait WithValidate {
    async fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath);
}

/// Fill planned defaults and unknown computed values
pub(crate) trait WithNormalize {
    fn normalize(&mut self, diags: &mut Diagnostics);
}

pub(crate) fn attribute(
    attr_type: AttributeType,
    constraint: AttributeConstraint,
    description: &str,
) -> Attribute {
    Attribute {
        attr_type,
        description: Description::plain(description),
        constraint,
        ..Default::default()
    }
}

pub(crate) fn sensitive(attribute: Attribute) -> Attribute {
    Attribute {
        sensitive: true,
        ..attribute
    }
}

/// Unwrap a state that must be known at this point
pub(crate) fn known<T>(diags: &mut Diagnostics, state: Value<T>) -> Option<T> {
    match state {
        Value::Value(state) => Some(state),
        Value::Null => {
            diags.root_error_short("Resource state is null");
            None
        }
        Value::Unknown => {
            diags.root_error_short("Resource state is unknown");
            None
        }
    }
}

/// Mark a computed value as unknown when the configuration leaves it unset
pub(crate) fn unknown_if_null<T>(value: &mut Value<T>) {
    if value.is_null() {
        *value = Value::Unknown;
    }
}

/// Value read from the cloud for an optional attribute: an empty string keeps a null value null
pub(crate) fn optional_string<'a>(prior: &ValueString<'_>, remote: &str) -> ValueString<'a> {
    if remote.is_empty() && prior.is_null() {
        Value::Null
    } else {
        ValueString::from(remote.to_owned())
    }
}

/// Report a cloud error on the resource as a whole
pub(crate) fn report(diags: &mut Diagnostics, summary: &str, err: CloudError) {
    diags.root_error(summary.to_owned(), err.to_string());
}

/// PEM blocks compared without their line breaks and surrounding blanks
pub(crate) fn same_without_newlines(old: &str, new: &str) -> bool {
    let strip = |text: &str| -> String {
        text.trim()
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .collect()
    };
    strip(old) == strip(new)
}

/// Paths of the listed attributes that differ between two states
///
/// Fields named differently in the schema are written `field as "name"`.
macro_rules! changed_attributes {
    ($prior:expr, $proposed:expr, [$($field:ident $(as $name:literal)?),* $(,)?]) => {{
        let mut changed = Vec::new();
        $(
            if $prior.$field != $proposed.$field {
                changed.push(tf_provider::AttributePath::new(
                    $crate::utils::attribute_name!($field $(, $name)?),
                ));
            }
        )*
        changed
    }};
}

macro_rules! attribute_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $name:literal) => {
        $name
    };
}
pub(crate) use attribute_name;
pub(crate) use changed_attributes;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_insensitive_comparison() {
        assert!(same_without_newlines(
            "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n",
            "-----BEGIN CERTIFICATE-----\r\nMIIB\r\n-----END CERTIFICATE-----"
        ));
        assert!(!same_without_newlines("abc", "abd"));
    }

    #[test]
    fn changed_paths() {
        struct State<'a> {
            name: ValueString<'a>,
            flavor: ValueString<'a>,
            count: Value<i64>,
            node_type: ValueString<'a>,
        }
        let prior = State {
            name: "a".into(),
            flavor: "s3.large".into(),
            count: Value::Value(1),
            node_type: "vm".into(),
        };
        let proposed = State {
            name: "a".into(),
            flavor: Value::Unknown,
            count: Value::Value(2),
            node_type: "ElasticBMS".into(),
        };
        let changed =
            changed_attributes!(prior, proposed, [name, flavor, count, node_type as "type"]);
        assert_eq!(
            changed,
            vec![
                AttributePath::new("flavor"),
                AttributePath::new("count"),
                AttributePath::new("type"),
            ]
        );
    }

    #[test]
    fn optional_strings_stay_null() {
        assert_eq!(optional_string(&Value::Null, ""), Value::Null);
        assert_eq!(optional_string(&"x".into(), ""), ValueString::from(""));
        assert_eq!(optional_string(&Value::Null, "y"), ValueString::from("y"));
    }

    #[test]
    fn unknown_helpers() {
        let mut null: Value<i64> = Value::Null;
        let mut set = Value::Value(3);
        unknown_if_null(&mut null);
        unknown_if_null(&mut set);
        assert!(null.is_unknown());
        assert_eq!(set, Value::Value(3));

        let mut diags = Diagnostics::default();
        assert_eq!(known(&mut diags, Value::Value(1)), Some(1));
        assert_eq!(known::<i64>(&mut diags, Value::Null), None);
        assert_eq!(diags.errors.len(), 1);
    }
}
