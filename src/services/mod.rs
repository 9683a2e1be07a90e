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

//! Typed bindings of the cloud service APIs

use serde::{Deserialize, Deserializer};

pub mod cce;
pub mod elb;
pub mod mrs;
pub mod vpc;

/// Some APIs return numbers as strings and the other way around
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Lenient {
        #[serde(deserialize_with = "super::lenient_string")]
        text: String,
        #[serde(deserialize_with = "super::lenient_i64")]
        number: i64,
    }

    #[test]
    fn accepts_both_forms() {
        let a: Lenient = serde_json::from_str(r#"{"text": 3, "number": "7"}"#).unwrap();
        assert_eq!((a.text.as_str(), a.number), ("3", 7));
        let b: Lenient = serde_json::from_str(r#"{"text": null, "number": 2}"#).unwrap();
        assert_eq!((b.text.as_str(), b.number), ("", 2));
    }
}
