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

//! Log subscriber of the provider binary
//!
//! The plugin server writes its own log file when `PLUGIN_LOG_FILE` is set.
//! Otherwise, `TF_LOG` selects the level of JSON logs written to stderr, which Terraform relays.

use std::env;

use anyhow::{anyhow, Result};
use tracing::Level;

/// Level of the stderr subscriber, if one must be installed
fn stderr_level(tf_log: Option<&str>, plugin_log_file: bool) -> Option<Level> {
    if plugin_log_file {
        return None;
    }
    match tf_log?.trim() {
        "" => None,
        level if level.eq_ignore_ascii_case("json") => Some(Level::TRACE),
        level => level.parse().ok(),
    }
}

/// Install the stderr subscriber according to the environment
pub fn init_from_env() -> Result<()> {
    let tf_log = env::var("TF_LOG").ok();
    let plugin_log_file = env::var_os("PLUGIN_LOG_FILE").is_some();
    let Some(level) = stderr_level(tf_log.as_deref(), plugin_log_file) else {
        return Ok(());
    };
    tracing_subscriber::fmt()
        .json()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("could not install the log subscriber: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels() {
        assert_eq!(stderr_level(Some("DEBUG"), false), Some(Level::DEBUG));
        assert_eq!(stderr_level(Some("warn"), false), Some(Level::WARN));
        assert_eq!(stderr_level(Some("JSON"), false), Some(Level::TRACE));
        assert_eq!(stderr_level(Some("verbose"), false), None);
        assert_eq!(stderr_level(Some(""), false), None);
        assert_eq!(stderr_level(None, false), None);
    }

    #[test]
    fn plugin_log_file_wins() {
        assert_eq!(stderr_level(Some("TRACE"), true), None);
    }
}
