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

use std::collections::BTreeMap;
use std::path::PathBuf;

use tf_provider::{value::{Value, ValueString}, AttributePath, Diagnostics};

use crate::client::{default_auth_url, Credentials, TlsOptions, DEFAULT_CLOUD};

use super::state::ProviderConfig;

/// Provider configuration merged with the environment.
/// Values stay unknown when Terraform does not know them yet.
#[derive(Clone, Default, PartialEq)]
pub(crate) struct Settings {
    pub region: Value<String>,
    pub auth_url: Value<String>,
    pub cloud: Value<String>,
    pub user_name: Value<String>,
    pub user_id: Value<String>,
    pub password: Value<String>,
    pub token: Value<String>,
    pub domain_id: Value<String>,
    pub domain_name: Value<String>,
    pub tenant_id: Value<String>,
    pub tenant_name: Value<String>,
    pub insecure: Value<bool>,
    pub cacert_file: Value<String>,
    pub cert: Value<String>,
    pub key: Value<String>,
    pub max_retries: Value<i64>,
    pub endpoints: Value<BTreeMap<String, String>>,
}

fn string<E>(value: &ValueString<'_>, env: &E, vars: &[&str]) -> Value<String>
where
    E: Fn(&str) -> Option<String>,
{
    match value {
        Value::Value(value) if !value.is_empty() => Value::Value(value.to_string()),
        Value::Unknown => Value::Unknown,
        _ => vars.iter().find_map(|var| env(var)).into(),
    }
}

/// Environment lookup ignoring empty variables
pub(crate) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

impl Settings {
    pub fn resolve<E>(diags: &mut Diagnostics, config: &ProviderConfig<'_>, env: E) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let insecure = match config.insecure {
            Value::Null => match env("OS_INSECURE").as_deref() {
                None => Value::Null,
                Some("1" | "true" | "TRUE" | "True") => Value::Value(true),
                Some("0" | "false" | "FALSE" | "False") => Value::Value(false),
                Some(other) => {
                    diags.error(
                        "Invalid OS_INSECURE",
                        format!("`{other}` is not a boolean"),
                        AttributePath::new("insecure"),
                    );
                    Value::Null
                }
            },
            insecure => insecure,
        };
        let max_retries = match config.max_retries {
            Value::Null => match env("OS_MAX_RETRIES") {
                None => Value::Null,
                Some(retries) => match retries.trim().parse() {
                    Ok(retries) => Value::Value(retries),
                    Err(_) => {
                        diags.error(
                            "Invalid OS_MAX_RETRIES",
                            format!("`{retries}` is not a number"),
                            AttributePath::new("max_retries"),
                        );
                        Value::Null
                    }
                },
            },
            max_retries => max_retries,
        };
        let endpoints = match &config.endpoints {
            Value::Value(endpoints) => {
                if endpoints.values().any(Value::is_unknown) {
                    Value::Unknown
                } else {
                    Value::Value(
                        endpoints
                            .iter()
                            .filter_map(|(service, url)| {
                                Some((service.to_string(), url.as_ref_option()?.to_string()))
                            })
                            .collect(),
                    )
                }
            }
            Value::Null => Value::Null,
            Value::Unknown => Value::Unknown,
        };

        Self {
            region: string(&config.region, &env, &["OS_REGION_NAME"]),
            auth_url: string(&config.auth_url, &env, &["OS_AUTH_URL"]),
            cloud: string(&config.cloud, &env, &["OS_CLOUD_DOMAIN"]),
            user_name: string(&config.user_name, &env, &["OS_USERNAME"]),
            user_id: string(&config.user_id, &env, &["OS_USER_ID"]),
            password: string(&config.password, &env, &["OS_PASSWORD"]),
            token: string(&config.token, &env, &["OS_AUTH_TOKEN"]),
            domain_id: string(
                &config.domain_id,
                &env,
                &["OS_DOMAIN_ID", "OS_USER_DOMAIN_ID"],
            ),
            domain_name: string(
                &config.domain_name,
                &env,
                &["OS_DOMAIN_NAME", "OS_USER_DOMAIN_NAME"],
            ),
            tenant_id: string(&config.tenant_id, &env, &["OS_TENANT_ID", "OS_PROJECT_ID"]),
            tenant_name: string(
                &config.tenant_name,
                &env,
                &["OS_TENANT_NAME", "OS_PROJECT_NAME"],
            ),
            insecure,
            cacert_file: string(&config.cacert_file, &env, &["OS_CACERT"]),
            cert: string(&config.cert, &env, &["OS_CERT"]),
            key: string(&config.key, &env, &["OS_KEY"]),
            max_retries,
            endpoints,
        }
    }

    /// Check the settings, `complete` also requires credentials and scope to be present
    pub fn validate(&self, diags: &mut Diagnostics, complete: bool) {
        if let Value::Value(retries) = self.max_retries {
            if retries < 0 {
                diags.error_short(
                    "max_retries should be a positive value",
                    AttributePath::new("max_retries"),
                );
            }
        }
        if self.cert.is_null() != self.key.is_null() {
            diags.root_error(
                "Incomplete client certificate",
                "`cert` and `key` must be given together",
            );
        }
        if self.user_name.is_value()
            && self.user_id.is_null()
            && self.domain_name.is_null()
            && self.domain_id.is_null()
        {
            diags.error(
                "Missing user domain",
                "`user_name` requires `domain_name` or `domain_id` (OS_DOMAIN_NAME, OS_DOMAIN_ID)",
                AttributePath::new("user_name"),
            );
        }
        if !complete {
            return;
        }
        if self.region.is_null() {
            diags.error(
                "Missing region",
                "The region must be set with `region` or OS_REGION_NAME",
                AttributePath::new("region"),
            );
        }
        if self.token.is_null()
            && (self.password.is_null() || (self.user_name.is_null() && self.user_id.is_null()))
        {
            diags.root_error(
                "Missing credentials",
                "Set `token` (OS_AUTH_TOKEN), or `password` (OS_PASSWORD) with `user_name` (OS_USERNAME) or `user_id` (OS_USER_ID)",
            );
        }
        if self.tenant_id.is_null() && self.tenant_name.is_null() {
            diags.root_error(
                "Missing project",
                "Set `tenant_id` (OS_TENANT_ID) or `tenant_name` (OS_TENANT_NAME)",
            );
        }
    }

    /// Attributes that are not known yet
    pub fn unknown_attributes(&self) -> Vec<&'static str> {
        [
            ("region", self.region.is_unknown()),
            ("auth_url", self.auth_url.is_unknown()),
            ("cloud", self.cloud.is_unknown()),
            ("user_name", self.user_name.is_unknown()),
            ("user_id", self.user_id.is_unknown()),
            ("password", self.password.is_unknown()),
            ("token", self.token.is_unknown()),
            ("domain_id", self.domain_id.is_unknown()),
            ("domain_name", self.domain_name.is_unknown()),
            ("tenant_id", self.tenant_id.is_unknown()),
            ("tenant_name", self.tenant_name.is_unknown()),
            ("insecure", self.insecure.is_unknown()),
            ("cacert_file", self.cacert_file.is_unknown()),
            ("cert", self.cert.is_unknown()),
            ("key", self.key.is_unknown()),
            ("max_retries", self.max_retries.is_unknown()),
            ("endpoints", self.endpoints.is_unknown()),
        ]
        .into_iter()
        .filter_map(|(name, unknown)| unknown.then_some(name))
        .collect()
    }

    pub fn region(&self) -> String {
        self.region.clone().unwrap_or_default()
    }

    pub fn cloud(&self) -> String {
        self.cloud
            .clone()
            .unwrap_or_else(|| DEFAULT_CLOUD.to_owned())
    }

    pub fn endpoints(&self) -> BTreeMap<String, String> {
        self.endpoints.clone().unwrap_or_default()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
            .clone()
            .map_or(5, |retries| retries.clamp(0, u32::MAX as i64) as u32)
    }

    pub fn credentials(&self) -> Credentials {
        let auth_url = match (&self.auth_url, self.endpoints().get("iam")) {
            (Value::Value(auth_url), _) => auth_url.clone(),
            (_, Some(iam)) => iam.clone(),
            _ => default_auth_url(&self.region(), &self.cloud()),
        };
        Credentials {
            auth_url,
            user_name: self.user_name.clone().as_option(),
            user_id: self.user_id.clone().as_option(),
            password: self.password.clone().as_option(),
            token: self.token.clone().as_option(),
            domain_id: self.domain_id.clone().as_option(),
            domain_name: self.domain_name.clone().as_option(),
            tenant_id: self.tenant_id.clone().as_option(),
            tenant_name: self.tenant_name.clone().as_option(),
        }
    }

    /// Load certificates given either as paths or as PEM contents
    pub fn tls_options(&self, diags: &mut Diagnostics) -> Option<TlsOptions> {
        let mut load = |value: &Value<String>, name: &'static str| -> Option<Option<String>> {
            let Value::Value(value) = value else {
                return Some(None);
            };
            match path_or_contents(value) {
                Ok(contents) => Some(Some(contents)),
                Err(err) => {
                    diags.error(
                        format!("Could not read `{name}`"),
                        err.to_string(),
                        AttributePath::new(name),
                    );
                    None
                }
            }
        };
        let ca_cert = load(&self.cacert_file, "cacert_file")?;
        let cert = load(&self.cert, "cert")?;
        let key = load(&self.key, "key")?;
        Some(TlsOptions {
            insecure: self.insecure.clone().unwrap_or_default(),
            ca_cert,
            client_cert: cert.zip(key),
        })
    }
}

/// Read the file if `value` is the path of an existing file, otherwise use it as is
pub(crate) fn path_or_contents(value: &str) -> std::io::Result<String> {
    if value.trim_start().starts_with("-----BEGIN") {
        return Ok(value.to_owned());
    }
    let path = match value.strip_prefix("~/") {
        Some(rest) => match process_env("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => PathBuf::from(value),
        },
        None => PathBuf::from(value),
    };
    if path.is_file() {
        std::fs::read_to_string(path)
    } else {
        Ok(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn environment_fallback() {
        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            region: "eu-west-0".into(),
            ..Default::default()
        };
        let settings = Settings::resolve(
            &mut diags,
            &config,
            env(&[
                ("OS_REGION_NAME", "eu-west-1"),
                ("OS_USERNAME", "alice"),
                ("OS_PASSWORD", "pw"),
                ("OS_USER_DOMAIN_NAME", "acme"),
                ("OS_PROJECT_NAME", "eu-west-0_p"),
                ("OS_INSECURE", "true"),
                ("OS_MAX_RETRIES", "2"),
            ]),
        );
        assert!(diags.errors.is_empty());
        assert_eq!(settings.region, Value::Value("eu-west-0".to_owned()));
        assert_eq!(settings.domain_name, Value::Value("acme".to_owned()));
        assert_eq!(settings.tenant_name, Value::Value("eu-west-0_p".to_owned()));
        assert_eq!(settings.insecure, Value::Value(true));
        assert_eq!(settings.max_retries(), 2);

        settings.validate(&mut diags, true);
        assert!(diags.errors.is_empty());

        let credentials = settings.credentials();
        assert_eq!(
            credentials.auth_url,
            "https://iam.eu-west-0.prod-cloud-ocb.orange-business.com/v3"
        );
        assert_eq!(credentials.user_name.as_deref(), Some("alice"));
    }

    #[test]
    fn incomplete_configuration() {
        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            user_name: "alice".into(),
            cert: "cert.pem".into(),
            max_retries: Value::Value(-1),
            ..Default::default()
        };
        let settings = Settings::resolve(&mut diags, &config, env(&[]));
        settings.validate(&mut diags, false);
        // max_retries, cert without key, user without domain
        assert_eq!(diags.errors.len(), 3);

        let mut diags = Diagnostics::default();
        settings.validate(&mut diags, true);
        // and region, credentials, project
        assert_eq!(diags.errors.len(), 6);
    }

    #[test]
    fn unknown_values_are_tracked() {
        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            token: Value::Unknown,
            ..Default::default()
        };
        let settings = Settings::resolve(&mut diags, &config, env(&[("OS_AUTH_TOKEN", "t")]));
        assert_eq!(settings.unknown_attributes(), vec!["token"]);
    }

    #[test]
    fn certificates_from_contents() {
        let pem = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";
        assert_eq!(path_or_contents(pem).unwrap(), pem);
        assert_eq!(
            path_or_contents("/does/not/exist.pem").unwrap(),
            "/does/not/exist.pem"
        );

        let path = std::env::temp_dir().join("flexibleengine-provider-ca.pem");
        std::fs::write(&path, pem).unwrap();
        assert_eq!(path_or_contents(path.to_str().unwrap()).unwrap(), pem);
        std::fs::remove_file(path).unwrap();
    }
}
