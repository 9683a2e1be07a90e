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
use tracing::{debug, info};

use tf_provider::{
    schema::Schema,
    value::{Value, ValueEmpty, ValueString},
    AttributePath,
    Diagnostics,
    Resource,
};

use crate::{
    provider::ConfigHandle,
    services::elb::{
        create_certificate, delete_certificate, get_certificate, update_certificate,
        CreateCertificateOpts, UpdateCertificateOpts,
    },
    timeouts::{delete_timeout, update_timeout, validate_timeouts, TimeoutDefaults},
    utils::{changed_attributes, known, report, unknown_if_null, WithSchema},
    wait::retry,
};

use super::state::{keep_pem, CertificateState};

const TIMEOUTS: TimeoutDefaults = TimeoutDefaults::minutes(10, 10, 5);

#[derive(Debug, Default, Clone)]
pub struct LbCertificateResource {
    config: ConfigHandle,
}

impl LbCertificateResource {
    pub fn new(config: ConfigHandle) -> Self {
        Self { config }
    }
}

fn owned(value: &ValueString<'_>) -> String {
    value.as_deref_option().unwrap_or_default().to_owned()
}

/// Fields to send for an update: the changed ones, cleared fields as empty strings
fn update_opts(prior: &CertificateState<'_>, planned: &CertificateState<'_>) -> UpdateCertificateOpts {
    let changed = |old: &ValueString<'_>, new: &ValueString<'_>| {
        if old != new {
            Some(owned(new))
        } else {
            None
        }
    };
    UpdateCertificateOpts {
        name: changed(&prior.name, &planned.name),
        description: changed(&prior.description, &planned.description),
        domain: changed(&prior.domain, &planned.domain),
        private_key: changed(&prior.private_key, &planned.private_key),
        certificate: changed(&prior.certificate, &planned.certificate),
    }
}

#[async_trait]
impl Resource for LbCertificateResource {
    type State<'a> = Value<CertificateState<'a>>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(CertificateState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        let Value::Value(config) = config else {
            return Some(());
        };
        match &config.cert_type {
            Value::Value(cert_type) if cert_type != "server" && cert_type != "client" => {
                diags.error(
                    "Invalid certificate type",
                    format!("Certificate type must be `server` or `client`, got `{cert_type}`"),
                    AttributePath::new("type"),
                );
            }
            Value::Unknown => (),
            cert_type => {
                if cert_type.as_deref_option() != Some("client") && config.private_key.is_null() {
                    diags.error(
                        "Missing private key",
                        "`private_key` is required for server certificates",
                        AttributePath::new("private_key"),
                    );
                }
            }
        }
        validate_timeouts(diags, &config.timeouts, AttributePath::new("timeouts"));
        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = known(diags, state)?;
        let cloud = self.config.get(diags)?;
        let region = cloud.region(state.region.as_str()).to_owned();
        let client = cloud.elb_v2(&region);

        match get_certificate(&client, state.id.as_str()).await {
            Ok(cert) => {
                debug!(?cert, "retrieved certificate");
                state.set_certificate(&cert, &region);
                Some((Value::Value(state), private_state))
            }
            Err(err) if err.is_not_found() => {
                info!(id = state.id.as_str(), "certificate is gone, removing it from the state");
                Some((Value::Null, private_state))
            }
            Err(err) => {
                report(diags, "Error retrieving certificate", err);
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        if let Value::Value(state) = &mut state {
            state.id = Value::Unknown;
            unknown_if_null(&mut state.region);
            if state.cert_type.is_null() {
                state.cert_type = "server".into();
            }
            state.create_time = Value::Unknown;
            state.update_time = Value::Unknown;
        }
        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let prior = known(diags, prior_state)?;
        let mut proposed = known(diags, proposed_state)?;

        if proposed.cert_type.is_null() {
            proposed.cert_type = prior.cert_type.clone();
        }
        proposed.private_key = keep_pem(&prior.private_key, proposed.private_key);
        proposed.certificate = keep_pem(&prior.certificate, proposed.certificate);

        let replace = changed_attributes!(prior, proposed, [region, cert_type as "type"]);
        let updated = changed_attributes!(
            prior,
            proposed,
            [name, description, domain, private_key, certificate]
        );
        if !updated.is_empty() {
            proposed.update_time = Value::Unknown;
        }
        Some((Value::Value(proposed), prior_private_state, replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = known(diags, planned_state)?;
        let cloud = self.config.get(diags)?;
        let region = cloud.region(state.region.as_deref_option().unwrap_or_default()).to_owned();
        let client = cloud.elb_v2(&region);

        let opts = CreateCertificateOpts {
            name: owned(&state.name),
            description: owned(&state.description),
            cert_type: owned(&state.cert_type),
            domain: owned(&state.domain),
            private_key: owned(&state.private_key),
            certificate: owned(&state.certificate),
        };
        let created = match create_certificate(&client, &opts).await {
            Ok(cert) => cert,
            Err(err) => {
                report(diags, "Error creating certificate", err);
                return None;
            }
        };
        info!(id = created.id, "certificate created");

        match get_certificate(&client, &created.id).await {
            Ok(cert) => state.set_certificate(&cert, &region),
            Err(err) => {
                report(diags, "Error retrieving certificate", err);
                state.set_certificate(&created, &region);
            }
        }
        Some((Value::Value(state), planned_private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let prior = known(diags, prior_state)?;
        let mut state = known(diags, planned_state)?;
        let cloud = self.config.get(diags)?;
        let region = cloud.region(state.region.as_str()).to_owned();
        let client = &cloud.elb_v2(&region);
        let id = state.id.as_str().to_owned();

        let opts = &update_opts(&prior, &state);
        if !opts.is_empty() {
            let id = id.as_str();
            let updated = retry(update_timeout(&state.timeouts, TIMEOUTS), || async move {
                update_certificate(client, id, opts).await
            })
            .await;
            if let Err(err) = updated {
                report(diags, "Error updating certificate", err);
                return None;
            }
            info!(id, "certificate updated");
        }

        let cert = match get_certificate(client, &id).await {
            Ok(cert) => cert,
            Err(err) => {
                report(diags, "Error retrieving certificate", err);
                return None;
            }
        };
        state.set_certificate(&cert, &region);
        Some((Value::Value(state), planned_private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let state = known(diags, prior_state)?;
        let cloud = self.config.get(diags)?;
        let client = &cloud.elb_v2(state.region.as_str());
        let id = state.id.as_str();

        let deleted = retry(delete_timeout(&state.timeouts, TIMEOUTS), || async move {
            match delete_certificate(client, id).await {
                Err(err) if err.is_not_found() => Ok(()),
                result => result,
            }
        })
        .await;
        if let Err(err) = deleted {
            report(diags, "Error deleting certificate", err);
            return None;
        }
        info!(id, "certificate deleted");
        Some(())
    }

    async fn import<'a>(
        &self,
        _diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let state = CertificateState {
            id: ValueString::from(id),
            ..Default::default()
        };
        Some((Value::Value(state), Default::default()))
    }
}
