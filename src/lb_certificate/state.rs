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

use serde::{Deserialize, Serialize};

use tf_provider::{
    map,
    schema::{AttributeConstraint, AttributeType, Block, Description, Schema},
    value::{self, Value, ValueString},
};

use crate::{
    services::elb::Certificate,
    timeouts::{timeouts_block, Timeouts},
    utils::{attribute, optional_string, same_without_newlines, sensitive, WithSchema},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CertificateState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub region: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub domain: ValueString<'a>,
    #[serde(rename = "type")]
    pub cert_type: ValueString<'a>,
    pub private_key: ValueString<'a>,
    pub certificate: ValueString<'a>,
    pub create_time: ValueString<'a>,
    pub update_time: ValueString<'a>,
    #[serde(with = "value::serde_as_vec")]
    pub timeouts: Value<Timeouts<'a>>,
}

/// Keep the prior PEM when the new one only differs by line breaks
pub(crate) fn keep_pem<'a>(prior: &ValueString<'a>, new: ValueString<'a>) -> ValueString<'a> {
    match (prior, &new) {
        (Value::Value(old), Value::Value(pem)) if same_without_newlines(old, pem) => prior.clone(),
        _ => new,
    }
}

impl<'a> CertificateState<'a> {
    /// Copy the attributes of a certificate retrieved from the cloud
    pub fn set_certificate(&mut self, cert: &Certificate, region: &str) {
        self.id = cert.id.clone().into();
        self.region = region.to_owned().into();
        self.name = optional_string(&self.name, &cert.name);
        self.description = optional_string(&self.description, &cert.description);
        self.domain = optional_string(&self.domain, &cert.domain);
        if !cert.cert_type.is_empty() {
            self.cert_type = cert.cert_type.clone().into();
        } else if !self.cert_type.is_value() {
            self.cert_type = "server".into();
        }
        // The API may not return the private key
        if !cert.private_key.is_empty() {
            self.private_key = keep_pem(&self.private_key, cert.private_key.clone().into());
        }
        self.certificate = keep_pem(&self.certificate, cert.certificate.clone().into());
        self.create_time = cert.create_time.clone().into();
        self.update_time = cert.update_time.clone().into();
    }
}

impl<'a> WithSchema for CertificateState<'a> {
    fn schema() -> Schema {
        use AttributeConstraint::{Computed, Optional, OptionalComputed, Required};
        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "id" => attribute(AttributeType::String, Computed, "ID of the certificate"),
                    "region" => attribute(AttributeType::String, OptionalComputed, "Region of the certificate, defaults to the provider region"),
                    "name" => attribute(AttributeType::String, Optional, "Human-readable name of the certificate"),
                    "description" => attribute(AttributeType::String, Optional, "Human-readable description of the certificate"),
                    "domain" => attribute(AttributeType::String, Optional, "Domain of the certificate, only used by server certificates"),
                    "type" => attribute(AttributeType::String, OptionalComputed, "Type of the certificate: `server` (default) or `client`"),
                    "private_key" => sensitive(attribute(AttributeType::String, Optional, "Private key of a server certificate, in PEM format")),
                    "certificate" => attribute(AttributeType::String, Required, "Certificate content, in PEM format"),
                    "create_time" => attribute(AttributeType::String, Computed, "Creation time of the certificate"),
                    "update_time" => attribute(AttributeType::String, Computed, "Last update time of the certificate"),
                },
                blocks: map! {
                    "timeouts" => timeouts_block(),
                },
                description: Description::plain("Certificate used by load balancer HTTPS listeners"),
                ..Default::default()
            },
        }
    }
}
