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
    schema::{AttributeConstraint::Optional, AttributeType, Block, Description, Schema},
    value::{ValueBool, ValueMap, ValueNumber, ValueString},
};

use crate::utils::{attribute, sensitive, WithSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub region: ValueString<'a>,
    pub auth_url: ValueString<'a>,
    pub cloud: ValueString<'a>,
    pub user_name: ValueString<'a>,
    pub user_id: ValueString<'a>,
    pub password: ValueString<'a>,
    pub token: ValueString<'a>,
    pub domain_id: ValueString<'a>,
    pub domain_name: ValueString<'a>,
    pub tenant_id: ValueString<'a>,
    pub tenant_name: ValueString<'a>,
    pub insecure: ValueBool,
    pub cacert_file: ValueString<'a>,
    pub cert: ValueString<'a>,
    pub key: ValueString<'a>,
    pub max_retries: ValueNumber,
    pub endpoints: ValueMap<'a, ValueString<'a>>,
}

impl<'a> WithSchema for ProviderConfig<'a> {
    fn schema() -> Schema {
        let string = |description: &str| attribute(AttributeType::String, Optional, description);
        Schema {
            version: 1,
            block: Block {
                attributes: map! {
                    "region" => string("The region of the FlexibleEngine cloud to use (OS_REGION_NAME)"),
                    "auth_url" => string("The Identity authentication URL (OS_AUTH_URL)"),
                    "cloud" => string("The endpoint of the cloud provider (OS_CLOUD_DOMAIN)"),
                    "user_name" => string("Username to login with (OS_USERNAME)"),
                    "user_id" => string("User ID to login with (OS_USER_ID)"),
                    "password" => sensitive(string("Password to login with (OS_PASSWORD)")),
                    "token" => sensitive(string("Authentication token to use as an alternative to username/password (OS_AUTH_TOKEN)")),
                    "domain_id" => string("The ID of the Domain to scope to (OS_DOMAIN_ID)"),
                    "domain_name" => string("The name of the Domain to scope to (OS_DOMAIN_NAME)"),
                    "tenant_id" => string("The ID of the Project to login with (OS_TENANT_ID)"),
                    "tenant_name" => string("The name of the Project to login with (OS_TENANT_NAME)"),
                    "insecure" => attribute(AttributeType::Bool, Optional, "Trust self-signed certificates (OS_INSECURE)"),
                    "cacert_file" => string("A Custom CA certificate, path or PEM contents (OS_CACERT)"),
                    "cert" => string("A client certificate to authenticate with, path or PEM contents (OS_CERT)"),
                    "key" => sensitive(string("A client private key to authenticate with, path or PEM contents (OS_KEY)")),
                    "max_retries" => attribute(AttributeType::Number, Optional, "How many times HTTP connection should be retried until giving up (OS_MAX_RETRIES)"),
                    "endpoints" => attribute(AttributeType::Map(AttributeType::String.into()), Optional, "Custom base URL per service (vpc, elb, cce, mrs, iam)"),
                },
                description: Description::plain("FlexibleEngine cloud provider"),
                ..Default::default()
            },
        }
    }
}
