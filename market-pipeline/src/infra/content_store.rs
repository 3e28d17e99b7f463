// This file is part of classic-car-market.
// Copyright (C) 2026 Classic Car Market contributors
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::{ContentId, ContentStore};
use log::debug;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, derive_more::Debug, Deserialize)]
pub struct Config {
    /// Defaults to the web3.storage upload API.
    #[serde(default = "api_url_default")]
    pub api_url: String,

    /// Bearer token for the upload API.
    #[debug(skip)]
    pub token: String,

    /// Domain retrieval URLs are composed with. Defaults to `"ipfs.w3s.link"`.
    #[serde(default = "gateway_domain_default")]
    pub gateway_domain: String,

    /// Defaults to 60 seconds.
    #[serde(with = "humantime_serde", default = "upload_timeout_default")]
    pub upload_timeout: Duration,
}

/// A [ContentStore] implementation for a web3.storage style HTTP upload API.
#[derive(Clone)]
pub struct Web3ContentStore {
    client: reqwest::Client,
    config: Config,
}

impl Web3ContentStore {
    /// Create a new [Web3ContentStore] with the given [Config].
    pub fn new(config: Config) -> Result<Self, Web3ContentStoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.upload_timeout)
            .build()
            .map_err(Web3ContentStoreError::CreateClient)?;

        Ok(Self { client, config })
    }
}

impl ContentStore for Web3ContentStore {
    type Error = Web3ContentStoreError;

    async fn put(&self, bytes: Vec<u8>, file_name: &str) -> Result<ContentId, Self::Error> {
        let url = format!("{}/upload", self.config.api_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header("X-NAME", crate::domain::url_segment(file_name))
            .body(bytes)
            .send()
            .await
            .map_err(Web3ContentStoreError::Upload)?
            .error_for_status()
            .map_err(Web3ContentStoreError::Rejected)?;

        let UploadResponse { cid } = response
            .json()
            .await
            .map_err(Web3ContentStoreError::InvalidResponse)?;
        debug!(cid:%, file_name; "file uploaded");

        Ok(ContentId(cid))
    }

    fn gateway_domain(&self) -> &str {
        &self.config.gateway_domain
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    cid: String,
}

#[derive(Debug, Error)]
pub enum Web3ContentStoreError {
    #[error("cannot create HTTP client")]
    CreateClient(#[source] reqwest::Error),

    #[error("cannot upload file")]
    Upload(#[source] reqwest::Error),

    #[error("upload rejected")]
    Rejected(#[source] reqwest::Error),

    #[error("invalid upload response")]
    InvalidResponse(#[source] reqwest::Error),
}

fn api_url_default() -> String {
    "https://api.web3.storage".to_string()
}

fn gateway_domain_default() -> String {
    "ipfs.w3s.link".to_string()
}

fn upload_timeout_default() -> Duration {
    Duration::from_secs(60)
}

#[cfg(test)]
mod tests {
    use crate::infra::content_store::{Config, api_url_default, gateway_domain_default};

    #[test]
    fn test_config_hides_token() {
        let config = Config {
            api_url: api_url_default(),
            token: "top-secret-token".to_owned(),
            gateway_domain: gateway_domain_default(),
            upload_timeout: std::time::Duration::from_secs(1),
        };

        let debugged = format!("{config:?}");
        assert!(!debugged.contains("top-secret-token"));
    }
}
