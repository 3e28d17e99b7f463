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

use crate::domain::{MetadataFetcher, TokenMetadata};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Config {
    /// Defaults to 10 seconds.
    #[serde(with = "humantime_serde", default = "fetch_timeout_default")]
    pub fetch_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_timeout: fetch_timeout_default(),
        }
    }
}

/// A [MetadataFetcher] implementation based on reqwest.
#[derive(Clone)]
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    /// Create a new [HttpMetadataFetcher] with the given [Config].
    pub fn new(config: Config) -> Result<Self, HttpMetadataFetcherError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(HttpMetadataFetcherError::CreateClient)?;

        Ok(Self { client })
    }
}

impl MetadataFetcher for HttpMetadataFetcher {
    type Error = HttpMetadataFetcherError;

    /// Fetch and parse the metadata document at the given URL. The body is taken as raw text and
    /// parsed exactly once as JSON; the transport layer does no deserialization of its own.
    async fn fetch(&self, url: &str) -> Result<TokenMetadata, Self::Error> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(HttpMetadataFetcherError::Request)?
            .error_for_status()
            .map_err(HttpMetadataFetcherError::Status)?;

        let body = response
            .text()
            .await
            .map_err(HttpMetadataFetcherError::Body)?;
        let metadata = serde_json::from_str(&body).map_err(HttpMetadataFetcherError::Parse)?;

        Ok(metadata)
    }
}

#[derive(Debug, Error)]
pub enum HttpMetadataFetcherError {
    #[error("cannot create HTTP client")]
    CreateClient(#[source] reqwest::Error),

    #[error("cannot request metadata document")]
    Request(#[source] reqwest::Error),

    #[error("metadata document not available")]
    Status(#[source] reqwest::Error),

    #[error("cannot read metadata document body")]
    Body(#[source] reqwest::Error),

    #[error("metadata document is no valid JSON")]
    Parse(#[source] serde_json::Error),
}

fn fetch_timeout_default() -> Duration {
    Duration::from_secs(10)
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{MetadataFetcher, TokenMetadata},
        infra::metadata_fetcher::{Config, HttpMetadataFetcher, HttpMetadataFetcherError},
    };
    use assert_matches::assert_matches;
    use std::net::SocketAddr;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task,
    };

    #[tokio::test]
    async fn test_fetch() {
        let body = r#"{"name":"Classic Mustang","description":"A classic","image":"https://img"}"#;
        let addr = serve_once("200 OK", body).await;

        let fetcher = HttpMetadataFetcher::new(Config::default()).expect("fetcher can be created");
        let metadata = fetcher.fetch(&format!("http://{addr}/metadata.json")).await;

        assert_matches!(
            metadata,
            Ok(TokenMetadata { name, description, image })
                if name == "Classic Mustang" && description == "A classic" && image == "https://img"
        );
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let addr = serve_once("200 OK", "not json").await;

        let fetcher = HttpMetadataFetcher::new(Config::default()).expect("fetcher can be created");
        let metadata = fetcher.fetch(&format!("http://{addr}/metadata.json")).await;

        assert_matches!(metadata, Err(HttpMetadataFetcherError::Parse(_)));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let addr = serve_once("404 Not Found", "").await;

        let fetcher = HttpMetadataFetcher::new(Config::default()).expect("fetcher can be created");
        let metadata = fetcher.fetch(&format!("http://{addr}/metadata.json")).await;

        assert_matches!(metadata, Err(HttpMetadataFetcherError::Status(_)));
    }

    /// Serve exactly one canned HTTP response on an ephemeral port.
    async fn serve_once(status: &'static str, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener can be bound");
        let addr = listener.local_addr().expect("listener has a local address");

        task::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("connection can be accepted");

            let mut request = [0; 1024];
            let _ = socket.read(&mut request).await;

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("response can be written");
        });

        addr
    }
}
