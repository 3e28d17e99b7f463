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

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

/// The metadata document referenced by a token's URI: a flat JSON object, immutable once
/// uploaded. Re-listing never mutates prior metadata; only price and market flag change on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub description: String,

    /// Storage-network URL of the car image.
    pub image: String,
}

/// Metadata retrieval abstraction. A failed fetch must propagate as an error, never as a document
/// with missing fields.
#[trait_variant::make(Send)]
pub trait MetadataFetcher
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    async fn fetch(&self, url: &str) -> Result<TokenMetadata, Self::Error>;
}
