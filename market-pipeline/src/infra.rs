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

pub mod content_store;
pub mod contract;
pub mod metadata_fetcher;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(rename = "contract")]
    pub contract_config: contract::Config,

    #[serde(rename = "content_store")]
    pub content_store_config: content_store::Config,

    #[serde(rename = "metadata_fetcher", default)]
    pub metadata_fetcher_config: metadata_fetcher::Config,
}
