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

use crate::api;
use market_pipeline::{application, infra};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(rename = "application", default)]
    pub application_config: application::Config,

    #[serde(rename = "infra")]
    pub infra_config: InfraConfig,

    #[serde(rename = "telemetry")]
    pub telemetry_config: market_common::telemetry::Config,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct InfraConfig {
    #[serde(rename = "api", default)]
    pub api_config: api::Config,

    #[serde(flatten)]
    pub pipeline_config: infra::Config,
}
