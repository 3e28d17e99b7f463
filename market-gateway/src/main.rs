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

mod api;
mod config;

#[tokio::main]
async fn main() {
    use log::error;
    use market_common::telemetry;
    use std::panic;

    // Initialize logging.
    telemetry::init_logging();

    // Replace the default panic hook with one that uses structured logging at ERROR level.
    panic::set_hook(Box::new(|panic| error!(panic:%; "process panicked")));

    // Run and log any error.
    if let Err(error) = run().await {
        let backtrace = error.backtrace();
        let error = format!("{error:#}");
        error!(error, backtrace:%; "process exited with ERROR")
    }
}

async fn run() -> anyhow::Result<()> {
    use crate::config::{Config, InfraConfig};
    use anyhow::Context;
    use log::{error, info};
    use market_common::{config::ConfigExt, telemetry};
    use market_pipeline::{
        domain::Session,
        infra::{
            self, content_store::Web3ContentStore, contract::EthersMarket,
            metadata_fetcher::HttpMetadataFetcher,
        },
    };

    // Load configuration.
    let Config {
        application_config,
        infra_config,
        telemetry_config:
            telemetry::Config {
                tracing_config,
                metrics_config,
            },
    } = Config::load().context("load configuration")?;

    // Initialize tracing and metrics.
    telemetry::init_tracing(tracing_config);
    telemetry::init_metrics(metrics_config);

    info!(application_config:?, infra_config:?; "starting");

    let InfraConfig {
        api_config,
        pipeline_config,
    } = infra_config;
    let infra::Config {
        contract_config,
        content_store_config,
        metadata_fetcher_config,
    } = pipeline_config;

    let market = EthersMarket::new(contract_config).context("create EthersMarket")?;
    let store = Web3ContentStore::new(content_store_config).context("create Web3ContentStore")?;
    let fetcher =
        HttpMetadataFetcher::new(metadata_fetcher_config).context("create HttpMetadataFetcher")?;

    // All mutations are performed with the gateway's signer account.
    let session = Session::new(market.account());

    api::serve(
        api_config,
        application_config,
        market,
        store,
        fetcher,
        session,
    )
    .await
    .context("serve API")?;

    error!("market-gateway terminated");

    Ok(())
}
