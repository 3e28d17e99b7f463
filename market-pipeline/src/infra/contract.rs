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

use crate::domain::{CarRecord, MarketContract, Session};
use ethers::{
    abi::Detokenize,
    contract::{ContractCall, ContractError, abigen},
    middleware::SignerMiddleware,
    providers::{Http, Provider, ProviderError},
    signers::{LocalWallet, Signer, WalletError},
};
use log::debug;
use market_common::domain::{Address, TokenId, TxHash, U256};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::time::{error::Elapsed, timeout};

abigen!(
    ClassicCars,
    r#"[
        function totalSupply() external view returns (uint256)
        function tokenURI(uint256 tokenId) external view returns (string)
        function ownerOf(uint256 tokenId) external view returns (address)
        function isCarInMarket(uint256 tokenId) external view returns (bool)
        function isCarSold(uint256 tokenId) external view returns (bool)
        function readClassicCars(uint256 tokenId) external view returns (string, string, string, address, bool, uint256)
        function uploadClassicCar(string name, string image, string description, uint256 price) external
        function safeMint(address to, string uri) external
        function buyClassicCar(uint256 tokenId) external payable
        function giftClassicCar(uint256 tokenId, address to) external
        function resellClassicCar(uint256 tokenId, uint256 newPrice) external
    ]"#
);

/// JSON-RPC client stack the contract bindings are generated for: an HTTP provider with a local
/// signing key.
pub type EvmClient = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Clone, derive_more::Debug, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    pub contract_address: Address,
    pub chain_id: u64,

    /// Hex-encoded signing key of the active account.
    #[debug(skip)]
    pub signer_key: String,

    /// Defaults to 30 seconds.
    #[serde(with = "humantime_serde", default = "call_timeout_default")]
    pub call_timeout: Duration,

    /// Timeout for sending a write and awaiting its acknowledgment. Defaults to 2 minutes.
    #[serde(with = "humantime_serde", default = "send_timeout_default")]
    pub send_timeout: Duration,
}

/// A [MarketContract] implementation based on ethers.
#[derive(Clone)]
pub struct EthersMarket {
    contract: ClassicCars<EvmClient>,
    account: Address,
    call_timeout: Duration,
    send_timeout: Duration,
}

impl EthersMarket {
    /// Create a new [EthersMarket] with the given [Config].
    pub fn new(config: Config) -> Result<Self, EthersMarketError> {
        let Config {
            rpc_url,
            contract_address,
            chain_id,
            signer_key,
            call_timeout,
            send_timeout,
        } = config;

        let provider = Provider::<Http>::try_from(rpc_url.as_str())?;
        let wallet = signer_key.parse::<LocalWallet>()?.with_chain_id(chain_id);
        let account = wallet.address();

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = ClassicCars::new(contract_address, client);

        debug!(contract_address:%, account:%, chain_id; "created EthersMarket");

        Ok(Self {
            contract,
            account,
            call_timeout,
            send_timeout,
        })
    }

    /// The account of the configured signing key; mutations must be performed with a [Session]
    /// for this account.
    pub fn account(&self) -> Address {
        self.account
    }

    fn ensure_session(&self, session: &Session) -> Result<(), EthersMarketError> {
        if session.account != self.account {
            return Err(EthersMarketError::ForeignSession {
                session: session.account,
                signer: self.account,
            });
        }

        Ok(())
    }

    async fn call<T>(&self, call: ContractCall<EvmClient, T>) -> Result<T, EthersMarketError>
    where
        T: Detokenize,
    {
        timeout(self.call_timeout, call.call())
            .await?
            .map_err(EthersMarketError::Call)
    }

    /// Send a write and await its acknowledgment; a receipt without success status means the
    /// transaction reverted.
    async fn send(&self, call: ContractCall<EvmClient, ()>) -> Result<TxHash, EthersMarketError> {
        let send_and_confirm = async {
            let pending = call.send().await.map_err(EthersMarketError::Call)?;

            pending
                .await
                .map_err(EthersMarketError::Confirm)?
                .ok_or(EthersMarketError::Dropped)
        };
        let receipt = timeout(self.send_timeout, send_and_confirm).await??;

        if receipt.status == Some(1u64.into()) {
            Ok(receipt.transaction_hash)
        } else {
            Err(EthersMarketError::Reverted(receipt.transaction_hash))
        }
    }
}

impl MarketContract for EthersMarket {
    type Error = EthersMarketError;

    async fn total_supply(&self) -> Result<u64, Self::Error> {
        let supply = self.call(self.contract.total_supply()).await?;

        if supply > U256::from(u64::MAX) {
            return Err(EthersMarketError::SupplyRange(supply));
        }

        Ok(supply.as_u64())
    }

    async fn token_uri(&self, token_id: TokenId) -> Result<String, Self::Error> {
        self.call(self.contract.token_uri(token_id.into())).await
    }

    async fn owner_of(&self, token_id: TokenId) -> Result<Address, Self::Error> {
        self.call(self.contract.owner_of(token_id.into())).await
    }

    async fn is_car_in_market(&self, token_id: TokenId) -> Result<bool, Self::Error> {
        self.call(self.contract.is_car_in_market(token_id.into()))
            .await
    }

    async fn is_car_sold(&self, token_id: TokenId) -> Result<bool, Self::Error> {
        self.call(self.contract.is_car_sold(token_id.into())).await
    }

    async fn read_classic_car(&self, token_id: TokenId) -> Result<CarRecord, Self::Error> {
        let (name, image, description, seller, sold, price) = self
            .call(self.contract.read_classic_cars(token_id.into()))
            .await?;

        Ok(CarRecord {
            name,
            image,
            description,
            seller,
            sold,
            price,
        })
    }

    async fn upload_classic_car(
        &self,
        session: &Session,
        name: &str,
        image: &str,
        description: &str,
        price: U256,
    ) -> Result<TxHash, Self::Error> {
        self.ensure_session(session)?;

        let call = self.contract.upload_classic_car(
            name.to_owned(),
            image.to_owned(),
            description.to_owned(),
            price,
        );

        self.send(call).await
    }

    async fn safe_mint(
        &self,
        session: &Session,
        to: Address,
        token_uri: &str,
    ) -> Result<TxHash, Self::Error> {
        self.ensure_session(session)?;
        self.send(self.contract.safe_mint(to, token_uri.to_owned()))
            .await
    }

    async fn buy_classic_car(
        &self,
        session: &Session,
        token_id: TokenId,
        value: U256,
    ) -> Result<TxHash, Self::Error> {
        self.ensure_session(session)?;
        self.send(self.contract.buy_classic_car(token_id.into()).value(value))
            .await
    }

    async fn gift_classic_car(
        &self,
        session: &Session,
        token_id: TokenId,
        to: Address,
    ) -> Result<TxHash, Self::Error> {
        self.ensure_session(session)?;
        self.send(self.contract.gift_classic_car(token_id.into(), to))
            .await
    }

    async fn resell_classic_car(
        &self,
        session: &Session,
        token_id: TokenId,
        price: U256,
    ) -> Result<TxHash, Self::Error> {
        self.ensure_session(session)?;
        self.send(self.contract.resell_classic_car(token_id.into(), price))
            .await
    }
}

#[derive(Debug, Error)]
pub enum EthersMarketError {
    #[error("invalid JSON-RPC endpoint")]
    Endpoint(#[from] url::ParseError),

    #[error("invalid signer key")]
    SignerKey(#[from] WalletError),

    #[error("session account {session} is not the signer account {signer}")]
    ForeignSession { session: Address, signer: Address },

    #[error("contract call failed")]
    Call(#[source] ContractError<EvmClient>),

    #[error("cannot confirm transaction")]
    Confirm(#[source] ProviderError),

    #[error("transaction dropped from the mempool")]
    Dropped,

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("chain call timed out")]
    Timeout(#[from] Elapsed),

    #[error("total supply {0} exceeds the supported range")]
    SupplyRange(U256),
}

fn call_timeout_default() -> Duration {
    Duration::from_secs(30)
}

fn send_timeout_default() -> Duration {
    Duration::from_secs(120)
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{MarketContract, Session},
        infra::contract::{Config, EthersMarket, EthersMarketError},
    };
    use assert_matches::assert_matches;
    use market_common::domain::Address;

    // Well-known hardhat/anvil development key, not a secret.
    const DEV_SIGNER_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_config_hides_signer_key() {
        let config = config();
        let debugged = format!("{config:?}");
        assert!(!debugged.contains(DEV_SIGNER_KEY));
        assert!(debugged.contains("rpc_url"));
    }

    #[tokio::test]
    async fn test_foreign_session_rejected() {
        let market = EthersMarket::new(config()).expect("EthersMarket can be created");

        let foreign = Session::new(Address::repeat_byte(0xfe));
        let minted = market
            .safe_mint(&foreign, foreign.account, "https://example.com/1")
            .await;
        assert_matches!(minted, Err(EthersMarketError::ForeignSession { .. }));
    }

    fn config() -> Config {
        Config {
            rpc_url: "http://localhost:8545".to_owned(),
            contract_address: Address::repeat_byte(0x42),
            chain_id: 31337,
            signer_key: DEV_SIGNER_KEY.to_owned(),
            call_timeout: std::time::Duration::from_secs(1),
            send_timeout: std::time::Duration::from_secs(1),
        }
    }
}
