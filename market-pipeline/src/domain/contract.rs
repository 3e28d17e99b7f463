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

use crate::domain::CarRecord;
use market_common::domain::{Address, TokenId, TxHash, U256};
use std::error::Error as StdError;

/// The signer context a mutation is performed with. Passed explicitly into every write operation,
/// so the pipeline stays testable without a live wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub account: Address,
}

impl Session {
    pub fn new(account: Address) -> Self {
        Self { account }
    }
}

/// An owner-initiated change to an existing listing, decided at the UI boundary. A typed union;
/// there is no string-tag discrimination anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeRequest {
    /// Transfer the token to the recipient without payment.
    Gift { recipient: Address },

    /// Put the token back on the market at a new price, given as a decimal string.
    Resell { price: String },
}

/// Chain contract abstraction with the fixed ABI surface of the classic cars contract.
///
/// Reads are idempotent and safe to issue concurrently. Writes await broadcast acknowledgment and
/// return the transaction hash; they are not idempotent and must not be retried blindly after an
/// ambiguous failure.
#[trait_variant::make(Send)]
pub trait MarketContract
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// The number of minted tokens; token IDs are `0..total_supply`.
    async fn total_supply(&self) -> Result<u64, Self::Error>;

    /// The metadata document URL of the given token.
    async fn token_uri(&self, token_id: TokenId) -> Result<String, Self::Error>;

    async fn owner_of(&self, token_id: TokenId) -> Result<Address, Self::Error>;

    async fn is_car_in_market(&self, token_id: TokenId) -> Result<bool, Self::Error>;

    async fn is_car_sold(&self, token_id: TokenId) -> Result<bool, Self::Error>;

    async fn read_classic_car(&self, token_id: TokenId) -> Result<CarRecord, Self::Error>;

    /// Register the listing fields on-chain; the first phase of a create.
    async fn upload_classic_car(
        &self,
        session: &Session,
        name: &str,
        image: &str,
        description: &str,
        price: U256,
    ) -> Result<TxHash, Self::Error>;

    /// Mint the token with the given metadata URL; the second phase of a create.
    async fn safe_mint(
        &self,
        session: &Session,
        to: Address,
        token_uri: &str,
    ) -> Result<TxHash, Self::Error>;

    /// Payable purchase; `value` must equal the recorded price.
    async fn buy_classic_car(
        &self,
        session: &Session,
        token_id: TokenId,
        value: U256,
    ) -> Result<TxHash, Self::Error>;

    async fn gift_classic_car(
        &self,
        session: &Session,
        token_id: TokenId,
        to: Address,
    ) -> Result<TxHash, Self::Error>;

    async fn resell_classic_car(
        &self,
        session: &Session,
        token_id: TokenId,
        price: U256,
    ) -> Result<TxHash, Self::Error>;
}
