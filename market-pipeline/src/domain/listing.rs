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

use market_common::domain::{Address, TokenId, U256};

/// The denormalized, client-assembled view of one token: on-chain ownership and market state
/// joined with the off-chain metadata document. Rebuilt in full on every refresh, never persisted
/// or merged incrementally; `index` equals the on-chain token ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub index: TokenId,
    pub owner: Address,
    pub name: String,
    pub image: String,
    pub description: String,

    /// Price in the smallest unit of the payment token (18-decimal fixed point).
    pub price: U256,

    pub sold: bool,
    pub market: bool,
}

impl Listing {
    /// The market state as reported by the chain; the client never computes transitions itself,
    /// only reflects the two booleans read from chain.
    pub fn state(&self) -> ListingState {
        if self.sold {
            ListingState::Sold
        } else if self.market {
            ListingState::OnMarket
        } else {
            ListingState::Garage
        }
    }
}

/// Derived view over the `sold` and `market` flags of a [Listing].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingState {
    /// Owned, not offered for open sale; transferable by gift only.
    Garage,

    /// Offered for open sale.
    OnMarket,

    Sold,
}

/// The decoded `readClassicCars` record. Only `price` is load-bearing for the pipeline; the
/// remaining fields mirror the registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarRecord {
    pub name: String,
    pub image: String,
    pub description: String,
    pub seller: Address,
    pub sold: bool,
    pub price: U256,
}
