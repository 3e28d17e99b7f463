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

mod price;

pub use price::*;

/// Re-exported chain primitives, so that only this crate names the EVM type stack.
pub use ethers::types::{Address, H256 as TxHash, U256};

/// On-chain token ID; token IDs are minted as a gapless sequence starting at zero.
pub type TokenId = u64;
