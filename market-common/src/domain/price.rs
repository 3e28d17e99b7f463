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

use ethers::{
    types::U256,
    utils::{ConversionError, ParseUnits, format_units, parse_units},
};
use thiserror::Error;

/// Fixed-point precision of on-chain prices. The payment token uses 18 decimals; the contract
/// stores prices in its smallest unit.
pub const PRICE_DECIMALS: u32 = 18;

/// Parse a decimal string like `"1.5"` into the on-chain fixed-point representation.
///
/// Prices are unsigned; negative and empty inputs are rejected.
pub fn parse_price(value: &str) -> Result<U256, ParsePriceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ParsePriceError::Empty);
    }

    match parse_units(value, PRICE_DECIMALS)? {
        ParseUnits::U256(price) => Ok(price),
        ParseUnits::I256(_) => Err(ParsePriceError::Negative(value.to_owned())),
    }
}

/// Format an on-chain fixed-point price as a decimal string without trailing zeros, e.g. `"1.5"`
/// for `1_500_000_000_000_000_000`.
pub fn format_price(price: U256) -> String {
    let formatted =
        format_units(price, PRICE_DECIMALS).expect("U256 can be formatted with valid decimals");

    match formatted.split_once('.') {
        Some((integer, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                integer.to_owned()
            } else {
                format!("{integer}.{fraction}")
            }
        }

        None => formatted,
    }
}

#[derive(Debug, Error)]
pub enum ParsePriceError {
    #[error("price must not be empty")]
    Empty,

    #[error("price {0} must not be negative")]
    Negative(String),

    #[error("price is no valid decimal number")]
    Invalid(#[from] ConversionError),
}

#[cfg(test)]
mod tests {
    use crate::domain::{ParsePriceError, format_price, parse_price};
    use assert_matches::assert_matches;
    use ethers::types::U256;

    #[test]
    fn test_parse_price() {
        let price = parse_price("1");
        assert_matches!(price, Ok(price) if price == U256::exp10(18));

        let price = parse_price("0.5");
        assert_matches!(price, Ok(price) if price == U256::exp10(17) * 5u64);

        let price = parse_price(" 2.5 ");
        assert_matches!(price, Ok(price) if price == U256::exp10(17) * 25u64);

        let price = parse_price("");
        assert_matches!(price, Err(ParsePriceError::Empty));

        let price = parse_price("-1");
        assert_matches!(price, Err(ParsePriceError::Negative(_)));

        let price = parse_price("a lot");
        assert_matches!(price, Err(ParsePriceError::Invalid(_)));
    }

    #[test]
    fn test_price_round_trip() {
        for value in ["1", "0.5", "123.456789", "10", "0"] {
            let price = parse_price(value).expect("price can be parsed");
            assert_eq!(format_price(price), value);
        }
    }
}
