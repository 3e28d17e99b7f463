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

use metrics::{counter, gauge};

pub(crate) fn listings_refreshed(len: usize) {
    counter!("market_refresh_count").increment(1);
    gauge!("market_listing_count").set(len as f64);
}

pub(crate) fn listing_skipped() {
    counter!("market_listing_skipped_count").increment(1);
}

pub(crate) fn mutation_sent(kind: &'static str) {
    counter!("market_mutation_count", "kind" => kind).increment(1);
}
