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

//! The data-assembly and write-transaction pipeline of the classic car marketplace: it
//! reconciles off-chain metadata storage with on-chain state for a collection of tokenized
//! listings. The rendering layer invokes [application] operations and renders the data they
//! return; [domain] holds the data types and the ports to the chain, the content store and the
//! metadata gateway; [infra] holds the adapters for these ports.

pub mod application;
pub mod domain;
pub mod infra;
