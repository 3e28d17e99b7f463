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

mod metrics;

use crate::domain::{
    CarRecord, ChangeRequest, ContentStore, Listing, MarketContract, MetadataFetcher, Session,
    TokenMetadata, metadata_file_name, retrieval_url,
};
use fastrace::trace;
use futures::{StreamExt, TryStreamExt, stream};
use log::{debug, info, warn};
use market_common::{
    domain::{Address, ParsePriceError, TokenId, TxHash, parse_price},
    error::{BoxError, StdErrorExt},
};
use serde::Deserialize;
use std::{error::Error as StdError, num::NonZeroUsize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Config {
    #[serde(default = "parallelism_default")]
    pub parallelism: NonZeroUsize,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallelism: parallelism_default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// What to do when a single token cannot be assembled during [list_all].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FailurePolicy {
    /// Fail the whole aggregation, so the rendering layer never shows a silently-incomplete
    /// collection with a gap in token IDs.
    #[default]
    FailFast,

    /// Drop unavailable tokens from the result; the survivors keep ascending order.
    SkipUnavailable,
}

/// Assemble the full collection of listings from chain and storage reads.
///
/// Reads `total_supply` to obtain `n` and resolves tokens `0..n` concurrently, at most
/// `parallelism` at a time. The five reads per token are independent and issued concurrently as
/// well; the only serialization point is the final join. Output is ordered by ascending token ID,
/// matching mint order. There is no caching; every call re-derives the full collection.
#[trace]
pub async fn list_all<C, F>(
    config: Config,
    contract: &C,
    fetcher: &F,
) -> Result<Vec<Listing>, ListAllError>
where
    C: MarketContract,
    F: MetadataFetcher,
{
    let Config {
        parallelism,
        failure_policy,
    } = config;

    let total = contract
        .total_supply()
        .await
        .map_err(|error| ListAllError::TotalSupply(boxed(error)))?;
    debug!(total, parallelism = parallelism.get(); "assembling listings");

    let listings = stream::iter(0..total)
        .map(|token_id| async move {
            assemble_listing(contract, fetcher, token_id)
                .await
                .map_err(|source| ListAllError::Listing { token_id, source })
        })
        .buffered(parallelism.get());

    let listings = match failure_policy {
        FailurePolicy::FailFast => listings.try_collect::<Vec<_>>().await?,

        FailurePolicy::SkipUnavailable => {
            let results = listings.collect::<Vec<_>>().await;

            let mut kept = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(listing) => kept.push(listing),

                    Err(error) => {
                        metrics::listing_skipped();
                        warn!(error:% = error.as_chain(); "skipping unavailable listing");
                    }
                }
            }

            kept
        }
    };

    metrics::listings_refreshed(listings.len());
    info!(len = listings.len(); "listings assembled");

    Ok(listings)
}

async fn assemble_listing<C, F>(
    contract: &C,
    fetcher: &F,
    token_id: TokenId,
) -> Result<Listing, BoxError>
where
    C: MarketContract,
    F: MetadataFetcher,
{
    let metadata = async {
        let token_uri = contract.token_uri(token_id).await.map_err(boxed)?;
        fetcher.fetch(&token_uri).await.map_err(boxed)
    };
    let owner = async { contract.owner_of(token_id).await.map_err(boxed) };
    let market = async { contract.is_car_in_market(token_id).await.map_err(boxed) };
    let sold = async { contract.is_car_sold(token_id).await.map_err(boxed) };
    let record = async { contract.read_classic_car(token_id).await.map_err(boxed) };

    let (metadata, owner, market, sold, record) =
        tokio::try_join!(metadata, owner, market, sold, record)?;
    let TokenMetadata {
        name,
        description,
        image,
    } = metadata;
    let CarRecord { price, .. } = record;

    Ok(Listing {
        index: token_id,
        owner,
        name,
        image,
        description,
        price,
        sold,
        market,
    })
}

#[derive(Debug, Error)]
pub enum ListAllError {
    #[error("cannot read total supply")]
    TotalSupply(#[source] BoxError),

    #[error("cannot assemble listing for token {token_id}")]
    Listing {
        token_id: TokenId,

        #[source]
        source: BoxError,
    },
}

/// The input of a [create] call, typically produced by a form in the rendering layer. Transient;
/// consumed once, then discarded. The owner comes from the [Session], not from the request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub description: String,

    /// Storage-network URL of the already uploaded car image.
    pub image: String,

    /// Price as a decimal string, e.g. `"1.5"`.
    pub price: String,
}

/// Acknowledged transactions of a completed create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateReceipt {
    pub registration: TxHash,
    pub mint: TxHash,
}

/// A create which has completed its first phase: the car is registered on-chain, its metadata
/// document is uploaded, but the token is not minted yet. Carried inside [CreateError::Mint] so a
/// failed second phase can be resumed with [resume_mint] instead of silently left incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCar {
    pub owner: Address,
    pub name: String,
    pub token_uri: String,
    pub registration: TxHash,
}

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("missing required field {0}")]
    MissingField(&'static str),

    #[error("invalid price")]
    InvalidPrice(#[source] ParsePriceError),

    #[error("cannot serialize metadata document")]
    SerializeMetadata(#[source] serde_json::Error),

    #[error("cannot upload metadata document")]
    Upload(#[source] BoxError),

    #[error("cannot register classic car")]
    Register(#[source] BoxError),

    #[error("classic car registered but not minted")]
    Mint {
        registered: RegisteredCar,

        #[source]
        source: BoxError,
    },
}

/// Create a new listing: upload the metadata document to the content store, register the car
/// on-chain, then mint the token to the session account with the document's retrieval URL.
///
/// Validation happens before any network call. The two chain writes are sequential and not
/// atomic; if the mint fails after a successful registration, the error is the distinct
/// [CreateError::Mint] carrying the [RegisteredCar] state for [resume_mint].
#[trace]
pub async fn create<C, S>(
    contract: &C,
    store: &S,
    session: &Session,
    request: CreateRequest,
) -> Result<CreateReceipt, CreateError>
where
    C: MarketContract,
    S: ContentStore,
{
    let CreateRequest {
        name,
        description,
        image,
        price,
    } = request;

    let name = required("name", name)?;
    let description = required("description", description)?;
    let image = required("image", image)?;
    let price = parse_price(&required("price", price)?).map_err(CreateError::InvalidPrice)?;

    let metadata = TokenMetadata {
        name: name.clone(),
        description: description.clone(),
        image: image.clone(),
    };
    let document = serde_json::to_vec(&metadata).map_err(CreateError::SerializeMetadata)?;

    let file_name = metadata_file_name(&name);
    let content_id = store
        .put(document, &file_name)
        .await
        .map_err(|error| CreateError::Upload(boxed(error)))?;
    let token_uri = retrieval_url(&content_id, store.gateway_domain(), &file_name);

    let registration = contract
        .upload_classic_car(session, &name, &image, &description, price)
        .await
        .map_err(|error| CreateError::Register(boxed(error)))?;
    info!(name:%, content_id:%, registration:%; "classic car registered");

    let registered = RegisteredCar {
        owner: session.account,
        name,
        token_uri,
        registration,
    };
    let receipt = resume_mint(contract, session, registered).await?;

    metrics::mutation_sent("create");

    Ok(receipt)
}

/// Retry the second phase of a create whose mint failed. The metadata document and the on-chain
/// registration of the given [RegisteredCar] are reused; nothing is re-uploaded or re-registered.
#[trace]
pub async fn resume_mint<C>(
    contract: &C,
    session: &Session,
    registered: RegisteredCar,
) -> Result<CreateReceipt, CreateError>
where
    C: MarketContract,
{
    match contract
        .safe_mint(session, registered.owner, &registered.token_uri)
        .await
    {
        Ok(mint) => {
            info!(mint:%, token_uri:% = registered.token_uri; "classic car minted");

            Ok(CreateReceipt {
                registration: registered.registration,
                mint,
            })
        }

        Err(source) => Err(CreateError::Mint {
            registered,
            source: boxed(source),
        }),
    }
}

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("invalid price")]
    InvalidPrice(#[source] ParsePriceError),

    #[error("chain call failed")]
    Chain(#[source] BoxError),
}

/// Buy the given token at its recorded price: the price is read from chain first, then the
/// payable purchase is sent with exactly that value. A purchase of an already sold token is
/// rejected by the contract and surfaces as [TradeError::Chain].
#[trace]
pub async fn buy<C>(
    contract: &C,
    session: &Session,
    token_id: TokenId,
) -> Result<TxHash, TradeError>
where
    C: MarketContract,
{
    let record = contract
        .read_classic_car(token_id)
        .await
        .map_err(|error| TradeError::Chain(boxed(error)))?;

    let tx = contract
        .buy_classic_car(session, token_id, record.price)
        .await
        .map_err(|error| TradeError::Chain(boxed(error)))?;

    metrics::mutation_sent("buy");
    info!(token_id, price:% = record.price, tx:%; "classic car bought");

    Ok(tx)
}

/// Apply an owner-initiated change to an existing listing.
#[trace]
pub async fn apply_change<C>(
    contract: &C,
    session: &Session,
    token_id: TokenId,
    change: ChangeRequest,
) -> Result<TxHash, TradeError>
where
    C: MarketContract,
{
    match change {
        ChangeRequest::Gift { recipient } => {
            let tx = contract
                .gift_classic_car(session, token_id, recipient)
                .await
                .map_err(|error| TradeError::Chain(boxed(error)))?;

            metrics::mutation_sent("gift");
            info!(token_id, recipient:%, tx:%; "classic car gifted");

            Ok(tx)
        }

        ChangeRequest::Resell { price } => {
            let price = parse_price(&price).map_err(TradeError::InvalidPrice)?;

            let tx = contract
                .resell_classic_car(session, token_id, price)
                .await
                .map_err(|error| TradeError::Chain(boxed(error)))?;

            metrics::mutation_sent("resell");
            info!(token_id, price:%, tx:%; "classic car relisted");

            Ok(tx)
        }
    }
}

fn required(field: &'static str, value: String) -> Result<String, CreateError> {
    let value = value.trim();

    if value.is_empty() {
        Err(CreateError::MissingField(field))
    } else {
        Ok(value.to_owned())
    }
}

fn boxed<E>(error: E) -> BoxError
where
    E: StdError + Send + Sync + 'static,
{
    Box::new(error)
}

fn parallelism_default() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use crate::{
        application::{
            self, Config, CreateError, CreateReceipt, CreateRequest, FailurePolicy, ListAllError,
            TradeError,
        },
        domain::{
            CarRecord, ChangeRequest, ContentId, ContentStore, ListingState, MarketContract,
            MetadataFetcher, Session, TokenMetadata, retrieval_url,
        },
    };
    use assert_matches::assert_matches;
    use market_common::domain::{Address, TokenId, TxHash, U256, parse_price};
    use std::{
        collections::{HashMap, HashSet},
        num::NonZeroUsize,
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, AtomicU64, Ordering},
        },
    };
    use thiserror::Error;

    const GATEWAY_DOMAIN: &str = "ipfs.mock";

    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    #[tokio::test]
    async fn test_list_all_empty() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();

        let listings = application::list_all(config(), &chain, &storage).await;
        assert_matches!(listings, Ok(listings) if listings.is_empty());
    }

    #[tokio::test]
    async fn test_create_then_list_all() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();
        let session = Session::new(ALICE);

        let cars = [
            ("Classic Mustang", "1"),
            ("Beetle", "0.5"),
            ("DeLorean DMC 12", "123.456789"),
        ];

        for (n, (name, price)) in cars.into_iter().enumerate() {
            create_car(&chain, &storage, &session, name, price).await;

            let listings = application::list_all(config(), &chain, &storage)
                .await
                .expect("listings can be assembled");
            assert_eq!(listings.len(), n + 1);

            let listing = &listings[n];
            assert_eq!(listing.index, n as TokenId);
            assert_eq!(listing.owner, ALICE);
            assert_eq!(listing.name, name);
            assert_eq!(listing.description, format!("{name} description"));
            assert_eq!(listing.price, parse_price(price).unwrap());
            assert_eq!(listing.state(), ListingState::Garage);
        }

        let listings = application::list_all(config(), &chain, &storage)
            .await
            .expect("listings can be assembled");
        let indices = listings.iter().map(|listing| listing.index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();
        let session = Session::new(ALICE);

        let request = CreateRequest {
            name: "  ".to_owned(),
            description: "desc".to_owned(),
            image: "https://img".to_owned(),
            price: "1".to_owned(),
        };
        let created = application::create(&chain, &storage, &session, request).await;
        assert_matches!(created, Err(CreateError::MissingField("name")));

        let request = CreateRequest {
            name: "Beetle".to_owned(),
            description: "desc".to_owned(),
            image: "https://img".to_owned(),
            price: "a lot".to_owned(),
        };
        let created = application::create(&chain, &storage, &session, request).await;
        assert_matches!(created, Err(CreateError::InvalidPrice(_)));

        // Validation aborts locally, before any network call.
        assert_eq!(storage.uploads.load(Ordering::Relaxed), 0);
        assert!(chain.cars.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_mint_failure_and_resume() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();
        let session = Session::new(ALICE);

        chain.fail_mint.store(true, Ordering::Relaxed);

        let request = CreateRequest {
            name: "Classic Mustang".to_owned(),
            description: "Classic Mustang description".to_owned(),
            image: "https://img.ipfs.mock/mustang".to_owned(),
            price: "1".to_owned(),
        };
        let created = application::create(&chain, &storage, &session, request).await;
        let registered = assert_matches!(created, Err(CreateError::Mint { registered, .. }) => registered);

        assert_eq!(registered.owner, ALICE);
        assert_eq!(registered.name, "Classic Mustang");
        assert!(registered.token_uri.ends_with("/Classic%20Mustang.json"));
        assert_eq!(storage.uploads.load(Ordering::Relaxed), 1);

        // The registration is acknowledged, but no token exists yet.
        let listings = application::list_all(config(), &chain, &storage).await;
        assert_matches!(listings, Ok(listings) if listings.is_empty());

        chain.fail_mint.store(false, Ordering::Relaxed);

        let resumed = application::resume_mint(&chain, &session, registered).await;
        assert_matches!(resumed, Ok(CreateReceipt { .. }));
        assert_eq!(storage.uploads.load(Ordering::Relaxed), 1);

        let listings = application::list_all(config(), &chain, &storage)
            .await
            .expect("listings can be assembled");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Classic Mustang");
    }

    #[tokio::test]
    async fn test_buy() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();
        let seller = Session::new(ALICE);
        let buyer = Session::new(BOB);

        create_car(&chain, &storage, &seller, "Beetle", "2.5").await;

        let bought = application::buy(&chain, &buyer, 0).await;
        assert_matches!(bought, Ok(_));

        let listings = application::list_all(config(), &chain, &storage)
            .await
            .expect("listings can be assembled");
        assert_eq!(listings[0].owner, BOB);
        assert!(listings[0].sold);
        assert_eq!(listings[0].state(), ListingState::Sold);
        assert_eq!(listings[0].price, parse_price("2.5").unwrap());

        // A second purchase is rejected by the chain and surfaces as a chain error.
        let bought = application::buy(&chain, &buyer, 0).await;
        assert_matches!(bought, Err(TradeError::Chain(_)));
    }

    #[tokio::test]
    async fn test_gift_dispatch() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();
        let session = Session::new(ALICE);

        create_car(&chain, &storage, &session, "Beetle", "1").await;

        let change = ChangeRequest::Gift { recipient: BOB };
        let gifted = application::apply_change(&chain, &session, 0, change).await;
        assert_matches!(gifted, Ok(_));

        let owner = chain.owner_of(0).await;
        assert_matches!(owner, Ok(owner) if owner == BOB);
    }

    #[tokio::test]
    async fn test_resell_dispatch() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();
        let seller = Session::new(ALICE);
        let buyer = Session::new(BOB);

        create_car(&chain, &storage, &seller, "Beetle", "1").await;
        application::buy(&chain, &buyer, 0).await.expect("car can be bought");

        let change = ChangeRequest::Resell {
            price: "2.5".to_owned(),
        };
        let resold = application::apply_change(&chain, &buyer, 0, change).await;
        assert_matches!(resold, Ok(_));

        let listings = application::list_all(config(), &chain, &storage)
            .await
            .expect("listings can be assembled");
        assert_eq!(listings[0].price, parse_price("2.5").unwrap());
        assert!(listings[0].market);
        assert!(!listings[0].sold);
        assert_eq!(listings[0].state(), ListingState::OnMarket);

        let change = ChangeRequest::Resell {
            price: "a lot".to_owned(),
        };
        let resold = application::apply_change(&chain, &buyer, 0, change).await;
        assert_matches!(resold, Err(TradeError::InvalidPrice(_)));
    }

    #[tokio::test]
    async fn test_list_all_failure_policies() {
        let chain = MockChain::default();
        let storage = MockStorageNetwork::default();
        let session = Session::new(ALICE);

        for name in ["Beetle", "Mustang", "DeLorean", "Countach", "Testarossa"] {
            create_car(&chain, &storage, &session, name, "1").await;
        }

        let broken_url = chain.token_uri(3).await.expect("token URI can be read");
        storage.break_url(&broken_url);

        let listings = application::list_all(config(), &chain, &storage).await;
        assert_matches!(listings, Err(ListAllError::Listing { token_id: 3, .. }));

        let config = Config {
            failure_policy: FailurePolicy::SkipUnavailable,
            ..config()
        };
        let listings = application::list_all(config, &chain, &storage)
            .await
            .expect("listings can be assembled");
        let indices = listings.iter().map(|listing| listing.index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 1, 2, 4]);
    }

    fn config() -> Config {
        Config {
            parallelism: NonZeroUsize::new(2).expect("2 is not zero"),
            failure_policy: FailurePolicy::FailFast,
        }
    }

    async fn create_car(
        chain: &MockChain,
        storage: &MockStorageNetwork,
        session: &Session,
        name: &str,
        price: &str,
    ) -> CreateReceipt {
        let request = CreateRequest {
            name: name.to_owned(),
            description: format!("{name} description"),
            image: format!("https://img.{GATEWAY_DOMAIN}/{name}"),
            price: price.to_owned(),
        };

        application::create(chain, storage, session, request)
            .await
            .expect("car can be created")
    }

    #[derive(Clone, Default)]
    struct MockChain {
        cars: Arc<Mutex<Vec<MockCar>>>,
        fail_mint: Arc<AtomicBool>,
        next_tx: Arc<AtomicU64>,
    }

    #[derive(Debug, Clone)]
    struct MockCar {
        record: CarRecord,
        owner: Address,
        token_uri: String,
        market: bool,
        minted: bool,
    }

    impl MockChain {
        fn tx(&self) -> TxHash {
            let n = self.next_tx.fetch_add(1, Ordering::Relaxed);
            TxHash::from_low_u64_be(n + 1)
        }

        fn with_car<T>(
            &self,
            token_id: TokenId,
            f: impl FnOnce(&mut MockCar) -> T,
        ) -> Result<T, MockChainError> {
            let mut cars = self.cars.lock().unwrap();
            let car = cars
                .get_mut(token_id as usize)
                .filter(|car| car.minted)
                .ok_or(MockChainError::UnknownToken)?;

            Ok(f(car))
        }
    }

    impl MarketContract for MockChain {
        type Error = MockChainError;

        async fn total_supply(&self) -> Result<u64, Self::Error> {
            let supply = self.cars.lock().unwrap().iter().filter(|car| car.minted).count();
            Ok(supply as u64)
        }

        async fn token_uri(&self, token_id: TokenId) -> Result<String, Self::Error> {
            self.with_car(token_id, |car| car.token_uri.clone())
        }

        async fn owner_of(&self, token_id: TokenId) -> Result<Address, Self::Error> {
            self.with_car(token_id, |car| car.owner)
        }

        async fn is_car_in_market(&self, token_id: TokenId) -> Result<bool, Self::Error> {
            self.with_car(token_id, |car| car.market)
        }

        async fn is_car_sold(&self, token_id: TokenId) -> Result<bool, Self::Error> {
            self.with_car(token_id, |car| car.record.sold)
        }

        async fn read_classic_car(&self, token_id: TokenId) -> Result<CarRecord, Self::Error> {
            self.with_car(token_id, |car| car.record.clone())
        }

        async fn upload_classic_car(
            &self,
            session: &Session,
            name: &str,
            image: &str,
            description: &str,
            price: U256,
        ) -> Result<TxHash, Self::Error> {
            self.cars.lock().unwrap().push(MockCar {
                record: CarRecord {
                    name: name.to_owned(),
                    image: image.to_owned(),
                    description: description.to_owned(),
                    seller: session.account,
                    sold: false,
                    price,
                },
                owner: session.account,
                token_uri: String::new(),
                market: false,
                minted: false,
            });

            Ok(self.tx())
        }

        async fn safe_mint(
            &self,
            _session: &Session,
            to: Address,
            token_uri: &str,
        ) -> Result<TxHash, Self::Error> {
            if self.fail_mint.load(Ordering::Relaxed) {
                return Err(MockChainError::Reverted);
            }

            {
                let mut cars = self.cars.lock().unwrap();
                let car = cars
                    .iter_mut()
                    .find(|car| !car.minted)
                    .ok_or(MockChainError::UnknownToken)?;
                car.minted = true;
                car.owner = to;
                car.token_uri = token_uri.to_owned();
            }

            Ok(self.tx())
        }

        async fn buy_classic_car(
            &self,
            session: &Session,
            token_id: TokenId,
            value: U256,
        ) -> Result<TxHash, Self::Error> {
            let account = session.account;
            self.with_car(token_id, |car| {
                if car.record.sold || value < car.record.price {
                    return Err(MockChainError::Reverted);
                }

                car.record.sold = true;
                car.market = false;
                car.owner = account;

                Ok(())
            })??;

            Ok(self.tx())
        }

        async fn gift_classic_car(
            &self,
            _session: &Session,
            token_id: TokenId,
            to: Address,
        ) -> Result<TxHash, Self::Error> {
            self.with_car(token_id, |car| car.owner = to)?;
            Ok(self.tx())
        }

        async fn resell_classic_car(
            &self,
            _session: &Session,
            token_id: TokenId,
            price: U256,
        ) -> Result<TxHash, Self::Error> {
            self.with_car(token_id, |car| {
                car.record.price = price;
                car.record.sold = false;
                car.market = true;
            })?;

            Ok(self.tx())
        }
    }

    #[derive(Debug, Error)]
    enum MockChainError {
        #[error("no such token")]
        UnknownToken,

        #[error("transaction reverted")]
        Reverted,
    }

    /// One mock for both sides of the storage network: [ContentStore] records uploaded documents
    /// under their retrieval URL, [MetadataFetcher] serves them back.
    #[derive(Clone, Default)]
    struct MockStorageNetwork {
        documents: Arc<Mutex<HashMap<String, TokenMetadata>>>,
        unreachable: Arc<Mutex<HashSet<String>>>,
        uploads: Arc<AtomicU64>,
        next_cid: Arc<AtomicU64>,
    }

    impl MockStorageNetwork {
        fn break_url(&self, url: &str) {
            self.unreachable.lock().unwrap().insert(url.to_owned());
        }
    }

    impl ContentStore for MockStorageNetwork {
        type Error = MockStorageError;

        async fn put(&self, bytes: Vec<u8>, file_name: &str) -> Result<ContentId, Self::Error> {
            self.uploads.fetch_add(1, Ordering::Relaxed);

            let metadata = serde_json::from_slice::<TokenMetadata>(&bytes)
                .map_err(|_| MockStorageError::Rejected)?;
            let content_id = ContentId(format!(
                "bafymock{}",
                self.next_cid.fetch_add(1, Ordering::Relaxed)
            ));

            let url = retrieval_url(&content_id, GATEWAY_DOMAIN, file_name);
            self.documents.lock().unwrap().insert(url, metadata);

            Ok(content_id)
        }

        fn gateway_domain(&self) -> &str {
            GATEWAY_DOMAIN
        }
    }

    impl MetadataFetcher for MockStorageNetwork {
        type Error = MockStorageError;

        async fn fetch(&self, url: &str) -> Result<TokenMetadata, Self::Error> {
            if self.unreachable.lock().unwrap().contains(url) {
                return Err(MockStorageError::Unreachable);
            }

            self.documents
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or(MockStorageError::NotFound)
        }
    }

    #[derive(Debug, Error)]
    enum MockStorageError {
        #[error("storage network unreachable")]
        Unreachable,

        #[error("upload rejected")]
        Rejected,

        #[error("document not found")]
        NotFound,
    }
}
