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

//! The REST boundary the browser rendering layer talks to. Handlers only invoke pipeline
//! operations and serialize what they return; after a successful mutation the rendering layer is
//! expected to re-fetch `/cars` in full.

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use fastrace_axum::FastraceLayer;
use log::{error, info, warn};
use market_common::{
    domain::{Address, TokenId, TxHash, format_price},
    error::{BoxError, StdErrorExt},
};
use market_pipeline::{
    application::{self, CreateError, CreateRequest, ListAllError, TradeError},
    domain::{
        ChangeRequest, ContentStore, Listing, ListingState, MarketContract, MetadataFetcher,
        Session, retrieval_url,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    io,
    net::{IpAddr, Ipv4Addr},
};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    select,
    signal::unix::{SignalKind, signal},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, map_response_body::MapResponseBodyLayer,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Defaults to `"0.0.0.0"`.
    #[serde(default = "address_default")]
    pub address: IpAddr,

    /// Defaults to `8,080`.
    #[serde(default = "port_default")]
    pub port: u16,

    /// Maximum request body size in bytes; bounds image uploads. Defaults to 16 MiB.
    #[serde(default = "request_body_limit_default")]
    pub request_body_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: address_default(),
            port: port_default(),
            request_body_limit: request_body_limit_default(),
        }
    }
}

/// Serve the API, shutting down gracefully on SIGINT or SIGTERM.
pub async fn serve<C, S, F>(
    config: Config,
    application_config: application::Config,
    contract: C,
    store: S,
    fetcher: F,
    session: Session,
) -> Result<(), ServeError>
where
    C: MarketContract,
    S: ContentStore,
    F: MetadataFetcher,
{
    let Config {
        address,
        port,
        request_body_limit,
    } = config;

    let state = AppState {
        config: application_config,
        contract,
        store,
        fetcher,
        session,
    };

    let app = Router::new()
        .route("/ready", get(ready))
        .route("/cars", get(list_cars::<C, S, F>).post(create_car::<C, S, F>))
        .route("/cars/{token_id}/buy", post(buy_car::<C, S, F>))
        .route("/cars/{token_id}/gift", post(gift_car::<C, S, F>))
        .route("/cars/{token_id}/resell", post(resell_car::<C, S, F>))
        .route("/uploads", post(upload_file::<C, S, F>))
        .layer(
            ServiceBuilder::new()
                .layer(FastraceLayer)
                .layer(CorsLayer::permissive())
                // Normalize the limit layer's wrapped response body back to `Body` so the
                // surrounding layers' type bounds are satisfied; behaviorally a no-op re-wrap.
                .layer(MapResponseBodyLayer::new(Body::new))
                .layer(RequestBodyLimitLayer::new(request_body_limit)),
        )
        .with_state(state);

    let listener = TcpListener::bind((address, port))
        .await
        .map_err(ServeError::Bind)?;
    info!(address:%, port; "market-gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServeError::Serve)
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("cannot bind TCP listener")]
    Bind(#[source] io::Error),

    #[error("cannot serve API")]
    Serve(#[source] io::Error),
}

#[derive(Clone)]
struct AppState<C, S, F> {
    config: application::Config,
    contract: C,
    store: S,
    fetcher: F,
    session: Session,
}

async fn ready() -> StatusCode {
    StatusCode::OK
}

async fn list_cars<C, S, F>(
    State(state): State<AppState<C, S, F>>,
) -> Result<Json<Vec<Car>>, ApiError>
where
    C: MarketContract,
    S: ContentStore,
    F: MetadataFetcher,
{
    let listings = application::list_all(state.config, &state.contract, &state.fetcher).await?;
    let cars = listings.into_iter().map(Car::from).collect::<Vec<_>>();

    Ok(Json(cars))
}

async fn create_car<C, S, F>(
    State(state): State<AppState<C, S, F>>,
    Json(request): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError>
where
    C: MarketContract,
    S: ContentStore,
    F: MetadataFetcher,
{
    let receipt =
        application::create(&state.contract, &state.store, &state.session, request).await?;

    let created = Created {
        registration: receipt.registration,
        mint: receipt.mint,
    };

    Ok((StatusCode::CREATED, Json(created)))
}

async fn buy_car<C, S, F>(
    State(state): State<AppState<C, S, F>>,
    Path(token_id): Path<TokenId>,
) -> Result<Json<Transacted>, ApiError>
where
    C: MarketContract,
    S: ContentStore,
    F: MetadataFetcher,
{
    let tx = application::buy(&state.contract, &state.session, token_id).await?;
    Ok(Json(Transacted { tx }))
}

async fn gift_car<C, S, F>(
    State(state): State<AppState<C, S, F>>,
    Path(token_id): Path<TokenId>,
    Json(request): Json<GiftRequest>,
) -> Result<Json<Transacted>, ApiError>
where
    C: MarketContract,
    S: ContentStore,
    F: MetadataFetcher,
{
    let change = ChangeRequest::Gift {
        recipient: request.recipient,
    };
    let tx = application::apply_change(&state.contract, &state.session, token_id, change).await?;

    Ok(Json(Transacted { tx }))
}

async fn resell_car<C, S, F>(
    State(state): State<AppState<C, S, F>>,
    Path(token_id): Path<TokenId>,
    Json(request): Json<ResellRequest>,
) -> Result<Json<Transacted>, ApiError>
where
    C: MarketContract,
    S: ContentStore,
    F: MetadataFetcher,
{
    let change = ChangeRequest::Resell {
        price: request.price,
    };
    let tx = application::apply_change(&state.contract, &state.session, token_id, change).await?;

    Ok(Json(Transacted { tx }))
}

/// Upload a file, e.g. a car image, and return its retrieval URL for use in a later create.
async fn upload_file<C, S, F>(
    State(state): State<AppState<C, S, F>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<Uploaded>, ApiError>
where
    C: MarketContract,
    S: ContentStore,
    F: MetadataFetcher,
{
    let content_id = state
        .store
        .put(body.to_vec(), &params.name)
        .await
        .map_err(|error| ApiError::Upload(Box::new(error)))?;
    let url = retrieval_url(&content_id, state.store.gateway_domain(), &params.name);

    Ok(Json(Uploaded {
        cid: content_id.into(),
        url,
    }))
}

/// A [Listing] as rendered to the browser, with the price as a decimal string.
#[derive(Debug, Serialize)]
struct Car {
    index: TokenId,
    owner: Address,
    name: String,
    image: String,
    description: String,
    price: String,
    sold: bool,
    market: bool,
    state: CarState,
}

impl From<Listing> for Car {
    fn from(listing: Listing) -> Self {
        let state = listing.state().into();

        Self {
            index: listing.index,
            owner: listing.owner,
            name: listing.name,
            image: listing.image,
            description: listing.description,
            price: format_price(listing.price),
            sold: listing.sold,
            market: listing.market,
            state,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum CarState {
    Garage,
    OnMarket,
    Sold,
}

impl From<ListingState> for CarState {
    fn from(state: ListingState) -> Self {
        match state {
            ListingState::Garage => Self::Garage,
            ListingState::OnMarket => Self::OnMarket,
            ListingState::Sold => Self::Sold,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GiftRequest {
    recipient: Address,
}

#[derive(Debug, Deserialize)]
struct ResellRequest {
    price: String,
}

#[derive(Debug, Deserialize)]
struct UploadParams {
    name: String,
}

#[derive(Debug, Serialize)]
struct Created {
    registration: TxHash,
    mint: TxHash,
}

#[derive(Debug, Serialize)]
struct Transacted {
    tx: TxHash,
}

#[derive(Debug, Serialize)]
struct Uploaded {
    cid: String,
    url: String,
}

#[derive(Debug, Error)]
enum ApiError {
    #[error("cannot assemble listings")]
    ListAll(#[from] ListAllError),

    #[error("cannot create classic car")]
    Create(#[from] CreateError),

    #[error("cannot change classic car")]
    Trade(#[from] TradeError),

    #[error("cannot upload file")]
    Upload(#[source] BoxError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Create(CreateError::MissingField(_) | CreateError::InvalidPrice(_))
            | ApiError::Trade(TradeError::InvalidPrice(_)) => StatusCode::BAD_REQUEST,

            _ => StatusCode::BAD_GATEWAY,
        };

        if status.is_client_error() {
            warn!(error:% = self.as_chain(); "invalid request");
        } else {
            error!(error:% = self.as_chain(); "request failed");
        }

        // A partially completed create is reported with the registered state, so the operator can
        // resume the mint instead of losing the registration.
        let body = match &self {
            ApiError::Create(CreateError::Mint { registered, .. }) => json!({
                "error": self.as_chain(),
                "registered": {
                    "owner": registered.owner,
                    "name": registered.name,
                    "token_uri": registered.token_uri,
                    "registration": registered.registration,
                },
            }),

            _ => json!({ "error": self.as_chain() }),
        };

        (status, Json(body)).into_response()
    }
}

async fn shutdown_signal() {
    let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler can be installed");
    let ctrl_c = tokio::signal::ctrl_c();

    select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = ctrl_c => info!("received SIGINT, shutting down"),
    }
}

fn address_default() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn port_default() -> u16 {
    8_080
}

fn request_body_limit_default() -> usize {
    16 * 1_024 * 1_024
}

#[cfg(test)]
mod tests {
    use crate::api::{ApiError, Car, CarState};
    use axum::{http::StatusCode, response::IntoResponse};
    use market_common::domain::{Address, parse_price};
    use market_pipeline::{
        application::{CreateError, TradeError},
        domain::Listing,
    };

    #[test]
    fn test_car_from_listing() {
        let listing = Listing {
            index: 7,
            owner: Address::repeat_byte(0xa1),
            name: "Classic Mustang".to_owned(),
            image: "https://img".to_owned(),
            description: "A classic".to_owned(),
            price: parse_price("1.5").unwrap(),
            sold: false,
            market: true,
        };

        let car = Car::from(listing);
        assert_eq!(car.index, 7);
        assert_eq!(car.price, "1.5");
        assert!(matches!(car.state, CarState::OnMarket));
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError::Create(CreateError::MissingField("name")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::Trade(TradeError::Chain("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
