//! Auction listings. Only the seller may edit or delete a listing, and edits
//! stop once the first bid lands.

use super::{path, payload, query, SharedStore};
use crate::{
    api::error::{ApiError, MessageBody},
    store::{Auction, AuctionChanges, NewAuction, StoreError},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const AUCTION_NOT_FOUND: &str = "Auction not found";
pub const NOT_SELLER: &str = "Only the seller can modify this auction";

#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateAuctionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Cents.
    pub starting_price: i64,
    pub ends_at: DateTime<Utc>,
    pub seller_id: Uuid,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct UpdateAuctionRequest {
    pub seller_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct SellerQuery {
    pub seller_id: Uuid,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuctionResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub current_price: i64,
    pub seller_id: Uuid,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_open: bool,
}

impl AuctionResponse {
    fn from_auction(auction: Auction, now: DateTime<Utc>) -> Self {
        let is_open = auction.is_open(now);
        Self {
            id: auction.id,
            title: auction.title,
            description: auction.description,
            starting_price: auction.starting_price,
            current_price: auction.current_price,
            seller_id: auction.seller_id,
            ends_at: auction.ends_at,
            created_at: auction.created_at,
            is_open,
        }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
}

fn not_found(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => ApiError::NotFound(AUCTION_NOT_FOUND.to_string()),
        err => err.into(),
    }
}

async fn owned_auction(store: &SharedStore, id: Uuid, seller_id: Uuid) -> Result<Auction, ApiError> {
    let auction = store
        .auction_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(AUCTION_NOT_FOUND.to_string()))?;

    if auction.seller_id != seller_id {
        return Err(ApiError::Forbidden(NOT_SELLER.to_string()));
    }

    Ok(auction)
}

#[utoipa::path(
    get,
    path= "/api/auctions",
    responses (
        (status = 200, description = "All auctions, newest first", body = [AuctionResponse]),
    ),
    tag= "auctions"
)]
pub async fn list(store: Extension<SharedStore>) -> Result<Json<Vec<AuctionResponse>>, ApiError> {
    let now = Utc::now();
    let auctions = store.list_auctions().await?;

    Ok(Json(
        auctions
            .into_iter()
            .map(|auction| AuctionResponse::from_auction(auction, now))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path= "/api/auctions",
    request_body = CreateAuctionRequest,
    responses (
        (status = 201, description = "Auction created", body = AuctionResponse),
        (status = 400, description = "Invalid listing", body = MessageBody),
        (status = 404, description = "Seller not found", body = MessageBody),
    ),
    tag= "auctions"
)]
#[instrument(skip(store, body))]
pub async fn create(
    store: Extension<SharedStore>,
    body: Result<Json<CreateAuctionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuctionResponse>), ApiError> {
    let request = payload(body)?;
    let now = Utc::now();

    let title = request.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    if request.starting_price <= 0 {
        return Err(ApiError::BadRequest(
            "Starting price must be positive".to_string(),
        ));
    }

    if request.ends_at <= now {
        return Err(ApiError::BadRequest(
            "End time must be in the future".to_string(),
        ));
    }

    if store.user_by_id(request.seller_id).await?.is_none() {
        return Err(ApiError::NotFound("Seller not found".to_string()));
    }

    let auction = store
        .insert_auction(NewAuction {
            title,
            description: request.description.trim().to_string(),
            starting_price: request.starting_price,
            seller_id: request.seller_id,
            ends_at: request.ends_at,
        })
        .await?;

    info!(auction_id = %auction.id, "auction created");

    Ok((
        StatusCode::CREATED,
        Json(AuctionResponse::from_auction(auction, now)),
    ))
}

#[utoipa::path(
    get,
    path= "/api/auctions/{id}",
    params(("id" = Uuid, Path, description = "Auction id")),
    responses (
        (status = 200, description = "Auction", body = AuctionResponse),
        (status = 404, description = "Auction not found", body = MessageBody),
    ),
    tag= "auctions"
)]
pub async fn show(
    store: Extension<SharedStore>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<AuctionResponse>, ApiError> {
    let id = path(id)?;
    let auction = store
        .auction_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(AUCTION_NOT_FOUND.to_string()))?;

    Ok(Json(AuctionResponse::from_auction(auction, Utc::now())))
}

#[utoipa::path(
    put,
    path= "/api/auctions/{id}",
    params(("id" = Uuid, Path, description = "Auction id")),
    request_body = UpdateAuctionRequest,
    responses (
        (status = 200, description = "Auction updated", body = AuctionResponse),
        (status = 403, description = "Caller is not the seller", body = MessageBody),
        (status = 404, description = "Auction not found", body = MessageBody),
        (status = 409, description = "Auction already has bids", body = MessageBody),
    ),
    tag= "auctions"
)]
#[instrument(skip(store, body))]
pub async fn update(
    store: Extension<SharedStore>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateAuctionRequest>, JsonRejection>,
) -> Result<Json<AuctionResponse>, ApiError> {
    let id = path(id)?;
    let request = payload(body)?;

    owned_auction(&store, id, request.seller_id).await?;

    let title = request.title.map(|t| t.trim().to_string());
    if title.as_deref().is_some_and(str::is_empty) {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let auction = store
        .update_auction(
            id,
            AuctionChanges {
                title,
                description: request.description.map(|d| d.trim().to_string()),
            },
        )
        .await
        .map_err(not_found)?;

    Ok(Json(AuctionResponse::from_auction(auction, Utc::now())))
}

#[utoipa::path(
    delete,
    path= "/api/auctions/{id}",
    params(("id" = Uuid, Path, description = "Auction id"), SellerQuery),
    responses (
        (status = 204, description = "Auction deleted"),
        (status = 403, description = "Caller is not the seller", body = MessageBody),
        (status = 404, description = "Auction not found", body = MessageBody),
    ),
    tag= "auctions"
)]
#[instrument(skip(store))]
pub async fn remove(
    store: Extension<SharedStore>,
    id: Result<Path<Uuid>, PathRejection>,
    seller: Result<Query<SellerQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path(id)?;
    let SellerQuery { seller_id } = query(seller)?;

    owned_auction(&store, id, seller_id).await?;

    store.delete_auction(id).await.map_err(not_found)?;

    info!(auction_id = %id, "auction deleted");

    Ok(StatusCode::NO_CONTENT)
}
