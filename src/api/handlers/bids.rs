use super::{path, payload, SharedStore};
use crate::{
    api::error::{ApiError, MessageBody},
    store::{Bid, NewBid},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize, Debug)]
pub struct PlaceBidRequest {
    pub auction_id: Uuid,
    pub bidder_id: Uuid,
    /// Cents.
    pub amount: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BidResponse {
    pub id: Uuid,
    pub auction_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Bid> for BidResponse {
    fn from(bid: Bid) -> Self {
        Self {
            id: bid.id,
            auction_id: bid.auction_id,
            bidder_id: bid.bidder_id,
            amount: bid.amount,
            created_at: bid.created_at,
        }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(place))
        .route("/:auction_id", get(for_auction))
}

#[utoipa::path(
    post,
    path= "/api/bids",
    request_body = PlaceBidRequest,
    responses (
        (status = 201, description = "Bid accepted", body = BidResponse),
        (status = 400, description = "Auction ended or bid too low", body = MessageBody),
        (status = 403, description = "Seller bidding on own auction", body = MessageBody),
        (status = 404, description = "Auction or bidder not found", body = MessageBody),
    ),
    tag= "bids"
)]
#[instrument(skip(store, body))]
pub async fn place(
    store: Extension<SharedStore>,
    body: Result<Json<PlaceBidRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BidResponse>), ApiError> {
    let request = payload(body)?;

    if store.user_by_id(request.bidder_id).await?.is_none() {
        return Err(ApiError::NotFound("Bidder not found".to_string()));
    }

    let bid = store
        .place_bid(
            NewBid {
                auction_id: request.auction_id,
                bidder_id: request.bidder_id,
                amount: request.amount,
            },
            Utc::now(),
        )
        .await?;

    info!(bid_id = %bid.id, auction_id = %bid.auction_id, amount = bid.amount, "bid placed");

    Ok((StatusCode::CREATED, Json(bid.into())))
}

#[utoipa::path(
    get,
    path= "/api/bids/{auction_id}",
    params(("auction_id" = Uuid, Path, description = "Auction id")),
    responses (
        (status = 200, description = "Bids, highest first", body = [BidResponse]),
        (status = 404, description = "Auction not found", body = MessageBody),
    ),
    tag= "bids"
)]
pub async fn for_auction(
    store: Extension<SharedStore>,
    auction_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<BidResponse>>, ApiError> {
    let auction_id = path(auction_id)?;

    if store.auction_by_id(auction_id).await?.is_none() {
        return Err(ApiError::NotFound("Auction not found".to_string()));
    }

    let bids = store.bids_for_auction(auction_id).await?;

    Ok(Json(bids.into_iter().map(BidResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::tests::{call, json_request, test_app};
    use crate::store::{NewAuction, NewUser, Store};
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use chrono::Duration;
    use serde_json::json;

    struct Fixture {
        seller: Uuid,
        bidder: Uuid,
        auction: Uuid,
    }

    async fn fixture(store: &SharedStore, ends_in: Duration) -> Fixture {
        let mut ids = Vec::new();
        for name in ["seller", "bidder"] {
            let user = store
                .insert_user(NewUser {
                    name: name.to_string(),
                    email: format!("{name}@example.com"),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let auction = store
            .insert_auction(NewAuction {
                title: "Bike".to_string(),
                description: String::new(),
                starting_price: 10_000,
                seller_id: ids[0],
                ends_at: Utc::now() + ends_in,
            })
            .await
            .unwrap();

        Fixture {
            seller: ids[0],
            bidder: ids[1],
            auction: auction.id,
        }
    }

    fn bid(auction: Uuid, bidder: Uuid, amount: i64) -> Request<Body> {
        json_request(
            Method::POST,
            "/api/bids",
            &json!({"auction_id": auction, "bidder_id": bidder, "amount": amount}),
        )
    }

    #[tokio::test]
    async fn accepted_bid_raises_price() {
        let (app, store) = test_app();
        let f = fixture(&store, Duration::hours(1)).await;

        let (status, body) = call(&app, bid(f.auction, f.bidder, 12_500)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["amount"], 12_500);

        let auction = store.auction_by_id(f.auction).await.unwrap().unwrap();
        assert_eq!(auction.current_price, 12_500);
    }

    #[tokio::test]
    async fn low_bid_is_rejected() {
        let (app, store) = test_app();
        let f = fixture(&store, Duration::hours(1)).await;

        let (status, body) = call(&app, bid(f.auction, f.bidder, 10_000)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Bid must be higher than the current price");
    }

    #[tokio::test]
    async fn seller_cannot_bid() {
        let (app, store) = test_app();
        let f = fixture(&store, Duration::hours(1)).await;

        let (status, body) = call(&app, bid(f.auction, f.seller, 20_000)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Sellers cannot bid on their own auction");
    }

    #[tokio::test]
    async fn ended_auction_rejects_bids() {
        let (app, store) = test_app();
        let f = fixture(&store, Duration::milliseconds(-1)).await;

        let (status, body) = call(&app, bid(f.auction, f.bidder, 20_000)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Auction has ended");
    }

    #[tokio::test]
    async fn unknown_auction_or_bidder_is_not_found() {
        let (app, store) = test_app();
        let f = fixture(&store, Duration::hours(1)).await;

        let (status, _) = call(&app, bid(Uuid::new_v4(), f.bidder, 20_000)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, bid(f.auction, Uuid::new_v4(), 20_000)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Bidder not found");
    }

    #[tokio::test]
    async fn lists_bids_highest_first() {
        let (app, store) = test_app();
        let f = fixture(&store, Duration::hours(1)).await;

        for amount in [11_000, 15_000] {
            let (status, _) = call(&app, bid(f.auction, f.bidder, amount)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let request = Request::builder()
            .uri(format!("/api/bids/{}", f.auction))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let amounts: Vec<i64> = body
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|b| b["amount"].as_i64())
            .collect();
        assert_eq!(amounts, vec![15_000, 11_000]);
    }
}
