//! Persistence for users, auctions and bids.
//!
//! Handlers depend on the [`Store`] trait only. [`PgStore`] is the production
//! backend; [`MemoryStore`] backs tests and throwaway local runs. Both enforce
//! the same bid rules through [`check_bid`] while holding their respective
//! locks, so the current price of an auction only ever increases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Auction {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Prices are integer cents.
    pub starting_price: i64,
    pub current_price: i64,
    pub seller_id: Uuid,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.ends_at
    }
}

#[derive(Clone, Debug)]
pub struct NewAuction {
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub seller_id: Uuid,
    pub ends_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default)]
pub struct AuctionChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bid {
    pub id: Uuid,
    pub auction_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewBid {
    pub auction_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: i64,
}

/// Why a bid was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BidRejection {
    AuctionNotFound,
    OwnAuction,
    AuctionEnded,
    TooLow { current_price: i64 },
}

impl fmt::Display for BidRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuctionNotFound => write!(f, "Auction not found"),
            Self::OwnAuction => write!(f, "Sellers cannot bid on their own auction"),
            Self::AuctionEnded => write!(f, "Auction has ended"),
            Self::TooLow { .. } => write!(f, "Bid must be higher than the current price"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BidRejected(BidRejection),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by `/health`.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, StoreError>;
    /// Newest first.
    async fn list_auctions(&self) -> Result<Vec<Auction>, StoreError>;
    async fn auction_by_id(&self, id: Uuid) -> Result<Option<Auction>, StoreError>;
    /// Fails with [`StoreError::Conflict`] once the auction has received a bid.
    async fn update_auction(&self, id: Uuid, changes: AuctionChanges)
        -> Result<Auction, StoreError>;
    /// Removes the auction together with its bids.
    async fn delete_auction(&self, id: Uuid) -> Result<(), StoreError>;

    /// Validates and records a bid atomically, raising the auction's current price.
    async fn place_bid(&self, bid: NewBid, now: DateTime<Utc>) -> Result<Bid, StoreError>;
    /// Highest amount first.
    async fn bids_for_auction(&self, auction_id: Uuid) -> Result<Vec<Bid>, StoreError>;
}

/// Bid rules shared by every backend. Callers must hold the auction lock.
pub(crate) fn check_bid(
    seller_id: Uuid,
    current_price: i64,
    ends_at: DateTime<Utc>,
    bid: &NewBid,
    now: DateTime<Utc>,
) -> Result<(), BidRejection> {
    if bid.bidder_id == seller_id {
        return Err(BidRejection::OwnAuction);
    }

    if now >= ends_at {
        return Err(BidRejection::AuctionEnded);
    }

    if bid.amount <= current_price {
        return Err(BidRejection::TooLow { current_price });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_bid(bidder_id: Uuid, amount: i64) -> NewBid {
        NewBid {
            auction_id: Uuid::new_v4(),
            bidder_id,
            amount,
        }
    }

    #[test]
    fn check_bid_accepts_higher_amount() {
        let now = Utc::now();
        let result = check_bid(
            Uuid::new_v4(),
            1_000,
            now + Duration::hours(1),
            &new_bid(Uuid::new_v4(), 1_001),
            now,
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn check_bid_rejects_equal_amount() {
        let now = Utc::now();
        let result = check_bid(
            Uuid::new_v4(),
            1_000,
            now + Duration::hours(1),
            &new_bid(Uuid::new_v4(), 1_000),
            now,
        );
        assert_eq!(
            result,
            Err(BidRejection::TooLow {
                current_price: 1_000
            })
        );
    }

    #[test]
    fn check_bid_rejects_seller() {
        let now = Utc::now();
        let seller = Uuid::new_v4();
        let result = check_bid(
            seller,
            1_000,
            now + Duration::hours(1),
            &new_bid(seller, 5_000),
            now,
        );
        assert_eq!(result, Err(BidRejection::OwnAuction));
    }

    #[test]
    fn check_bid_rejects_at_deadline() {
        let now = Utc::now();
        let result = check_bid(Uuid::new_v4(), 1_000, now, &new_bid(Uuid::new_v4(), 5_000), now);
        assert_eq!(result, Err(BidRejection::AuctionEnded));
    }

    #[test]
    fn auction_is_open_until_deadline() {
        let now = Utc::now();
        let auction = Auction {
            id: Uuid::new_v4(),
            title: "Lamp".to_string(),
            description: String::new(),
            starting_price: 100,
            current_price: 100,
            seller_id: Uuid::new_v4(),
            ends_at: now + Duration::seconds(1),
            created_at: now,
        };
        assert!(auction.is_open(now));
        assert!(!auction.is_open(now + Duration::seconds(1)));
    }
}
