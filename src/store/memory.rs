use super::{
    check_bid, Auction, AuctionChanges, Bid, BidRejection, NewAuction, NewBid, NewUser, Store,
    StoreError, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    auctions: Vec<Auction>,
    bids: Vec<Bid>,
}

/// Process-local store. Records live in insertion order and vanish on drop.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("User already exists".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());

        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, StoreError> {
        let mut inner = self.inner.write().await;

        let auction = Auction {
            id: Uuid::new_v4(),
            title: auction.title,
            description: auction.description,
            starting_price: auction.starting_price,
            current_price: auction.starting_price,
            seller_id: auction.seller_id,
            ends_at: auction.ends_at,
            created_at: Utc::now(),
        };
        inner.auctions.push(auction.clone());

        Ok(auction)
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.auctions.iter().rev().cloned().collect())
    }

    async fn auction_by_id(&self, id: Uuid) -> Result<Option<Auction>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.auctions.iter().find(|a| a.id == id).cloned())
    }

    async fn update_auction(
        &self,
        id: Uuid,
        changes: AuctionChanges,
    ) -> Result<Auction, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.bids.iter().any(|b| b.auction_id == id) {
            return Err(StoreError::Conflict(
                "Auction already has bids".to_string(),
            ));
        }

        let auction = inner
            .auctions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(title) = changes.title {
            auction.title = title;
        }
        if let Some(description) = changes.description {
            auction.description = description;
        }

        Ok(auction.clone())
    }

    async fn delete_auction(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        let before = inner.auctions.len();
        inner.auctions.retain(|a| a.id != id);
        if inner.auctions.len() == before {
            return Err(StoreError::NotFound);
        }
        inner.bids.retain(|b| b.auction_id != id);

        Ok(())
    }

    async fn place_bid(&self, bid: NewBid, now: DateTime<Utc>) -> Result<Bid, StoreError> {
        let mut inner = self.inner.write().await;

        let auction = inner
            .auctions
            .iter_mut()
            .find(|a| a.id == bid.auction_id)
            .ok_or(StoreError::BidRejected(BidRejection::AuctionNotFound))?;

        check_bid(
            auction.seller_id,
            auction.current_price,
            auction.ends_at,
            &bid,
            now,
        )
        .map_err(StoreError::BidRejected)?;

        auction.current_price = bid.amount;

        let bid = Bid {
            id: Uuid::new_v4(),
            auction_id: bid.auction_id,
            bidder_id: bid.bidder_id,
            amount: bid.amount,
            created_at: now,
        };
        inner.bids.push(bid.clone());

        Ok(bid)
    }

    async fn bids_for_auction(&self, auction_id: Uuid) -> Result<Vec<Bid>, StoreError> {
        let inner = self.inner.read().await;

        let mut bids: Vec<Bid> = inner
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.amount.cmp(&a.amount));

        Ok(bids)
    }
}
