//! `PostgreSQL` backend built on a `sqlx` pool.
//!
//! Queries are runtime-checked (`sqlx::query`) so the crate builds without a
//! live database. Bid placement and auction edits both lock the auction row
//! (`FOR UPDATE`) inside a transaction, so an edit never lands after a bid.

use super::{
    check_bid, Auction, AuctionChanges, Bid, BidRejection, NewAuction, NewBid, NewUser, Store,
    StoreError, User,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    Connection, PgPool, Row,
};
use std::time::Duration;
use tracing::{info_span, Instrument, Span};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const AUCTION_COLUMNS: &str =
    "id, title, description, starting_price, current_price, seller_id, ends_at, created_at";

/// Serializes bids and edits on one auction.
const LOCK_AUCTION: &str =
    "SELECT seller_id, current_price, ends_at FROM auctions WHERE id = $1 FOR UPDATE";

const HAS_BIDS: &str = "SELECT EXISTS (SELECT 1 FROM bids WHERE auction_id = $1)";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database.
    /// # Errors
    /// Returns an error if no connection can be established.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply `sql/schema.sql`, one statement at a time.
    /// # Errors
    /// Returns an error naming the statement that failed.
    pub async fn migrate(&self) -> Result<()> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection for schema setup")?;

        for (index, statement) in split_sql_statements(SCHEMA_SQL).iter().enumerate() {
            sqlx::query(statement)
                .execute(&mut *connection)
                .instrument(db_span("MIGRATE", statement))
                .await
                .with_context(|| format!("Failed to execute schema statement {}", index + 1))?;
        }

        Ok(())
    }
}

fn db_span(operation: &str, statement: &str) -> Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Splits the schema into statements. Assumes `;` only ever ends a statement
/// and drops `--` comment lines.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

fn auction_from_row(row: &PgRow) -> Result<Auction, sqlx::Error> {
    Ok(Auction {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        starting_price: row.try_get("starting_price")?,
        current_price: row.try_get("current_price")?,
        seller_id: row.try_get("seller_id")?,
        ends_at: row.try_get("ends_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn bid_from_row(row: &PgRow) -> Result<Bid, sqlx::Error> {
    Ok(Bid {
        id: row.try_get("id")?,
        auction_id: row.try_get("auction_id")?,
        bidder_id: row.try_get("bidder_id")?,
        amount: row.try_get("amount")?,
        created_at: row.try_get("created_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;

        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = "INSERT INTO users (id, name, email, password_hash, created_at) \
                     VALUES ($1, $2, $3, $4, $5) \
                     RETURNING id, name, email, password_hash, created_at";

        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", query))
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::Conflict("User already exists".to_string())
                } else {
                    StoreError::Database(err)
                }
            })?;

        Ok(user_from_row(&row)?)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1";

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1";

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn insert_auction(&self, auction: NewAuction) -> Result<Auction, StoreError> {
        let query = format!(
            "INSERT INTO auctions \
             (id, title, description, starting_price, current_price, seller_id, ends_at, created_at) \
             VALUES ($1, $2, $3, $4, $4, $5, $6, $7) RETURNING {AUCTION_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(&auction.title)
            .bind(&auction.description)
            .bind(auction.starting_price)
            .bind(auction.seller_id)
            .bind(auction.ends_at)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await?;

        Ok(auction_from_row(&row)?)
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>, StoreError> {
        let query = format!("SELECT {AUCTION_COLUMNS} FROM auctions ORDER BY created_at DESC");

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;

        Ok(rows
            .iter()
            .map(auction_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn auction_by_id(&self, id: Uuid) -> Result<Option<Auction>, StoreError> {
        let query = format!("SELECT {AUCTION_COLUMNS} FROM auctions WHERE id = $1");

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?;

        Ok(row.as_ref().map(auction_from_row).transpose()?)
    }

    async fn update_auction(
        &self,
        id: Uuid,
        changes: AuctionChanges,
    ) -> Result<Auction, StoreError> {
        let mut tx = self.pool.begin().await?;

        // a concurrent bid either commits first and is counted, or waits
        if sqlx::query(LOCK_AUCTION)
            .bind(id)
            .fetch_optional(&mut *tx)
            .instrument(db_span("SELECT", LOCK_AUCTION))
            .await?
            .is_none()
        {
            return Err(StoreError::NotFound);
        }

        let has_bids: bool = sqlx::query_scalar(HAS_BIDS)
            .bind(id)
            .fetch_one(&mut *tx)
            .instrument(db_span("SELECT", HAS_BIDS))
            .await?;
        if has_bids {
            return Err(StoreError::Conflict("Auction already has bids".to_string()));
        }

        let query = format!(
            "UPDATE auctions SET \
             title = COALESCE($2, title), description = COALESCE($3, description) \
             WHERE id = $1 RETURNING {AUCTION_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .fetch_one(&mut *tx)
            .instrument(db_span("UPDATE", &query))
            .await?;

        tx.commit().await?;

        Ok(auction_from_row(&row)?)
    }

    async fn delete_auction(&self, id: Uuid) -> Result<(), StoreError> {
        let query = "DELETE FROM auctions WHERE id = $1";

        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn place_bid(&self, bid: NewBid, now: DateTime<Utc>) -> Result<Bid, StoreError> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query(LOCK_AUCTION)
            .bind(bid.auction_id)
            .fetch_optional(&mut *tx)
            .instrument(db_span("SELECT", LOCK_AUCTION))
            .await?
        else {
            return Err(StoreError::BidRejected(BidRejection::AuctionNotFound));
        };

        let seller_id: Uuid = row.try_get("seller_id")?;
        let current_price: i64 = row.try_get("current_price")?;
        let ends_at: DateTime<Utc> = row.try_get("ends_at")?;

        check_bid(seller_id, current_price, ends_at, &bid, now).map_err(StoreError::BidRejected)?;

        let insert = "INSERT INTO bids (id, auction_id, bidder_id, amount, created_at) \
                      VALUES ($1, $2, $3, $4, $5) \
                      RETURNING id, auction_id, bidder_id, amount, created_at";
        let row = sqlx::query(insert)
            .bind(Uuid::new_v4())
            .bind(bid.auction_id)
            .bind(bid.bidder_id)
            .bind(bid.amount)
            .bind(now)
            .fetch_one(&mut *tx)
            .instrument(db_span("INSERT", insert))
            .await?;

        let update = "UPDATE auctions SET current_price = $2 WHERE id = $1";
        sqlx::query(update)
            .bind(bid.auction_id)
            .bind(bid.amount)
            .execute(&mut *tx)
            .instrument(db_span("UPDATE", update))
            .await?;

        tx.commit().await?;

        Ok(bid_from_row(&row)?)
    }

    async fn bids_for_auction(&self, auction_id: Uuid) -> Result<Vec<Bid>, StoreError> {
        let query = "SELECT id, auction_id, bidder_id, amount, created_at FROM bids \
                     WHERE auction_id = $1 ORDER BY amount DESC";

        let rows = sqlx::query(query)
            .bind(auction_id)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(rows.iter().map(bid_from_row).collect::<Result<Vec<_>, _>>()?)
    }
}
