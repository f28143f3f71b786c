//! # Gavel (Online Auction System)
//!
//! `gavel` is a small auction backend plus the client side of its registration
//! flow.
//!
//! ## API
//!
//! The HTTP surface answers a liveness probe on `/` and mounts three resource
//! routers: `/api/users` (registration, login, profiles), `/api/auctions`
//! (listings) and `/api/bids`. Every error body is `{"message": "..."}` so
//! clients can surface server-provided text directly.
//!
//! ## Storage
//!
//! Handlers only see the [`store::Store`] trait. Production runs on
//! `PostgreSQL` through `sqlx`; tests and local experiments use the in-memory
//! store. Placing a bid is atomic with respect to the auction's current price.
//!
//! ## Client
//!
//! [`client::signup`] models the signup form: local password confirmation,
//! one `POST /api/users/register`, then navigation to `/login` or an inline
//! error. No session or token is issued by the API.

pub mod api;
pub mod cli;
pub mod client;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
