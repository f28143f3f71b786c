use super::{
    error::MessageBody,
    handlers::{auctions, bids, health, root, users},
};
use utoipa::{
    openapi::{Contact, License, Tag},
    OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        health::health,
        users::register,
        users::login,
        users::profile,
        auctions::list,
        auctions::create,
        auctions::show,
        auctions::update,
        auctions::remove,
        bids::place,
        bids::for_auction,
    ),
    components(schemas(
        MessageBody,
        health::Health,
        users::RegisterUser,
        users::LoginUser,
        users::UserProfile,
        users::UserEnvelope,
        auctions::CreateAuctionRequest,
        auctions::UpdateAuctionRequest,
        auctions::AuctionResponse,
        bids::PlaceBidRequest,
        bids::BidResponse,
    ))
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    // Cargo.toml metadata instead of the derive defaults.
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = optional_str(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
    doc.info.contact = cargo_contact();
    doc.info.license = cargo_license();

    doc.tags = Some(vec![
        tag("users", "Registration, login and profiles"),
        tag("auctions", "Auction listings"),
        tag("bids", "Bidding"),
        tag("health", "Liveness and readiness"),
    ]);

    doc
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.find('<') {
        Some(start) => (
            non_empty(author[..start].trim()),
            non_empty(author[start + 1..].trim_end_matches('>').trim()),
        ),
        None => (non_empty(author.trim()), None),
    }
}
