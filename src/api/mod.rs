use crate::api::handlers::{auctions, bids, health, root, users, SharedStore};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::get,
    Extension, Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;

pub mod error;
pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Build the full application: root liveness, health, `OpenAPI` document and
/// the three resource routers, wrapped in request-id, tracing and CORS layers.
///
/// With no `origin` every request origin is mirrored back, which is only
/// meant for local development.
pub fn app(store: SharedStore, origin: Option<HeaderValue>) -> Router {
    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .route("/openapi.json", get(|| async { Json(openapi()) }))
        .nest("/api/users", users::router())
        .nest("/api/auctions", auctions::router())
        .nest("/api/bids", bids::router())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors_layer(origin))
                .layer(Extension(store)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(port: u16, store: SharedStore, origin: Option<HeaderValue>) -> Result<()> {
    let app = app(store, origin);

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Server running on port {port}");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn cors_layer(origin: Option<HeaderValue>) -> CorsLayer {
    let allow_origin = origin.map_or_else(AllowOrigin::mirror_request, AllowOrigin::exact);

    CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_origin(allow_origin)
        .allow_credentials(true)
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

/// Reduce a frontend URL to the `scheme://host[:port]` form browsers send in
/// the `Origin` header.
/// # Errors
/// Return error if the URL does not parse or has no host
pub fn frontend_origin(frontend_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(frontend_url).with_context(|| format!("Invalid origin URL: {frontend_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Origin URL must include a valid host: {frontend_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build origin header")
}
