use axum::{http::StatusCode, response::IntoResponse};

pub const ROOT_MESSAGE: &str = "Auction System API is running successfully!";

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API is up", body = String, content_type = "text/plain")
    ),
    tag = "health"
)]
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, ROOT_MESSAGE)
}
