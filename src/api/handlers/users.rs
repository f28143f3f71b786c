//! Registration, login and public profiles.
//!
//! Passwords are hashed with argon2 on a blocking thread and never leave this
//! module. Login only checks credentials; no session or token is issued.

use super::{path, payload, valid_email, SharedStore};
use crate::{
    api::error::{ApiError, MessageBody},
    store::{NewUser, StoreError, User},
};
use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
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
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MISSING_FIELDS: &str = "Please provide name, email and password";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(ToSchema, Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(ToSchema, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserProfile,
}

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/:id", get(profile))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: SecretString) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| anyhow!("Error hashing password: {err}"))
    })
    .await
    .map_err(|err| anyhow!("Password hashing task failed: {err}"))?
    .map_err(ApiError::from)
}

async fn verify_password(password: SecretString, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&hash).map_err(|err| anyhow!("Invalid stored hash: {err}"))?;
        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.expose_secret().as_bytes(), &parsed)
                .is_ok(),
        )
    })
    .await
    .map_err(|err| anyhow!("Password verification task failed: {err}"))?
    .map_err(ApiError::from)
}

#[utoipa::path(
    post,
    path= "/api/users/register",
    request_body = RegisterUser,
    responses (
        (status = 201, description = "Registration successful", body = UserEnvelope),
        (status = 400, description = "Missing fields or invalid email", body = MessageBody),
        (status = 409, description = "User with the specified email already exists", body = MessageBody),
    ),
    tag= "users"
)]
#[instrument(skip(store, body))]
pub async fn register(
    store: Extension<SharedStore>,
    body: Result<Json<RegisterUser>, JsonRejection>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    let user = payload(body)?;

    let name = user.name.trim().to_string();
    let email = normalize_email(&user.email);
    let password = SecretString::from(user.password);

    if name.is_empty() || email.is_empty() || password.expose_secret().is_empty() {
        return Err(ApiError::BadRequest(MISSING_FIELDS.to_string()));
    }

    if !valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".to_string()));
    }

    if store.user_by_email(&email).await?.is_some() {
        debug!("email already registered");
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password(password).await?;

    // the unique index still guards the race between the lookup and the insert
    let user = store
        .insert_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User registered successfully".to_string(),
            user: user.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path= "/api/users/login",
    request_body = LoginUser,
    responses (
        (status = 200, description = "Credentials accepted", body = UserEnvelope),
        (status = 401, description = "Invalid email or password", body = MessageBody),
    ),
    tag= "users"
)]
#[instrument(skip(store, body))]
pub async fn login(
    store: Extension<SharedStore>,
    body: Result<Json<LoginUser>, JsonRejection>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let credentials = payload(body)?;

    let email = normalize_email(&credentials.email);
    let password = SecretString::from(credentials.password);

    if email.is_empty() || password.expose_secret().is_empty() {
        return Err(ApiError::BadRequest(
            "Please provide email and password".to_string(),
        ));
    }

    let Some(user) = store.user_by_email(&email).await? else {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(password, user.password_hash.clone()).await? {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(UserEnvelope {
        message: "Login successful".to_string(),
        user: user.into(),
    }))
}

#[utoipa::path(
    get,
    path= "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses (
        (status = 200, description = "User profile", body = UserProfile),
        (status = 404, description = "User not found", body = MessageBody),
    ),
    tag= "users"
)]
pub async fn profile(
    store: Extension<SharedStore>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserProfile>, ApiError> {
    let id = path(id)?;

    match store.user_by_id(id).await {
        Ok(Some(user)) => Ok(Json(user.into())),
        Ok(None) | Err(StoreError::NotFound) => {
            Err(ApiError::NotFound("User not found".to_string()))
        }
        Err(err) => Err(err.into()),
    }
}
