//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware, authorize},
    models::{NewUser, UpdateUser, UserResponse},
    password, validation,
};

/// Request for login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/users/:username",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:username/favorites", get(get_favorites))
        .route(
            "/users/:username/favorites/:movie_id",
            post(add_favorite).delete(remove_favorite),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(register))
        .route("/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "cinevault-api"
    }))
}

/// Register a new account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_username(&payload.username).map_err(ApiError::Validation)?;
    validation::validate_email(&payload.email).map_err(ApiError::Validation)?;
    validation::validate_password(&payload.password).map_err(ApiError::Validation)?;

    let account = state.user_repository.create(&payload).await.map_err(|e| {
        if let ApiError::Conflict(_) = e {
            ApiError::Conflict(format!("{} already exists", payload.username))
        } else {
            e
        }
    })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

/// Login endpoint
///
/// Unknown username and wrong password produce the same response; the
/// distinction only reaches the logs.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for account: {}", payload.username);

    if !state.rate_limiter.is_allowed(&payload.username).await {
        return Err(ApiError::TooManyRequests);
    }

    let account = state
        .user_repository
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(|| {
            warn!("Login failed for unknown account: {}", payload.username);
            ApiError::Unauthenticated
        })?;

    if !password::verify_password(&payload.password, &account.password_hash) {
        warn!("Login failed for account: {}", payload.username);
        return Err(ApiError::Unauthenticated);
    }

    let access_token = state.jwt_service.issue(&account.username)?;

    let response = LoginResponse {
        user: UserResponse::from(account),
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.token_expiry(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Get an account's profile
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    authorize(&auth_user, &username)?;

    let account = state
        .user_repository
        .find_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} was not found", username)))?;

    Ok(Json(UserResponse::from(account)))
}

/// Update an account's profile
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    authorize(&auth_user, &username)?;

    if let Some(email) = &payload.email {
        validation::validate_email(email).map_err(ApiError::Validation)?;
    }
    if let Some(password) = &payload.password {
        validation::validate_password(password).map_err(ApiError::Validation)?;
    }

    let account = state.user_repository.update(&username, &payload).await?;

    Ok(Json(UserResponse::from(account)))
}

/// Delete an account
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    authorize(&auth_user, &username)?;

    let deleted = state.user_repository.delete(&username).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("{} was not found", username)));
    }

    Ok(Json(json!({
        "message": format!("{} was deleted", username)
    })))
}

/// Get an account's favorite movies in insertion order
pub async fn get_favorites(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    authorize(&auth_user, &username)?;

    let favorites = state.user_repository.list_favorites(&username).await?;

    Ok(Json(favorites))
}

/// Add a movie to an account's favorites
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((username, movie_id)): Path<(String, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    authorize(&auth_user, &username)?;

    let account = state
        .user_repository
        .add_favorite(&username, movie_id)
        .await?;

    Ok(Json(UserResponse::from(account)))
}

/// Remove a movie from an account's favorites
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((username, movie_id)): Path<(String, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    authorize(&auth_user, &username)?;

    let account = state
        .user_repository
        .remove_favorite(&username, movie_id)
        .await?;

    Ok(Json(UserResponse::from(account)))
}
