//! User endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use verdant_common::{AppResult, PageRequest};
use verdant_core::{LoginInput, Profile, RegisterInput, SavedPlantSummary, UpdateProfileInput};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{Created, MessageResponse},
};

const SAVED_PLANTS_PER_PAGE: u64 = 6;

/// Registration response.
#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub access_token: String,
}

/// Login response.
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Page query parameters.
///
/// Kept as strings so that malformed numbers fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl PageQuery {
    pub(crate) fn to_request(&self, default_per_page: u64) -> PageRequest {
        PageRequest::parse(
            self.page.as_deref(),
            self.per_page.as_deref(),
            default_per_page,
        )
    }
}

/// Saved plants response.
#[derive(Serialize)]
pub struct SavedPlantsResponse {
    pub plants: Vec<SavedPlantSummary>,
    pub total_pages: u64,
    pub current_page: u64,
    pub total_items: u64,
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterInput>,
) -> AppResult<Created<RegisterResponse>> {
    let access_token = state.user_service.register(req).await?;

    Ok(Created(RegisterResponse {
        message: "User registered successfully",
        access_token,
    }))
}

/// Exchange credentials for an access token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginInput>,
) -> AppResult<Json<TokenResponse>> {
    let access_token = state.user_service.login(req).await?;
    Ok(Json(TokenResponse { access_token }))
}

/// Get the caller's profile.
async fn profile(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Profile>> {
    let profile = state.user_service.get_profile(user_id).await?;
    Ok(Json(profile))
}

/// Update the caller's profile.
async fn update(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<Json<MessageResponse>> {
    state.user_service.update_profile(user_id, req).await?;
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

/// List the caller's saved plants.
async fn saved_plants(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<SavedPlantsResponse>> {
    let page = state
        .saved_plant_service
        .list_saved(user_id, query.to_request(SAVED_PLANTS_PER_PAGE))
        .await?;

    Ok(Json(SavedPlantsResponse {
        total_pages: page.pages,
        current_page: page.page,
        total_items: page.total,
        plants: page.items,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/update", put(update))
        .route("/saved-plants", get(saved_plants))
}
