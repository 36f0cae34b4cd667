//! Plant catalog endpoints.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, FromRequest, Multipart, Query, Request, State, multipart::MultipartError,
    },
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use verdant_common::{AppError, AppResult};
use verdant_core::{
    CommentView, ImageUpload, MAX_IMAGE_BYTES, NewComment, PlantDetail, PlantSummary,
};

use super::users::PageQuery;
use crate::{
    extractors::{AuthUser, MaybeAuthUser, PlantId},
    middleware::AppState,
    response::Created,
};

const PLANTS_PER_PAGE: u64 = 10;
const COMMENTS_PER_PAGE: u64 = 10;

/// Room for the form fields around a maximum-size image.
const COMMENT_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

/// Catalog listing query.
#[derive(Debug, Default, Deserialize)]
pub struct ListPlantsQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
}

/// Catalog listing response.
#[derive(Serialize)]
pub struct PlantListResponse {
    pub plants: Vec<PlantSummary>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
}

/// JSON comment body.
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

/// Comment listing response.
#[derive(Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentView>,
    pub total_pages: u64,
    pub current_page: u64,
    pub total_comments: u64,
}

/// Like toggle response.
#[derive(Serialize)]
pub struct LikeResponse {
    pub message: &'static str,
    pub liked: bool,
    pub likes_count: u64,
}

/// Save toggle response.
#[derive(Serialize)]
pub struct SaveResponse {
    pub message: &'static str,
    pub saved: bool,
    pub saves_count: u64,
}

/// List the catalog.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListPlantsQuery>,
) -> AppResult<Json<PlantListResponse>> {
    let page = PageQuery {
        page: query.page,
        per_page: query.per_page,
    }
    .to_request(PLANTS_PER_PAGE);

    let page = state
        .plant_service
        .list(query.search.as_deref(), page)
        .await?;

    Ok(Json(PlantListResponse {
        total: page.total,
        pages: page.pages,
        current_page: page.page,
        plants: page.items,
    }))
}

/// Show a plant.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    PlantId(plant_id): PlantId,
    State(state): State<AppState>,
) -> AppResult<Json<PlantDetail>> {
    let detail = state.plant_service.get_detail(plant_id, viewer).await?;
    Ok(Json(detail))
}

/// Post a comment as multipart (`content`, `image`) or JSON (`content`).
async fn add_comment(
    AuthUser(user_id): AuthUser,
    PlantId(plant_id): PlantId,
    State(state): State<AppState>,
    req: Request,
) -> AppResult<Created<CommentView>> {
    let input = if is_multipart(req.headers()) {
        let multipart = Multipart::from_request(req, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        read_comment_form(multipart).await?
    } else {
        let Json(body) = Json::<CommentRequest>::from_request(req, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        NewComment {
            content: body.content,
            image: None,
        }
    };

    let comment = state
        .comment_service
        .add_comment(plant_id, user_id, input)
        .await?;

    Ok(Created(comment))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

async fn read_comment_form(mut multipart: Multipart) -> AppResult<NewComment> {
    let mut input = NewComment::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "content" => {
                input.content = Some(field.text().await.map_err(multipart_error)?);
            }
            "image" => {
                let has_file_name = field.file_name().is_some_and(|n| !n.is_empty());
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                // Browsers send an empty part when no file was picked
                if has_file_name || !data.is_empty() {
                    input.image = Some(ImageUpload { data, content_type });
                }
            }
            _ => {}
        }
    }

    Ok(input)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::debug!(error = %err, "Comment body over limit");
        AppError::PayloadTooLarge("Image exceeds the 5 MB limit".to_string())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// List a plant's comments, newest first.
async fn list_comments(
    PlantId(plant_id): PlantId,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<CommentListResponse>> {
    let page = state
        .comment_service
        .list_comments(plant_id, query.to_request(COMMENTS_PER_PAGE))
        .await?;

    Ok(Json(CommentListResponse {
        total_pages: page.pages,
        current_page: page.page,
        total_comments: page.total,
        comments: page.items,
    }))
}

/// Like or unlike a plant.
async fn toggle_like(
    AuthUser(user_id): AuthUser,
    PlantId(plant_id): PlantId,
    State(state): State<AppState>,
) -> AppResult<Json<LikeResponse>> {
    let outcome = state.like_service.toggle(user_id, plant_id).await?;

    Ok(Json(LikeResponse {
        message: if outcome.active {
            "Plant liked successfully"
        } else {
            "Plant unliked successfully"
        },
        liked: outcome.active,
        likes_count: outcome.count,
    }))
}

/// Add a plant to, or remove it from, the caller's list.
async fn toggle_save(
    AuthUser(user_id): AuthUser,
    PlantId(plant_id): PlantId,
    State(state): State<AppState>,
) -> AppResult<Json<SaveResponse>> {
    let outcome = state.saved_plant_service.toggle(user_id, plant_id).await?;

    Ok(Json(SaveResponse {
        message: if outcome.active {
            "Plant saved to My List"
        } else {
            "Plant removed from My List"
        },
        saved: outcome.active,
        saves_count: outcome.count,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
        .route(
            "/{id}/comments",
            post(add_comment)
                .get(list_comments)
                .layer(DefaultBodyLimit::max(COMMENT_BODY_LIMIT)),
        )
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/save", post(toggle_save))
}
