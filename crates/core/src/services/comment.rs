//! Comment service.

use bytes::Bytes;
use sea_orm::Set;
use serde::Serialize;
use verdant_common::{AppError, AppResult, Page, PageRequest};
use verdant_db::{
    entities::{comment, user},
    repositories::{CommentRepository, PlantRepository, UserRepository},
};

use super::storage::StorageService;

/// Largest accepted comment image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Storage prefix for comment images.
const COMMENT_IMAGE_PREFIX: &str = "comments";

/// Format of `created_at` in API responses.
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A comment as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: i32,
    pub plant_id: i32,
    pub username: String,
    pub content: String,
    pub created_at: String,
    pub image_url: Option<String>,
}

impl CommentView {
    /// Build the view, signing the image key if there is one.
    pub async fn build(
        storage: &StorageService,
        comment: comment::Model,
        author: Option<user::Model>,
    ) -> Self {
        let image_url = storage.signed_url_opt(comment.image_key.as_deref()).await;
        Self {
            id: comment.id,
            plant_id: comment.plant_id,
            username: author.map(|u| u.username).unwrap_or_default(),
            content: comment.content,
            created_at: comment.created_at.format(CREATED_AT_FORMAT).to_string(),
            image_url,
        }
    }
}

/// An image attached to a new comment.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub data: Bytes,
    pub content_type: String,
}

/// Input for posting a comment.
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub content: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    plant_repo: PlantRepository,
    user_repo: UserRepository,
    storage: StorageService,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        plant_repo: PlantRepository,
        user_repo: UserRepository,
        storage: StorageService,
    ) -> Self {
        Self {
            comment_repo,
            plant_repo,
            user_repo,
            storage,
        }
    }

    /// Post a comment, uploading its image first if one is attached.
    ///
    /// Nothing is written when the upload fails.
    pub async fn add_comment(
        &self,
        plant_id: i32,
        user_id: i32,
        input: NewComment,
    ) -> AppResult<CommentView> {
        self.plant_repo.get_by_id(plant_id).await?;

        let author = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid user ID".to_string()))?;

        let content = input
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Content is required".to_string()))?;

        let image_key = match input.image {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };

        let model = comment::ActiveModel {
            content: Set(content),
            created_at: Set(chrono::Utc::now().into()),
            user_id: Set(user_id),
            plant_id: Set(plant_id),
            image_key: Set(image_key),
            ..Default::default()
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(
            comment_id = comment.id,
            plant_id,
            user_id,
            has_image = comment.image_key.is_some(),
            "Comment posted"
        );

        Ok(CommentView::build(&self.storage, comment, Some(author)).await)
    }

    /// One page of a plant's comments, newest first.
    pub async fn list_comments(
        &self,
        plant_id: i32,
        page: PageRequest,
    ) -> AppResult<Page<CommentView>> {
        self.plant_repo.get_by_id(plant_id).await?;

        let (rows, total) = self
            .comment_repo
            .find_by_plant_paginated(plant_id, page)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (comment, author) in rows {
            items.push(CommentView::build(&self.storage, comment, author).await);
        }

        Ok(Page::new(items, total, page))
    }

    async fn store_image(&self, image: ImageUpload) -> AppResult<String> {
        if !image.content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Attachment must be an image".to_string(),
            ));
        }

        if image.data.len() > MAX_IMAGE_BYTES {
            return Err(AppError::PayloadTooLarge(
                "Image exceeds the 5 MB limit".to_string(),
            ));
        }

        let stored = self
            .storage
            .upload(COMMENT_IMAGE_PREFIX, image.data, &image.content_type)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Comment image upload failed");
                AppError::Storage("Failed to upload image".to_string())
            })?;

        tracing::debug!(key = %stored.key, size = stored.size, "Stored comment image");
        Ok(stored.key)
    }
}
