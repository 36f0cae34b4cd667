//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, User, comment, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};
use verdant_common::{AppError, AppResult, PageRequest};

/// A comment joined with its author.
pub type CommentWithAuthor = (comment::Model, Option<user::Model>);

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All comments on a plant with their authors, newest first.
    pub async fn find_by_plant(&self, plant_id: i32) -> AppResult<Vec<CommentWithAuthor>> {
        Self::newest_first(plant_id)
            .find_also_related(User)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One page of comments on a plant with their authors, newest first.
    pub async fn find_by_plant_paginated(
        &self,
        plant_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<CommentWithAuthor>, u64)> {
        let total = Self::newest_first(plant_id)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if page.is_past_end(total) {
            return Ok((Vec::new(), total));
        }

        let items = Self::newest_first(plant_id)
            .find_also_related(User)
            .paginate(self.db.as_ref(), page.per_page)
            .fetch_page(page.index())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    fn newest_first(plant_id: i32) -> Select<Comment> {
        Comment::find()
            .filter(comment::Column::PlantId.eq(plant_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_comment(id: i32, user_id: i32, plant_id: i32) -> comment::Model {
        comment::Model {
            id,
            content: format!("comment {id}"),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, id as u32).unwrap().into(),
            user_id,
            plant_id,
            image_key: None,
        }
    }

    fn create_test_user(id: i32) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
        }
    }

    #[tokio::test]
    async fn test_find_by_plant_includes_author() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    (create_test_comment(2, 1, 5), create_test_user(1)),
                    (create_test_comment(1, 2, 5), create_test_user(2)),
                ]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let comments = repo.find_by_plant(5).await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].0.id, 2);
        assert_eq!(comments[0].1.as_ref().unwrap().username, "user1");
    }

    #[tokio::test]
    async fn test_find_by_plant_paginated_counts_all() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(21))
                }]])
                .append_query_results([[(create_test_comment(1, 1, 5), create_test_user(1))]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let page = PageRequest::new(Some(3), Some(10), 10);
        let (items, total) = repo.find_by_plant_paginated(5, page).await.unwrap();

        assert_eq!(total, 21);
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_plant_paginated_past_end() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let page = PageRequest::new(Some(i64::MAX), Some(10), 10);
        let (items, total) = repo.find_by_plant_paginated(5, page).await.unwrap();

        assert_eq!(total, 4);
        assert!(items.is_empty());
    }
}
