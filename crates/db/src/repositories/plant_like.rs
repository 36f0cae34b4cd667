//! Plant like repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{PlantLike, plant_like};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect, Set, sea_query::Expr,
};
use verdant_common::{AppError, AppResult};

/// Like count of one plant, as returned by grouped queries.
#[derive(Debug, FromQueryResult)]
pub(crate) struct PlantCount {
    pub plant_id: i32,
    pub count: i64,
}

/// Plant like repository for database operations.
#[derive(Clone)]
pub struct PlantLikeRepository {
    db: Arc<DatabaseConnection>,
}

impl PlantLikeRepository {
    /// Create a new plant like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a plant is liked by user.
    pub async fn is_liked(&self, user_id: i32, plant_id: i32) -> AppResult<bool> {
        let like = PlantLike::find_by_id((user_id, plant_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(like.is_some())
    }

    /// Record a like.
    pub async fn create(&self, user_id: i32, plant_id: i32) -> AppResult<()> {
        let model = plant_like::ActiveModel {
            user_id: Set(user_id),
            plant_id: Set(plant_id),
        };
        PlantLike::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a like.
    pub async fn delete(&self, user_id: i32, plant_id: i32) -> AppResult<()> {
        PlantLike::delete_many()
            .filter(plant_like::Column::UserId.eq(user_id))
            .filter(plant_like::Column::PlantId.eq(plant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count likes on a plant.
    pub async fn count_by_plant(&self, plant_id: i32) -> AppResult<u64> {
        PlantLike::find()
            .filter(plant_like::Column::PlantId.eq(plant_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count likes for several plants in one query.
    ///
    /// Plants without likes are absent from the map.
    pub async fn count_by_plants(&self, plant_ids: &[i32]) -> AppResult<HashMap<i32, u64>> {
        if plant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = PlantLike::find()
            .select_only()
            .column(plant_like::Column::PlantId)
            .column_as(Expr::col(plant_like::Column::UserId).count(), "count")
            .filter(plant_like::Column::PlantId.is_in(plant_ids.to_vec()))
            .group_by(plant_like::Column::PlantId)
            .into_model::<PlantCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.plant_id, row.count as u64))
            .collect())
    }
}
