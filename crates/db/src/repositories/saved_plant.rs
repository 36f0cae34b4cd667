//! Saved plant ("My List") repository.

use std::collections::HashMap;
use std::sync::Arc;

use super::plant_like::PlantCount;
use crate::entities::{Plant, SavedPlant, plant, saved_plant};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::Expr,
};
use verdant_common::{AppError, AppResult, PageRequest};

/// Saved plant repository for database operations.
#[derive(Clone)]
pub struct SavedPlantRepository {
    db: Arc<DatabaseConnection>,
}

impl SavedPlantRepository {
    /// Create a new saved plant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a plant is on the user's list.
    pub async fn is_saved(&self, user_id: i32, plant_id: i32) -> AppResult<bool> {
        let saved = SavedPlant::find_by_id((user_id, plant_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(saved.is_some())
    }

    /// Add a plant to the user's list.
    pub async fn create(&self, user_id: i32, plant_id: i32) -> AppResult<()> {
        let model = saved_plant::ActiveModel {
            user_id: Set(user_id),
            plant_id: Set(plant_id),
        };
        SavedPlant::insert(model)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a plant from the user's list.
    pub async fn delete(&self, user_id: i32, plant_id: i32) -> AppResult<()> {
        SavedPlant::delete_many()
            .filter(saved_plant::Column::UserId.eq(user_id))
            .filter(saved_plant::Column::PlantId.eq(plant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count users who saved a plant.
    pub async fn count_by_plant(&self, plant_id: i32) -> AppResult<u64> {
        SavedPlant::find()
            .filter(saved_plant::Column::PlantId.eq(plant_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count saves for several plants in one query.
    ///
    /// Plants nobody saved are absent from the map.
    pub async fn count_by_plants(&self, plant_ids: &[i32]) -> AppResult<HashMap<i32, u64>> {
        if plant_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = SavedPlant::find()
            .select_only()
            .column(saved_plant::Column::PlantId)
            .column_as(Expr::col(saved_plant::Column::UserId).count(), "count")
            .filter(saved_plant::Column::PlantId.is_in(plant_ids.to_vec()))
            .group_by(saved_plant::Column::PlantId)
            .into_model::<PlantCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.plant_id, row.count as u64))
            .collect())
    }

    /// One page of the plants a user saved, ordered by plant ID.
    pub async fn find_plants_by_user(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> AppResult<(Vec<plant::Model>, u64)> {
        let paginator = Plant::find()
            .inner_join(SavedPlant)
            .filter(saved_plant::Column::UserId.eq(user_id))
            .order_by_asc(plant::Column::Id)
            .paginate(self.db.as_ref(), page.per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        if page.is_past_end(total) {
            return Ok((Vec::new(), total));
        }

        let items = paginator
            .fetch_page(page.index())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_is_saved() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[saved_plant::Model {
                    user_id: 4,
                    plant_id: 8,
                }]])
                .append_query_results([Vec::<saved_plant::Model>::new()])
                .into_connection(),
        );

        let repo = SavedPlantRepository::new(db);
        assert!(repo.is_saved(4, 8).await.unwrap());
        assert!(!repo.is_saved(4, 9).await.unwrap());
    }

    #[tokio::test]
    async fn test_count_by_plant() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = SavedPlantRepository::new(db);
        assert_eq!(repo.count_by_plant(8).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = SavedPlantRepository::new(db);
        assert!(repo.delete(4, 8).await.is_ok());
    }

    #[tokio::test]
    async fn test_find_plants_by_user() {
        let plant = plant::Model {
            id: 8,
            name: "Calathea".to_string(),
            description: "Prayer plant".to_string(),
            main_image_url: Some("plants/calathea.jpg".to_string()),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(7))
                }]])
                .append_query_results([[plant.clone()]])
                .into_connection(),
        );

        let repo = SavedPlantRepository::new(db);
        let page = PageRequest::new(Some(2), Some(6), 6);
        let (items, total) = repo.find_plants_by_user(4, page).await.unwrap();

        assert_eq!(total, 7);
        assert_eq!(items, vec![plant]);
    }
}
