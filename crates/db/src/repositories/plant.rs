//! Plant catalog repository.

use std::sync::Arc;

use crate::entities::{Plant, PlantImage, plant, plant_image};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
    sea_query::{Expr, LikeExpr, extension::postgres::PgExpr},
};
use verdant_common::{AppError, AppResult, PageRequest};

/// Plant repository for database operations.
#[derive(Clone)]
pub struct PlantRepository {
    db: Arc<DatabaseConnection>,
}

impl PlantRepository {
    /// Create a new plant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a plant by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<plant::Model>> {
        Plant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a plant by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<plant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Plant {id} not found")))
    }

    /// List plants ordered by ID, optionally filtered by a case-insensitive
    /// substring of the name. Returns the page and the total match count.
    pub async fn search(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<plant::Model>, u64)> {
        let mut query = Plant::find().order_by_asc(plant::Column::Id);

        if let Some(term) = search.filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(term));
            query = query.filter(
                Expr::col(plant::Column::Name).ilike(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let paginator = query.paginate(self.db.as_ref(), page.per_page);
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

    /// Gallery images of a plant, ordered by ID.
    pub async fn find_images(&self, plant_id: i32) -> AppResult<Vec<plant_image::Model>> {
        PlantImage::find()
            .filter(plant_image::Column::PlantId.eq(plant_id))
            .order_by_asc(plant_image::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all plants.
    pub async fn count(&self) -> AppResult<u64> {
        Plant::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a plant with its gallery images in one transaction.
    pub async fn create_with_images(
        &self,
        model: plant::ActiveModel,
        image_keys: Vec<String>,
    ) -> AppResult<plant::Model> {
        self.create_many(vec![(model, image_keys)])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Plant insert returned no row".to_string()))
    }

    /// Create several plants, each with its gallery image keys.
    ///
    /// Runs in a single transaction; nothing is written if any insert fails.
    pub async fn create_many(
        &self,
        plants: Vec<(plant::ActiveModel, Vec<String>)>,
    ) -> AppResult<Vec<plant::Model>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut created = Vec::with_capacity(plants.len());
        for (model, image_keys) in plants {
            let plant = model
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            for key in image_keys {
                plant_image::ActiveModel {
                    plant_id: Set(plant.id),
                    image_url: Set(key),
                    ..Default::default()
                }
                .insert(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            }

            created.push(plant);
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(created)
    }

    /// Delete a plant. Images, comments, likes and saves go with it.
    ///
    /// Returns whether a row was deleted.
    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = Plant::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }
}

/// Escape `LIKE` wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

    fn create_test_plant(id: i32, name: &str) -> plant::Model {
        plant::Model {
            id,
            name: name.to_string(),
            description: format!("About {name}"),
            main_image_url: None,
        }
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rose"), "rose");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<plant::Model>::new()])
                .into_connection(),
        );

        let repo = PlantRepository::new(db);
        let err = repo.get_by_id(9).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Plant 9 not found"));
    }

    #[tokio::test]
    async fn test_search_returns_page_and_total() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .append_query_results([[
                    create_test_plant(11, "Monstera"),
                    create_test_plant(12, "Pothos"),
                ]])
                .into_connection(),
        );

        let repo = PlantRepository::new(db);
        let page = PageRequest::new(Some(2), Some(10), 10);
        let (items, total) = repo.search(None, page).await.unwrap();

        assert_eq!(total, 12);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 11);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_escapes_term() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(1))
            }]])
            .append_query_results([[create_test_plant(1, "Fern_Boston")]])
            .into_connection();
        let db = Arc::new(db);

        let repo = PlantRepository::new(Arc::clone(&db));
        let page = PageRequest::new(None, None, 10);
        repo.search(Some("FERN_"), page).await.unwrap();
        drop(repo);

        let log = Arc::into_inner(db).unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(sql.contains("ILIKE"));
        assert!(sql.contains("%FERN\\\\_%"));
    }

    #[tokio::test]
    async fn test_search_past_last_page_skips_fetch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(3))
            }]])
            .into_connection();
        let db = Arc::new(db);

        let repo = PlantRepository::new(Arc::clone(&db));
        let page = PageRequest::parse(Some("9223372036854775807"), Some("100"), 10);
        let (items, total) = repo.search(None, page).await.unwrap();
        drop(repo);

        assert!(items.is_empty());
        assert_eq!(total, 3);
        assert_eq!(Arc::into_inner(db).unwrap().into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn test_create_many_commits_once() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_plant(1, "Aloe")]])
            .append_query_results([[plant_image::Model {
                id: 1,
                plant_id: 1,
                image_url: "plants/aloe-2.jpg".to_string(),
            }]])
            .append_query_results([[create_test_plant(2, "Jade")]])
            .into_connection();
        let db = Arc::new(db);

        let repo = PlantRepository::new(Arc::clone(&db));
        let created = repo
            .create_many(vec![
                (
                    create_test_plant(1, "Aloe").into(),
                    vec!["plants/aloe-2.jpg".to_string()],
                ),
                (create_test_plant(2, "Jade").into(), Vec::new()),
            ])
            .await
            .unwrap();
        drop(repo);

        assert_eq!(created.len(), 2);
        let log = Arc::into_inner(db).unwrap().into_transaction_log();
        assert_eq!(log.len(), 1);
        let sql = format!("{log:?}");
        assert!(sql.contains("BEGIN"));
        assert!(sql.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_create_many_does_not_commit_on_failure() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_plant(1, "Aloe")]])
            .append_query_errors([DbErr::Custom("duplicate key".to_string())])
            .into_connection();
        let db = Arc::new(db);

        let repo = PlantRepository::new(Arc::clone(&db));
        let err = repo
            .create_many(vec![
                (create_test_plant(1, "Aloe").into(), Vec::new()),
                (create_test_plant(2, "Jade").into(), Vec::new()),
            ])
            .await
            .unwrap_err();
        drop(repo);

        assert!(matches!(err, AppError::Database(_)));
        let log = Arc::into_inner(db).unwrap().into_transaction_log();
        assert!(!format!("{log:?}").contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_delete_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PlantRepository::new(db);
        assert!(!repo.delete(5).await.unwrap());
    }
}
