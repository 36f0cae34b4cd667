//! Plant catalog service.

use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;
use verdant_common::{AppError, AppResult, Page, PageRequest};
use verdant_db::{
    entities::plant,
    repositories::{CommentRepository, PlantLikeRepository, PlantRepository, SavedPlantRepository},
};

use super::{comment::CommentView, storage::StorageService};

/// A plant in catalog listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlantSummary {
    pub id: i32,
    pub name: String,
    pub main_image_url: Option<String>,
    pub likes_count: u64,
}

/// An image in a plant's gallery.
///
/// The main image is listed with ID 0 and no `plant_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlantImageView {
    pub id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plant_id: Option<i32>,
    pub image_url: Option<String>,
}

/// Full plant view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlantDetail {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub likes_count: u64,
    pub saved_count: u64,
    pub images: Vec<PlantImageView>,
    pub comments: Vec<CommentView>,
    /// Present only when the request carried a valid token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    /// Present only when the request carried a valid token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_saved: Option<bool>,
}

/// Input for adding a plant to the catalog. Image fields hold storage keys.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPlant {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub main_image_url: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,
}

impl NewPlant {
    fn into_rows(self) -> (plant::ActiveModel, Vec<String>) {
        let model = plant::ActiveModel {
            name: Set(self.name),
            description: Set(self.description),
            main_image_url: Set(self.main_image_url.filter(|k| !k.is_empty())),
            ..Default::default()
        };
        (model, self.images)
    }
}

/// Plant catalog service for business logic.
#[derive(Clone)]
pub struct PlantService {
    plant_repo: PlantRepository,
    comment_repo: CommentRepository,
    like_repo: PlantLikeRepository,
    saved_repo: SavedPlantRepository,
    storage: StorageService,
}

impl PlantService {
    /// Create a new plant service.
    #[must_use]
    pub const fn new(
        plant_repo: PlantRepository,
        comment_repo: CommentRepository,
        like_repo: PlantLikeRepository,
        saved_repo: SavedPlantRepository,
        storage: StorageService,
    ) -> Self {
        Self {
            plant_repo,
            comment_repo,
            like_repo,
            saved_repo,
            storage,
        }
    }

    /// One page of the catalog, optionally filtered by name.
    pub async fn list(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Page<PlantSummary>> {
        let (plants, total) = self.plant_repo.search(search, page).await?;
        let ids: Vec<i32> = plants.iter().map(|p| p.id).collect();
        let likes = self.like_repo.count_by_plants(&ids).await?;

        let mut items = Vec::with_capacity(plants.len());
        for plant in plants {
            items.push(PlantSummary {
                id: plant.id,
                main_image_url: self
                    .storage
                    .signed_url_opt(plant.main_image_url.as_deref())
                    .await,
                likes_count: likes.get(&plant.id).copied().unwrap_or(0),
                name: plant.name,
            });
        }

        Ok(Page::new(items, total, page))
    }

    /// Plant with images, comments and counts.
    ///
    /// `viewer` adds the viewer's like/save flags.
    pub async fn get_detail(&self, plant_id: i32, viewer: Option<i32>) -> AppResult<PlantDetail> {
        let plant = self.plant_repo.get_by_id(plant_id).await?;

        let mut images = Vec::new();
        if let Some(key) = plant.main_image_url.as_deref() {
            images.push(PlantImageView {
                id: 0,
                plant_id: None,
                image_url: self.storage.signed_url(key).await,
            });
        }
        for image in self.plant_repo.find_images(plant_id).await? {
            images.push(PlantImageView {
                id: image.id,
                plant_id: Some(image.plant_id),
                image_url: self.storage.signed_url(&image.image_url).await,
            });
        }
        images.sort_by_key(|img| img.id);

        let mut comments = Vec::new();
        for (comment, author) in self.comment_repo.find_by_plant(plant_id).await? {
            comments.push(CommentView::build(&self.storage, comment, author).await);
        }

        let likes_count = self.like_repo.count_by_plant(plant_id).await?;
        let saved_count = self.saved_repo.count_by_plant(plant_id).await?;

        let (is_liked, is_saved) = match viewer {
            Some(user_id) => (
                Some(self.like_repo.is_liked(user_id, plant_id).await?),
                Some(self.saved_repo.is_saved(user_id, plant_id).await?),
            ),
            None => (None, None),
        };

        Ok(PlantDetail {
            id: plant.id,
            name: plant.name,
            description: plant.description,
            likes_count,
            saved_count,
            images,
            comments,
            is_liked,
            is_saved,
        })
    }

    /// Add a plant and its gallery images to the catalog.
    pub async fn create_plant(&self, input: NewPlant) -> AppResult<plant::Model> {
        input.validate()?;
        let (model, image_keys) = input.into_rows();

        let plant = self.plant_repo.create_with_images(model, image_keys).await?;
        tracing::info!(plant_id = plant.id, name = %plant.name, "Plant created");
        Ok(plant)
    }

    /// Remove a plant together with its images, comments, likes and saves.
    pub async fn delete_plant(&self, plant_id: i32) -> AppResult<()> {
        if !self.plant_repo.delete(plant_id).await? {
            return Err(AppError::NotFound(format!("Plant {plant_id} not found")));
        }

        tracing::info!(plant_id, "Plant deleted");
        Ok(())
    }

    /// Populate an empty catalog. Returns how many plants were added.
    ///
    /// Does nothing when the catalog already has plants. All plants are
    /// written in one transaction, so a failed seed leaves the catalog empty.
    pub async fn seed_catalog(&self, plants: Vec<NewPlant>) -> AppResult<usize> {
        let existing = self.plant_repo.count().await?;
        if existing > 0 {
            tracing::debug!(existing, "Catalog already populated, skipping seed");
            return Ok(0);
        }

        for plant in &plants {
            plant.validate()?;
        }

        let rows = plants.into_iter().map(NewPlant::into_rows).collect();
        let count = self.plant_repo.create_many(rows).await?.len();

        tracing::info!(count, "Seeded plant catalog");
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;
    use verdant_common::MemoryStorage;
    use verdant_db::entities::{comment, plant_image, plant_like, saved_plant, user};

    fn test_plant(id: i32, main_image: Option<&str>) -> plant::Model {
        plant::Model {
            id,
            name: format!("Plant {id}"),
            description: "Leafy".to_string(),
            main_image_url: main_image.map(str::to_string),
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn empty() -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres).into_connection()
    }

    fn service(
        plants: DatabaseConnection,
        comments: DatabaseConnection,
        likes: DatabaseConnection,
        saves: DatabaseConnection,
    ) -> PlantService {
        PlantService::new(
            PlantRepository::new(Arc::new(plants)),
            CommentRepository::new(Arc::new(comments)),
            PlantLikeRepository::new(Arc::new(likes)),
            SavedPlantRepository::new(Arc::new(saves)),
            StorageService::new(Arc::new(MemoryStorage::new()), Duration::from_secs(3600)),
        )
    }

    fn detail_fixture() -> (DatabaseConnection, DatabaseConnection) {
        let plants = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_plant(3, Some("plants/main.jpg"))]])
            .append_query_results([[
                plant_image::Model {
                    id: 7,
                    plant_id: 3,
                    image_url: "plants/side.jpg".to_string(),
                },
                plant_image::Model {
                    id: 12,
                    plant_id: 3,
                    image_url: "plants/top.jpg".to_string(),
                },
            ]])
            .into_connection();
        let comments = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[(
                comment::Model {
                    id: 1,
                    content: "Nice".to_string(),
                    created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap().into(),
                    user_id: 1,
                    plant_id: 3,
                    image_key: None,
                },
                user::Model {
                    id: 1,
                    username: "fern".to_string(),
                    email: "fern@example.com".to_string(),
                    password_hash: String::new(),
                },
            )]])
            .into_connection();
        (plants, comments)
    }

    #[tokio::test]
    async fn test_list_fills_like_counts() {
        let plants = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(2)]])
            .append_query_results([[test_plant(1, Some("plants/1.jpg")), test_plant(2, None)]])
            .into_connection();
        let likes = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "plant_id" => sea_orm::Value::Int(Some(2)),
                "count" => sea_orm::Value::BigInt(Some(4)),
            }]])
            .into_connection();

        let page = service(plants, empty(), likes, empty())
            .list(Some("plant"), PageRequest::new(None, None, 10))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].likes_count, 0);
        assert_eq!(
            page.items[0].main_image_url.as_deref(),
            Some("memory://plants/1.jpg?expires_in=3600")
        );
        assert_eq!(page.items[1].likes_count, 4);
    }

    #[tokio::test]
    async fn test_detail_without_viewer_has_no_flags() {
        let (plants, comments) = detail_fixture();
        let likes = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(2)]])
            .into_connection();
        let saves = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .into_connection();

        let detail = service(plants, comments, likes, saves)
            .get_detail(3, None)
            .await
            .unwrap();

        assert_eq!(detail.is_liked, None);
        assert_eq!(detail.is_saved, None);
        assert_eq!(detail.likes_count, 2);
        assert_eq!(detail.saved_count, 1);

        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("is_liked").is_none());
        assert!(json.get("is_saved").is_none());
    }

    #[tokio::test]
    async fn test_detail_images_start_with_main_image() {
        let (plants, comments) = detail_fixture();
        let likes = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .into_connection();
        let saves = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .into_connection();

        let detail = service(plants, comments, likes, saves)
            .get_detail(3, None)
            .await
            .unwrap();

        let ids: Vec<i32> = detail.images.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 7, 12]);
        assert_eq!(detail.images[0].plant_id, None);
        assert_eq!(detail.images[1].plant_id, Some(3));
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].username, "fern");
    }

    #[tokio::test]
    async fn test_detail_with_viewer_has_flags() {
        let (plants, comments) = detail_fixture();
        let likes = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .append_query_results([[plant_like::Model {
                user_id: 1,
                plant_id: 3,
            }]])
            .into_connection();
        let saves = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .append_query_results([Vec::<saved_plant::Model>::new()])
            .into_connection();

        let detail = service(plants, comments, likes, saves)
            .get_detail(3, Some(1))
            .await
            .unwrap();

        assert_eq!(detail.is_liked, Some(true));
        assert_eq!(detail.is_saved, Some(false));
    }

    #[tokio::test]
    async fn test_delete_plant_missing() {
        let plants = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = service(plants, empty(), empty(), empty())
            .delete_plant(8)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Plant 8 not found"));
    }

    #[tokio::test]
    async fn test_seed_skips_populated_catalog() {
        let plants = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(5)]])
            .into_connection();

        let seeded = service(plants, empty(), empty(), empty())
            .seed_catalog(vec![NewPlant {
                name: "Aloe".to_string(),
                description: String::new(),
                main_image_url: None,
                images: vec![],
            }])
            .await
            .unwrap();

        assert_eq!(seeded, 0);
    }

    #[tokio::test]
    async fn test_seed_creates_plants_and_images() {
        let plants = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .append_query_results([[test_plant(1, Some("plants/aloe.jpg"))]])
            .append_query_results([[plant_image::Model {
                id: 1,
                plant_id: 1,
                image_url: "plants/aloe-2.jpg".to_string(),
            }]])
            .into_connection();

        let seeds: Vec<NewPlant> = serde_json::from_str(
            r#"[{"name": "Aloe", "description": "Succulent",
                 "main_image_url": "plants/aloe.jpg", "images": ["plants/aloe-2.jpg"]}]"#,
        )
        .unwrap();

        let seeded = service(plants, empty(), empty(), empty())
            .seed_catalog(seeds)
            .await
            .unwrap();

        assert_eq!(seeded, 1);
    }

    #[tokio::test]
    async fn test_seed_failure_is_not_committed() {
        let plants = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .append_query_results([[test_plant(1, None)]])
            .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let plants = Arc::new(plants);

        let seeds: Vec<NewPlant> =
            serde_json::from_str(r#"[{"name": "Aloe"}, {"name": "Jade"}]"#).unwrap();

        let service = PlantService::new(
            PlantRepository::new(Arc::clone(&plants)),
            CommentRepository::new(Arc::new(empty())),
            PlantLikeRepository::new(Arc::new(empty())),
            SavedPlantRepository::new(Arc::new(empty())),
            StorageService::new(Arc::new(MemoryStorage::new()), Duration::from_secs(3600)),
        );
        let err = service.seed_catalog(seeds).await.unwrap_err();
        drop(service);

        assert!(matches!(err, AppError::Database(_)));
        let log = Arc::into_inner(plants).unwrap().into_transaction_log();
        assert!(!format!("{log:?}").contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_seed_validates_before_writing() {
        let plants = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(0)]])
            .into_connection();

        let seeds: Vec<NewPlant> =
            serde_json::from_str(r#"[{"name": "Aloe"}, {"name": ""}]"#).unwrap();

        let err = service(plants, empty(), empty(), empty())
            .seed_catalog(seeds)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_plant_requires_name() {
        let err = service(empty(), empty(), empty(), empty())
            .create_plant(NewPlant {
                name: String::new(),
                description: String::new(),
                main_image_url: None,
                images: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
