//! Saved plant ("My List") service.

use serde::Serialize;
use verdant_common::{AppError, AppResult, Page, PageRequest};
use verdant_db::repositories::{
    PlantLikeRepository, PlantRepository, SavedPlantRepository, UserRepository,
};

use super::{like::ToggleOutcome, storage::StorageService};

/// A saved plant in the user's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedPlantSummary {
    pub id: i32,
    pub name: String,
    pub main_image_url: Option<String>,
    pub likes_count: u64,
    pub saves_count: u64,
}

/// Saved plant service for business logic.
#[derive(Clone)]
pub struct SavedPlantService {
    saved_repo: SavedPlantRepository,
    like_repo: PlantLikeRepository,
    plant_repo: PlantRepository,
    user_repo: UserRepository,
    storage: StorageService,
}

impl SavedPlantService {
    /// Create a new saved plant service.
    #[must_use]
    pub const fn new(
        saved_repo: SavedPlantRepository,
        like_repo: PlantLikeRepository,
        plant_repo: PlantRepository,
        user_repo: UserRepository,
        storage: StorageService,
    ) -> Self {
        Self {
            saved_repo,
            like_repo,
            plant_repo,
            user_repo,
            storage,
        }
    }

    /// Save the plant, or remove it from the list if already saved.
    pub async fn toggle(&self, user_id: i32, plant_id: i32) -> AppResult<ToggleOutcome> {
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AppError::BadRequest("Invalid user ID".to_string()));
        }
        self.plant_repo.get_by_id(plant_id).await?;

        let active = if self.saved_repo.is_saved(user_id, plant_id).await? {
            self.saved_repo.delete(user_id, plant_id).await?;
            false
        } else {
            self.saved_repo.create(user_id, plant_id).await?;
            true
        };

        let count = self.saved_repo.count_by_plant(plant_id).await?;
        tracing::info!(user_id, plant_id, saved = active, count, "Toggled saved plant");

        Ok(ToggleOutcome { active, count })
    }

    /// One page of the user's saved plants with live like/save counts.
    pub async fn list_saved(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> AppResult<Page<SavedPlantSummary>> {
        self.user_repo.get_by_id(user_id).await?;

        let (plants, total) = self.saved_repo.find_plants_by_user(user_id, page).await?;
        let ids: Vec<i32> = plants.iter().map(|p| p.id).collect();
        let likes = self.like_repo.count_by_plants(&ids).await?;
        let saves = self.saved_repo.count_by_plants(&ids).await?;

        let mut items = Vec::with_capacity(plants.len());
        for plant in plants {
            items.push(SavedPlantSummary {
                id: plant.id,
                main_image_url: self
                    .storage
                    .signed_url_opt(plant.main_image_url.as_deref())
                    .await,
                likes_count: likes.get(&plant.id).copied().unwrap_or(0),
                saves_count: saves.get(&plant.id).copied().unwrap_or(0),
                name: plant.name,
            });
        }

        Ok(Page::new(items, total, page))
    }
}
