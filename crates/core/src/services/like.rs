//! Plant like service.

use serde::Serialize;
use verdant_common::{AppError, AppResult};
use verdant_db::repositories::{PlantLikeRepository, PlantRepository, UserRepository};

/// Result of toggling a user/plant relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// Whether the relation exists after the toggle.
    pub active: bool,
    /// Number of users holding the relation for the plant afterwards.
    pub count: u64,
}

/// Plant like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: PlantLikeRepository,
    plant_repo: PlantRepository,
    user_repo: UserRepository,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: PlantLikeRepository,
        plant_repo: PlantRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            like_repo,
            plant_repo,
            user_repo,
        }
    }

    /// Like the plant, or remove the like if it exists.
    pub async fn toggle(&self, user_id: i32, plant_id: i32) -> AppResult<ToggleOutcome> {
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(AppError::BadRequest("Invalid user ID".to_string()));
        }
        self.plant_repo.get_by_id(plant_id).await?;

        let active = if self.like_repo.is_liked(user_id, plant_id).await? {
            self.like_repo.delete(user_id, plant_id).await?;
            false
        } else {
            self.like_repo.create(user_id, plant_id).await?;
            true
        };

        let count = self.like_repo.count_by_plant(plant_id).await?;
        tracing::info!(user_id, plant_id, liked = active, count, "Toggled like");

        Ok(ToggleOutcome { active, count })
    }
}
