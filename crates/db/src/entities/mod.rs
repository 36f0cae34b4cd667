//! Database entities.

pub mod comment;
pub mod plant;
pub mod plant_image;
pub mod plant_like;
pub mod saved_plant;
pub mod user;

pub use comment::Entity as Comment;
pub use plant::Entity as Plant;
pub use plant_image::Entity as PlantImage;
pub use plant_like::Entity as PlantLike;
pub use saved_plant::Entity as SavedPlant;
pub use user::Entity as User;
