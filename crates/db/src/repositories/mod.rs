//! Database repositories.

mod comment;
mod plant;
mod plant_like;
mod saved_plant;
mod user;

pub use comment::{CommentRepository, CommentWithAuthor};
pub use plant::PlantRepository;
pub use plant_like::PlantLikeRepository;
pub use saved_plant::SavedPlantRepository;
pub use user::UserRepository;
