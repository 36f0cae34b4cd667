//! Business logic services.

#![allow(missing_docs)]

pub mod comment;
pub mod like;
pub mod plant;
pub mod saved_plant;
pub mod storage;
pub mod token;
pub mod user;

pub use comment::{CommentService, CommentView, ImageUpload, MAX_IMAGE_BYTES, NewComment};
pub use like::{LikeService, ToggleOutcome};
pub use plant::{NewPlant, PlantDetail, PlantImageView, PlantService, PlantSummary};
pub use saved_plant::{SavedPlantService, SavedPlantSummary};
pub use storage::StorageService;
pub use token::{Claims, TokenService};
pub use user::{LoginInput, Profile, RegisterInput, UpdateProfileInput, UserService};
