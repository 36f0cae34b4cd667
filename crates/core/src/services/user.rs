//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;
use verdant_common::{AppError, AppResult};
use verdant_db::{entities::user, repositories::UserRepository};

use super::token::TokenService;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    tokens: TokenService,
}

/// Input for registering a new user.
///
/// Fields are optional so that missing values are reported as
/// validation messages rather than deserialization failures.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(max = 80))]
    pub username: Option<String>,

    pub password: Option<String>,

    #[validate(length(max = 120))]
    pub email: Option<String>,
}

/// Input for logging in.
#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Input for updating the caller's profile.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 120))]
    pub email: Option<String>,
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub username: String,
    pub email: String,
}

impl From<user::Model> for Profile {
    fn from(user: user::Model) -> Self {
        Self {
            username: user.username,
            email: user.email,
        }
    }
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, tokens: TokenService) -> Self {
        Self { user_repo, tokens }
    }

    /// Register a user and return an access token for it.
    pub async fn register(&self, input: RegisterInput) -> AppResult<String> {
        let email = non_empty(input.email.as_deref())
            .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;
        let username = non_empty(input.username.as_deref())
            .ok_or_else(|| AppError::BadRequest("Username is required".to_string()))?;
        let password = non_empty(input.password.as_deref())
            .ok_or_else(|| AppError::BadRequest("Password is required".to_string()))?;
        input.validate()?;

        if self.user_repo.find_by_username(username).await?.is_some() {
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let password_hash = hash_password(password)?;

        let model = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = user.id, username = %user.username, "User registered");

        self.tokens.issue(user.id)
    }

    /// Check credentials and return an access token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, input: LoginInput) -> AppResult<String> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let username = non_empty(input.username.as_deref()).ok_or_else(invalid)?;
        let password = input.password.as_deref().unwrap_or_default();

        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Rejected login with wrong password");
            return Err(invalid());
        }

        self.tokens.issue(user.id)
    }

    /// Get a user's profile.
    pub async fn get_profile(&self, user_id: i32) -> AppResult<Profile> {
        self.user_repo.get_by_id(user_id).await.map(Profile::from)
    }

    /// Update a user's profile. Only a non-empty email is applied.
    pub async fn update_profile(
        &self,
        user_id: i32,
        input: UpdateProfileInput,
    ) -> AppResult<Profile> {
        input.validate()?;
        let user = self.user_repo.get_by_id(user_id).await?;

        let Some(email) = non_empty(input.email.as_deref()) else {
            return Ok(user.into());
        };

        if email == user.email {
            return Ok(user.into());
        }

        if self.user_repo.find_by_email(email).await?.is_some() {
            return Err(AppError::BadRequest("Email already registered".to_string()));
        }

        let mut model: user::ActiveModel = user.into();
        model.email = Set(email.to_string());

        let updated = self.user_repo.update(model).await?;
        tracing::info!(user_id = updated.id, "Profile updated");

        Ok(updated.into())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
