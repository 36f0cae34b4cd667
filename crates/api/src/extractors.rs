//! Request extractors.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use verdant_common::AppError;

use crate::middleware::Authentication;

/// Authenticated user extractor.
///
/// Holds the user id from a verified bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i32);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        match parts.extensions.get::<Authentication>() {
            Some(Authentication::Verified(claims)) => claims.user_id().map(Self),
            Some(Authentication::Rejected(reason)) => Err(AppError::Unauthorized(reason.clone())),
            Some(Authentication::Anonymous) | None => Err(AppError::Unauthorized(
                "Missing authorization token".to_string(),
            )),
        }
    }
}

/// Optional authenticated user extractor.
///
/// A missing or invalid token yields `None` rather than a rejection.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<i32>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match parts.extensions.get::<Authentication>() {
            Some(Authentication::Verified(claims)) => claims.user_id().ok(),
            _ => None,
        };
        Ok(Self(user_id))
    }
}

/// Plant id taken from the `{id}` path segment.
///
/// Non-numeric ids are a 400 rather than a routing miss.
#[derive(Debug, Clone, Copy)]
pub struct PlantId(pub i32);

impl<S> FromRequestParts<S> for PlantId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        parse_id("Plant", &raw).map(Self)
    }
}

fn parse_id(entity: &str, raw: &str) -> Result<i32, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("{entity} {raw} is invalid")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;
    use verdant_core::Claims;

    use super::*;

    fn parts_with(auth: Option<Authentication>) -> Parts {
        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        if let Some(auth) = auth {
            parts.extensions.insert(auth);
        }
        parts
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("Plant", "42").unwrap(), 42);

        let err = parse_id("Plant", "abc").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Plant abc is invalid"));
    }

    #[tokio::test]
    async fn test_auth_user_verified() {
        let claims = Claims::new(7, chrono::Duration::minutes(5));
        let mut parts = parts_with(Some(Authentication::Verified(claims)));

        let AuthUser(id) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id, 7);
    }

    #[tokio::test]
    async fn test_auth_user_rejected_keeps_reason() {
        let mut parts = parts_with(Some(Authentication::Rejected(
            "Token has expired".to_string(),
        )));

        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Token has expired"));
    }

    #[tokio::test]
    async fn test_auth_user_missing() {
        let mut parts = parts_with(None);

        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_maybe_auth_user_ignores_bad_token() {
        let mut parts = parts_with(Some(Authentication::Rejected("Invalid token".to_string())));

        let MaybeAuthUser(id) = MaybeAuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(id, None);
    }
}
