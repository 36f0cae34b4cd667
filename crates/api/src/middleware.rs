//! API middleware.

#![allow(missing_docs)]

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::{self, Next},
    response::Response,
};
use verdant_core::{
    Claims, CommentService, LikeService, PlantService, SavedPlantService, TokenService,
    UserService,
};

use crate::endpoints;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub plant_service: PlantService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub saved_plant_service: SavedPlantService,
    pub tokens: TokenService,
}

/// Outcome of checking the bearer token, stored in request extensions.
#[derive(Debug, Clone)]
pub enum Authentication {
    /// No `Authorization` header was sent.
    Anonymous,
    /// The token verified.
    Verified(Claims),
    /// A token was sent but failed verification.
    Rejected(String),
}

/// Authentication middleware.
///
/// Never rejects on its own; handlers decide through the extractors whether a
/// verified token is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth = match req.headers().get(AUTHORIZATION) {
        None => Authentication::Anonymous,
        Some(value) => match value.to_str().ok().and_then(bearer_token) {
            Some(token) => match state.tokens.verify(token) {
                Ok(claims) => Authentication::Verified(claims),
                Err(e) => Authentication::Rejected(e.to_string()),
            },
            None => Authentication::Rejected("Invalid authorization header".to_string()),
        },
    };

    req.extensions_mut().insert(auth);
    next.run(req).await
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Build the API with authentication applied and state attached.
pub fn app(state: AppState) -> Router {
    endpoints::router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }
}
