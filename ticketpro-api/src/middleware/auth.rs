use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use ticketpro_core::{Actor, Role};
use ticketpro_directory::DirectoryError;
use tracing::warn;
use uuid::Uuid;

use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// System user id
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn actor(&self) -> Option<Actor> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        Some(Actor {
            id,
            name: self.name.clone(),
            role: self.role,
        })
    }
}

// ============================================================================
// Back-office Authentication Middleware
// ============================================================================

/// Resolves the bearer token into the [`Actor`] every protected handler works as.
/// The account is looked up on every request: deleted users are refused,
/// deactivated users are forbidden, and the stored role wins over the token's.
/// Role checks happen in the domain crates, not here.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let claimed = token_data.claims.actor().ok_or(StatusCode::UNAUTHORIZED)?;
    let user = match state.users.get(claimed.id).await {
        Ok(user) => user,
        Err(DirectoryError::NotFound { .. }) => {
            warn!(user = %claimed.id, "Token for a removed account");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            warn!(error = %e, "Account lookup failed");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    if !user.status.is_active() {
        return Err(StatusCode::FORBIDDEN);
    }
    let actor = Actor {
        id: user.id,
        name: user.name,
        role: user.role,
    };

    req.extensions_mut().insert(actor);
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
