use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entity::{Users, user_roles::Role, users::Model as UserModel},
    error::AppError,
    state::AppState,
};

/// Claims issued by the external identity provider.
#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Resolve the acting principal to its user row.
pub async fn current_user<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
) -> Result<UserModel, AppError> {
    let found = Users::find_by_id(user.user_id).one(conn).await?;
    let found = match found {
        Some(u) => u,
        None => return Err(AppError::Unauthorized),
    };
    if !found.is_activated {
        return Err(AppError::Forbidden);
    }
    Ok(found)
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;
    let role = Role::parse(&decoded.claims.role).ok_or(AppError::Unauthorized)?;

    Ok(AuthUser { user_id, role })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?
            .trim();

        decode_token(token, &state.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_for(sub: &str, role: &str, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn decodes_valid_token() {
        let id = Uuid::new_v4();
        let token = token_for(&id.to_string(), "ADMIN", "secret");
        let user = decode_token(&token, "secret").unwrap();
        assert_eq!(user.user_id, id);
        assert!(user.is_admin());
    }

    #[test]
    fn rejects_wrong_secret_and_unknown_role() {
        let id = Uuid::new_v4().to_string();
        let token = token_for(&id, "CUSTOMER", "secret");
        assert!(matches!(
            decode_token(&token, "other"),
            Err(AppError::Unauthorized)
        ));

        let token = token_for(&id, "GUEST", "secret");
        assert!(matches!(
            decode_token(&token, "secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn customers_are_not_admins() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        };
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    }
}
