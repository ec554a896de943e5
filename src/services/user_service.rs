use std::collections::HashMap;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::users::{ChangePasswordRequest, ChangeRoleRequest, EditUserRequest, UserList},
    entity::{
        user_roles::{ActiveModel as RoleActive, Column as RoleCol, Entity as UserRoles, Role},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, current_user, ensure_admin},
    models::UserProfile,
    response::{ApiResponse, Meta},
    routes::params::PageQuery,
    state::AppState,
};

pub const USERS_PAGE_SIZE: u64 = 20;

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    page: i64,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    current_user(&state.orm, user).await?;

    let page = page.max(1);
    let (offset, limit) = PageQuery::new(page)
        .window(USERS_PAGE_SIZE)
        .unwrap_or((0, USERS_PAGE_SIZE));

    let finder = Users::find().order_by_asc(UserCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;

    let users = finder.offset(offset).limit(limit).all(&state.orm).await?;

    let roles = roles_of(&state.orm, users.iter().map(|u| u.id).collect()).await?;
    let items: Vec<UserProfile> = users
        .into_iter()
        .map(|u| {
            let role = roles.get(&u.id).copied();
            profile_from_entity(u, role)
        })
        .collect();

    let meta = Meta::new(page, USERS_PAGE_SIZE as i64, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn get_user_by_id(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<UserProfile>> {
    ensure_admin(user)?;
    current_user(&state.orm, user).await?;

    let found = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("user", id))?;

    let profile = load_profile(&state.orm, found).await?;
    Ok(ApiResponse::success("OK", profile, Some(Meta::empty())))
}

pub async fn get_my_profile(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserProfile>> {
    let me = current_user(&state.orm, user).await?;
    let profile = load_profile(&state.orm, me).await?;
    Ok(ApiResponse::success("OK", profile, Some(Meta::empty())))
}

/// Customers may only edit themselves; admins may edit anyone.
pub async fn edit_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: EditUserRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    payload.validate()?;
    let me = current_user(&state.orm, user).await?;
    if me.id != id && !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    let target = if me.id == id {
        me
    } else {
        Users::find_by_id(id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::not_found("user", id))?
    };

    let mut active: UserActive = target.into();
    active.first_name = Set(payload.first_name);
    active.last_name = Set(payload.last_name);
    active.phone_number = Set(payload.phone_number);
    active.gender = Set(payload.gender);
    active.dob = Set(payload.dob);
    active.avatar = Set(payload.avatar);
    active.address = Set(payload.address);
    let updated = active.update(&state.orm).await?;

    let profile = load_profile(&state.orm, updated).await?;
    Ok(ApiResponse::success(
        "User updated",
        profile,
        Some(Meta::empty()),
    ))
}

pub async fn change_password(
    state: &AppState,
    user: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    let me = current_user(&state.orm, user).await?;

    if !verify_password(&payload.old_password, &me.password_hash)? {
        return Err(AppError::invalid("The old password is incorrect"));
    }

    let password_hash = hash_password(&payload.new_password)?;
    let user_id = me.id;
    let mut active: UserActive = me.into();
    active.password_hash = Set(password_hash);
    active.update(&state.orm).await?;
    tracing::info!(user_id = %user_id, "password changed");

    Ok(ApiResponse::message("Change password successfully"))
}

pub async fn toggle_user_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<UserProfile>> {
    ensure_admin(user)?;
    current_user(&state.orm, user).await?;

    let txn = state.orm.begin().await?;
    let target = Users::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("user", id))?;

    let activated = !target.is_activated;
    let mut active: UserActive = target.into();
    active.is_activated = Set(activated);
    let updated = active.update(&txn).await?;
    txn.commit().await?;
    tracing::info!(user_id = %id, activated, "user status toggled");

    let profile = load_profile(&state.orm, updated).await?;
    Ok(ApiResponse::success(
        "User status updated",
        profile,
        Some(Meta::empty()),
    ))
}

/// Replace every role row of the account with the single requested role.
pub async fn change_user_role(
    state: &AppState,
    user: &AuthUser,
    payload: ChangeRoleRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let role = Role::parse(&payload.role_name)
        .ok_or_else(|| AppError::invalid("The role name must be \"ADMIN\" or \"CUSTOMER\""))?;

    let txn = state.orm.begin().await?;
    current_user(&txn, user).await?;

    let target = Users::find()
        .filter(UserCol::Email.eq(payload.user_email.as_str()))
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "The user with email = {} was not found",
                payload.user_email
            ))
        })?;

    UserRoles::delete_many()
        .filter(RoleCol::UserId.eq(target.id))
        .exec(&txn)
        .await?;
    RoleActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(target.id),
        role: Set(role),
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    tracing::info!(user_id = %target.id, role = role.as_str(), "user role changed");

    Ok(ApiResponse::message(format!(
        "Change role of {} to {} successfully",
        payload.user_email,
        role.as_str()
    )))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

async fn load_profile<C: ConnectionTrait>(conn: &C, user: UserModel) -> AppResult<UserProfile> {
    let role = roles_of(conn, vec![user.id]).await?.get(&user.id).copied();
    Ok(profile_from_entity(user, role))
}

/// One role per user; admin wins if an account somehow holds both.
async fn roles_of<C: ConnectionTrait>(
    conn: &C,
    user_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Role>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut roles: HashMap<Uuid, Role> = HashMap::new();
    for row in UserRoles::find()
        .filter(RoleCol::UserId.is_in(user_ids))
        .all(conn)
        .await?
    {
        roles
            .entry(row.user_id)
            .and_modify(|r| {
                if row.role == Role::Admin {
                    *r = Role::Admin;
                }
            })
            .or_insert(row.role);
    }
    Ok(roles)
}

fn profile_from_entity(model: UserModel, role: Option<Role>) -> UserProfile {
    UserProfile {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        phone_number: model.phone_number,
        gender: model.gender,
        dob: model.dob,
        avatar: model.avatar,
        address: model.address,
        is_activated: model.is_activated,
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies_only_the_original() {
        let hash = hash_password("glass-123").unwrap();
        assert_ne!(hash, "glass-123");
        assert!(verify_password("glass-123", &hash).unwrap());
        assert!(!verify_password("glass-124", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }
}
