use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    dto::me::{UpdateMeRequest, UpdateProfileRequest},
    entity::{
        profiles::{ActiveModel as ProfileActive, Column as ProfileCol, Entity as Profiles, Model as ProfileModel},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    identity::VerifiedIdentity,
    middleware::auth::AuthUser,
    models::{Profile, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Local usernames carry the provider subject id, truncated to this limit.
pub const USERNAME_MAX_LEN: usize = 150;

/// Split a display name at the first whitespace into first/last components.
pub fn split_display_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = parts.collect();
    (first, rest.join(" "))
}

/// Idempotently map a verified provider identity to a local user and profile.
///
/// Concurrency is handled by the unique keys on `users.username` and
/// `profiles.user_id`, not by locking: a lost insert race falls through to the
/// re-select, so the same subject id always resolves to one record.
pub async fn resolve(state: &AppState, identity: &VerifiedIdentity) -> AppResult<UserModel> {
    let username: String = identity.subject_id.chars().take(USERNAME_MAX_LEN).collect();

    if let Some(user) = Users::find()
        .filter(UserCol::Username.eq(username.clone()))
        .one(&state.orm)
        .await?
    {
        ensure_profile(state, &user, &identity.subject_id).await?;
        return Ok(user);
    }

    let email = identity.email.clone().unwrap_or_default();
    let name = identity
        .display_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let (first_name, last_name) = split_display_name(&name);

    let insert = Users::insert(UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.clone()),
        email: Set(email),
        first_name: Set(first_name),
        last_name: Set(last_name),
        user_type: Set("customer".into()),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(
        OnConflict::column(UserCol::Username)
            .do_nothing()
            .to_owned(),
    )
    .exec(&state.orm)
    .await;
    match insert {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(err) => return Err(err.into()),
    }

    let user = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("resolved user vanished after insert")))?;

    ensure_profile(state, &user, &identity.subject_id).await?;
    Ok(user)
}

async fn ensure_profile(
    state: &AppState,
    user: &UserModel,
    provider_uid: &str,
) -> AppResult<ProfileModel> {
    if let Some(profile) = Profiles::find()
        .filter(ProfileCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?
    {
        return Ok(profile);
    }

    let insert = Profiles::insert(ProfileActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        provider_uid: Set(provider_uid.to_string()),
        phone: Set(String::new()),
        avatar_url: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(OnConflict::column(ProfileCol::UserId).do_nothing().to_owned())
    .exec(&state.orm)
    .await;
    match insert {
        // Losing the insert race means the profile exists, which is what we wanted.
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(err) => return Err(err.into()),
    }

    Profiles::find()
        .filter(ProfileCol::UserId.eq(user.id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("profile vanished after insert")))
}

pub async fn get_me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Ok", user_from_entity(model), None))
}

pub async fn update_me(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateMeRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(user_type) = payload.user_type.as_deref() {
        if user_type != "customer" && user_type != "mechanic" {
            return Err(AppError::BadRequest(
                "User type must be customer or mechanic".into(),
            ));
        }
    }

    let mut active: UserActive = existing.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(user_type) = payload.user_type {
        active.user_type = Set(user_type);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// The profile normally exists by the time this runs (resolution creates it);
/// the find-or-create covers records imported before that behavior.
pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let owner = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let provider_uid = owner.username.clone();
    let profile = ensure_profile(state, &owner, &provider_uid).await?;
    Ok(ApiResponse::success("Ok", profile_from_entity(profile), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let existing = Profiles::find()
        .filter(ProfileCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ProfileActive = existing.into();
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(avatar_url) = payload.avatar_url {
        active.avatar_url = Set(Some(avatar_url));
    }
    if let Some(latitude) = payload.latitude {
        active.latitude = Set(Some(latitude));
    }
    if let Some(longitude) = payload.longitude {
        active.longitude = Set(Some(longitude));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        profile_from_entity(updated),
        Some(Meta::empty()),
    ))
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        user_type: model.user_type,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn profile_from_entity(model: ProfileModel) -> Profile {
    Profile {
        id: model.id,
        user_id: model.user_id,
        provider_uid: model.provider_uid,
        phone: model.phone,
        avatar_url: model.avatar_url,
        latitude: model.latitude,
        longitude: model.longitude,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
