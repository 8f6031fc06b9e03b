use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::me::{UpdateMeRequest, UpdateProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Profile, User},
    response::ApiResponse,
    services::identity_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_me).put(update_me))
        .route("/profile", get(get_profile).put(update_profile))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "Me"
)]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(identity_service::get_me(&state, &user).await?))
}

#[utoipa::path(
    put,
    path = "/api/me",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Updated user", body = ApiResponse<User>),
    ),
    tag = "Me"
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(identity_service::update_me(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/me/profile",
    responses(
        (status = 200, description = "Current profile", body = ApiResponse<Profile>),
    ),
    tag = "Me"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Profile>>> {
    Ok(Json(identity_service::get_profile(&state, &user).await?))
}

#[utoipa::path(
    put,
    path = "/api/me/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<Profile>),
    ),
    tag = "Me"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    Ok(Json(
        identity_service::update_profile(&state, &user, payload).await?,
    ))
}
