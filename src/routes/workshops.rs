use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::workshops::{CreateWorkshopRequest, UpdateWorkshopRequest, WorkshopList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Workshop,
    response::ApiResponse,
    routes::params::WorkshopQuery,
    services::workshop_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_workshops).post(create_workshop))
        .route("/nearby", get(nearby_workshops))
        .route("/my-workshop", get(my_workshop))
        .route(
            "/{id}",
            get(get_workshop).put(update_workshop).delete(delete_workshop),
        )
}

#[utoipa::path(
    get,
    path = "/api/workshops",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("service_type" = Option<String>, Query, description = "Only workshops offering this service tag"),
        ("city" = Option<String>, Query, description = "Case-insensitive city match"),
        ("user_lat" = Option<f64>, Query, description = "Query point latitude; with user_lon, orders by distance"),
        ("user_lon" = Option<f64>, Query, description = "Query point longitude"),
    ),
    responses(
        (status = 200, description = "List workshops", body = ApiResponse<WorkshopList>)
    ),
    tag = "Workshops"
)]
pub async fn list_workshops(
    State(state): State<AppState>,
    Query(query): Query<WorkshopQuery>,
) -> AppResult<Json<ApiResponse<WorkshopList>>> {
    Ok(Json(workshop_service::list_workshops(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/workshops/nearby",
    params(
        ("service_type" = Option<String>, Query, description = "Only workshops offering this service tag"),
        ("city" = Option<String>, Query, description = "Case-insensitive city match"),
        ("user_lat" = Option<f64>, Query, description = "Query point latitude"),
        ("user_lon" = Option<f64>, Query, description = "Query point longitude"),
    ),
    responses(
        (status = 200, description = "Nearby workshops", body = ApiResponse<WorkshopList>)
    ),
    tag = "Workshops"
)]
pub async fn nearby_workshops(
    State(state): State<AppState>,
    Query(query): Query<WorkshopQuery>,
) -> AppResult<Json<ApiResponse<WorkshopList>>> {
    Ok(Json(workshop_service::list_workshops(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/workshops/my-workshop",
    responses(
        (status = 200, description = "The caller's workshop", body = ApiResponse<Workshop>),
        (status = 404, description = "Caller owns no workshop"),
    ),
    tag = "Workshops"
)]
pub async fn my_workshop(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Workshop>>> {
    Ok(Json(workshop_service::my_workshop(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/workshops/{id}",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    responses(
        (status = 200, description = "Get workshop", body = ApiResponse<Workshop>),
        (status = 404, description = "Workshop not found"),
    ),
    tag = "Workshops"
)]
pub async fn get_workshop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Workshop>>> {
    Ok(Json(workshop_service::get_workshop(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/workshops",
    request_body = CreateWorkshopRequest,
    responses(
        (status = 200, description = "Create workshop", body = ApiResponse<Workshop>),
        (status = 400, description = "Missing required fields or unknown service tag"),
    ),
    tag = "Workshops"
)]
pub async fn create_workshop(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateWorkshopRequest>,
) -> AppResult<Json<ApiResponse<Workshop>>> {
    Ok(Json(
        workshop_service::create_workshop(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/workshops/{id}",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    request_body = UpdateWorkshopRequest,
    responses(
        (status = 200, description = "Updated workshop", body = ApiResponse<Workshop>),
        (status = 403, description = "Caller is not the owner"),
    ),
    tag = "Workshops"
)]
pub async fn update_workshop(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWorkshopRequest>,
) -> AppResult<Json<ApiResponse<Workshop>>> {
    Ok(Json(
        workshop_service::update_workshop(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/workshops/{id}",
    params(
        ("id" = Uuid, Path, description = "Workshop ID")
    ),
    responses(
        (status = 200, description = "Deleted workshop"),
        (status = 403, description = "Caller is not the owner"),
    ),
    tag = "Workshops"
)]
pub async fn delete_workshop(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(
        workshop_service::delete_workshop(&state, &user, id).await?,
    ))
}
