use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::service_requests::{CreateServiceRequestRequest, ServiceRequestList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::ServiceRequest,
    response::ApiResponse,
    routes::params::RequestListQuery,
    services::request_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/{id}", get(get_request))
        .route("/{id}/accept", post(accept_request))
        .route("/{id}/start", post(start_request))
        .route("/{id}/complete", post(complete_request))
        .route("/{id}/cancel", post(cancel_request))
}

#[utoipa::path(
    post,
    path = "/api/service-requests",
    request_body = CreateServiceRequestRequest,
    responses(
        (status = 200, description = "Create service request", body = ApiResponse<ServiceRequest>),
        (status = 400, description = "Service not offered by the workshop"),
        (status = 404, description = "Workshop not found"),
    ),
    tag = "Service requests"
)]
pub async fn create_request(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateServiceRequestRequest>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    Ok(Json(
        request_service::create_request(&state, &user, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/service-requests",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by lifecycle status"),
    ),
    responses(
        (status = 200, description = "Requests visible to the caller", body = ApiResponse<ServiceRequestList>)
    ),
    tag = "Service requests"
)]
pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RequestListQuery>,
) -> AppResult<Json<ApiResponse<ServiceRequestList>>> {
    Ok(Json(
        request_service::list_requests(&state, &user, query).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/service-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Get service request", body = ApiResponse<ServiceRequest>),
        (status = 404, description = "Not found or outside the caller's scope"),
    ),
    tag = "Service requests"
)]
pub async fn get_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    Ok(Json(request_service::get_request(&state, &user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/service-requests/{id}/accept",
    params(
        ("id" = Uuid, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Accepted", body = ApiResponse<ServiceRequest>),
        (status = 403, description = "Caller is not the workshop owner"),
        (status = 409, description = "Request is not pending"),
    ),
    tag = "Service requests"
)]
pub async fn accept_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    Ok(Json(
        request_service::accept_request(&state, &user, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/service-requests/{id}/start",
    params(
        ("id" = Uuid, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Work started", body = ApiResponse<ServiceRequest>),
        (status = 403, description = "Caller is not the workshop owner"),
        (status = 409, description = "Request is not accepted"),
    ),
    tag = "Service requests"
)]
pub async fn start_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    Ok(Json(
        request_service::start_request(&state, &user, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/service-requests/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Completed", body = ApiResponse<ServiceRequest>),
        (status = 403, description = "Caller is not the workshop owner"),
        (status = 409, description = "Request is not accepted or in progress"),
    ),
    tag = "Service requests"
)]
pub async fn complete_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    Ok(Json(
        request_service::complete_request(&state, &user, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/service-requests/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Service request ID")
    ),
    responses(
        (status = 200, description = "Cancelled", body = ApiResponse<ServiceRequest>),
        (status = 403, description = "Caller is neither requester nor owner"),
        (status = 409, description = "Request already terminal"),
    ),
    tag = "Service requests"
)]
pub async fn cancel_request(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ServiceRequest>>> {
    Ok(Json(
        request_service::cancel_request(&state, &user, id).await?,
    ))
}
