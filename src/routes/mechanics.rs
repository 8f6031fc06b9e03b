use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::mechanics::MechanicList,
    error::AppResult,
    response::ApiResponse,
    routes::params::MechanicQuery,
    services::mechanic_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_mechanics))
}

#[utoipa::path(
    get,
    path = "/api/mechanics",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("user_lat" = Option<f64>, Query, description = "Query point latitude; with user_lon, orders by distance"),
        ("user_lon" = Option<f64>, Query, description = "Query point longitude"),
    ),
    responses(
        (status = 200, description = "Mechanics directory", body = ApiResponse<MechanicList>)
    ),
    tag = "Mechanics"
)]
pub async fn list_mechanics(
    State(state): State<AppState>,
    Query(query): Query<MechanicQuery>,
) -> AppResult<Json<ApiResponse<MechanicList>>> {
    Ok(Json(mechanic_service::list_mechanics(&state, query).await?))
}
