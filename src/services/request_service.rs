use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::service_requests::{CreateServiceRequestRequest, ServiceRequestList},
    entity::{
        service_requests::{
            ActiveModel as RequestActive, Column as RequestCol, Entity as ServiceRequests,
            Model as RequestModel,
        },
        workshops::{Column as WorkshopCol, Entity as Workshops},
    },
    error::{AppError, AppResult},
    geo,
    middleware::auth::AuthUser,
    models::{RequestStatus, ServiceRequest, ServiceType, Urgency},
    response::{ApiResponse, Meta},
    routes::params::RequestListQuery,
    state::AppState,
};

pub async fn create_request(
    state: &AppState,
    user: &AuthUser,
    payload: CreateServiceRequestRequest,
) -> AppResult<ApiResponse<ServiceRequest>> {
    let workshop = Workshops::find_by_id(payload.workshop_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let service_type = ServiceType::parse(&payload.service_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown service type '{}'", payload.service_type))
    })?;
    let offered = workshop
        .services
        .as_array()
        .map(|tags| tags.iter().any(|tag| tag.as_str() == Some(service_type.as_str())))
        .unwrap_or(false);
    if !offered {
        return Err(AppError::BadRequest(format!(
            "Workshop does not offer {}",
            service_type.as_str()
        )));
    }

    let urgency = match payload.urgency.as_deref().filter(|s| !s.is_empty()) {
        Some(value) => Urgency::parse(value)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown urgency '{value}'")))?,
        None => Urgency::Medium,
    };
    if payload.description.trim().is_empty() {
        return Err(AppError::BadRequest("Description is required".into()));
    }

    let distance_km = geo::coords_f64(&payload.user_latitude, &payload.user_longitude)
        .zip(geo::coords_f64(&workshop.latitude, &workshop.longitude))
        .and_then(|((user_lat, user_lon), (shop_lat, shop_lon))| {
            geo::distance_decimal(geo::distance_km(user_lat, user_lon, shop_lat, shop_lon))
        });

    let active = RequestActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        workshop_id: Set(workshop.id),
        service_type: Set(service_type.as_str().into()),
        description: Set(payload.description),
        urgency: Set(urgency.as_str().into()),
        // Callers never pick the initial state.
        status: Set(RequestStatus::Pending.as_str().into()),
        user_latitude: Set(payload.user_latitude),
        user_longitude: Set(payload.user_longitude),
        user_address: Set(payload.user_address),
        distance_km: Set(distance_km),
        created_at: NotSet,
        accepted_at: Set(None),
        completed_at: Set(None),
        updated_at: NotSet,
    };
    let request = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "service_request_create",
        Some("service_requests"),
        Some(serde_json::json!({ "request_id": request.id, "workshop_id": workshop.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Request created",
        request_from_entity(request)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_requests(
    state: &AppState,
    user: &AuthUser,
    query: RequestListQuery,
) -> AppResult<ApiResponse<ServiceRequestList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if !user.is_admin() {
        let owned: Vec<Uuid> = Workshops::find()
            .select_only()
            .column(WorkshopCol::Id)
            .filter(WorkshopCol::OwnerId.eq(user.user_id))
            .into_tuple()
            .all(&state.orm)
            .await?;
        condition = condition.add(
            Condition::any()
                .add(RequestCol::UserId.eq(user.user_id))
                .add(RequestCol::WorkshopId.is_in(owned)),
        );
    }

    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = RequestStatus::parse(status)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown status '{status}'")))?;
        condition = condition.add(RequestCol::Status.eq(status.as_str()));
    }

    let finder = ServiceRequests::find()
        .filter(condition)
        .order_by_desc(RequestCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(request_from_entity)
        .collect::<AppResult<Vec<ServiceRequest>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Requests",
        ServiceRequestList { items },
        Some(meta),
    ))
}

pub async fn get_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ServiceRequest>> {
    let request = ServiceRequests::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if !user.is_admin() && request.user_id != user.user_id {
        let workshop = Workshops::find_by_id(request.workshop_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
        // Requests outside the caller's scope look like they do not exist.
        if workshop.owner_id != user.user_id {
            return Err(AppError::NotFound);
        }
    }

    Ok(ApiResponse::success(
        "Request",
        request_from_entity(request)?,
        None,
    ))
}

pub async fn accept_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ServiceRequest>> {
    transition(state, user, id, RequestStatus::Accepted, "service_request_accept").await
}

pub async fn start_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ServiceRequest>> {
    transition(state, user, id, RequestStatus::InProgress, "service_request_start").await
}

pub async fn complete_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ServiceRequest>> {
    transition(state, user, id, RequestStatus::Completed, "service_request_complete").await
}

pub async fn cancel_request(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ServiceRequest>> {
    transition(state, user, id, RequestStatus::Cancelled, "service_request_cancel").await
}

/// Apply one lifecycle edge under a row lock.
///
/// Authorization is checked before the state guard, so an unauthorized caller
/// learns nothing about the request's current state. The accept and complete
/// timestamps are written exactly once because their transitions are only
/// reachable from states that have not set them.
async fn transition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    target: RequestStatus,
    action: &str,
) -> AppResult<ApiResponse<ServiceRequest>> {
    let txn = state.orm.begin().await?;

    let request = ServiceRequests::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let workshop = Workshops::find_by_id(request.workshop_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let authorized = match target {
        RequestStatus::Accepted | RequestStatus::InProgress | RequestStatus::Completed => {
            user.user_id == workshop.owner_id
        }
        RequestStatus::Cancelled => {
            user.user_id == request.user_id || user.user_id == workshop.owner_id
        }
        RequestStatus::Pending => false,
    };
    if !authorized {
        return Err(AppError::Forbidden);
    }

    let current = RequestStatus::parse(&request.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "request {} has an unknown status '{}'",
            request.id,
            request.status
        ))
    })?;
    if !current.can_transition(target) {
        return Err(AppError::InvalidState(format!(
            "cannot move a {} request to {}",
            current.as_str(),
            target.as_str()
        )));
    }

    let now = Utc::now();
    let mut active: RequestActive = request.into();
    active.status = Set(target.as_str().into());
    match target {
        RequestStatus::Accepted => active.accepted_at = Set(Some(now.into())),
        RequestStatus::Completed => active.completed_at = Set(Some(now.into())),
        _ => {}
    }
    active.updated_at = Set(now.into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some("service_requests"),
        Some(serde_json::json!({ "request_id": updated.id, "status": updated.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        request_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

pub(crate) fn request_from_entity(model: RequestModel) -> AppResult<ServiceRequest> {
    let service_type = ServiceType::parse(&model.service_type).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "request {} has an unknown service type '{}'",
            model.id,
            model.service_type
        ))
    })?;
    let urgency = Urgency::parse(&model.urgency).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "request {} has an unknown urgency '{}'",
            model.id,
            model.urgency
        ))
    })?;
    let status = RequestStatus::parse(&model.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "request {} has an unknown status '{}'",
            model.id,
            model.status
        ))
    })?;

    Ok(ServiceRequest {
        id: model.id,
        user_id: model.user_id,
        workshop_id: model.workshop_id,
        service_type,
        description: model.description,
        urgency,
        status,
        user_latitude: model.user_latitude,
        user_longitude: model.user_longitude,
        user_address: model.user_address,
        distance_km: model.distance_km,
        created_at: model.created_at.with_timezone(&Utc),
        accepted_at: model.accepted_at.map(|dt| dt.with_timezone(&Utc)),
        completed_at: model.completed_at.map(|dt| dt.with_timezone(&Utc)),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
