use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::workshops::{CreateWorkshopRequest, UpdateWorkshopRequest, WorkshopList},
    entity::workshops::{ActiveModel, Column, Entity as Workshops, Model as WorkshopModel},
    error::{AppError, AppResult},
    geo,
    middleware::auth::{AuthUser, ensure_owner},
    models::{Availability, ServiceType, Workshop},
    response::{ApiResponse, Meta},
    routes::params::WorkshopQuery,
    state::AppState,
};

pub async fn list_workshops(
    state: &AppState,
    query: WorkshopQuery,
) -> AppResult<ApiResponse<WorkshopList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(service_type) = query.service_type.as_ref().filter(|s| !s.is_empty()) {
        let tag = ServiceType::parse(service_type)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown service type '{service_type}'")))?;
        condition = condition.add(Expr::cust_with_values(
            "services @> ?::jsonb",
            [serde_json::json!([tag.as_str()]).to_string()],
        ));
    }

    if let Some(city) = query.city.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::City).ilike(city.clone()));
    }

    // Default ordering doubles as the tie-break order for distance ranking.
    let finder = Workshops::find()
        .filter(condition)
        .order_by_desc(Column::Rating)
        .order_by_desc(Column::CreatedAt);

    let (items, total) = match (query.user_lat, query.user_lon) {
        (Some(user_lat), Some(user_lon)) => {
            // The portable ranking strategy: bulk-fetch, then order in-process.
            let workshops = finder
                .all(&state.orm)
                .await?
                .into_iter()
                .map(workshop_from_entity)
                .collect::<AppResult<Vec<Workshop>>>()?;
            let ranked = geo::rank_by_distance((user_lat, user_lon), workshops, |w| {
                geo::coords_f64(&w.latitude, &w.longitude)
            });
            let total = ranked.len() as i64;
            let items = ranked
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|(mut workshop, distance)| {
                    workshop.distance_km = Some((distance * 100.0).round() / 100.0);
                    workshop
                })
                .collect();
            (items, total)
        }
        _ => {
            let total = finder.clone().count(&state.orm).await? as i64;
            let items = finder
                .limit(limit as u64)
                .offset(offset as u64)
                .all(&state.orm)
                .await?
                .into_iter()
                .map(workshop_from_entity)
                .collect::<AppResult<Vec<Workshop>>>()?;
            (items, total)
        }
    };

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Workshops",
        WorkshopList { items },
        Some(meta),
    ))
}

pub async fn get_workshop(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Workshop>> {
    let workshop = Workshops::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Workshop",
        workshop_from_entity(workshop)?,
        None,
    ))
}

pub async fn my_workshop(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Workshop>> {
    let workshop = Workshops::find()
        .filter(Column::OwnerId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Workshop",
        workshop_from_entity(workshop)?,
        None,
    ))
}

pub async fn create_workshop(
    state: &AppState,
    user: &AuthUser,
    payload: CreateWorkshopRequest,
) -> AppResult<ApiResponse<Workshop>> {
    if payload.mechanic_name.trim().is_empty() || payload.workshop_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Mechanic name and workshop name are required".into(),
        ));
    }
    if payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("Phone is required".into()));
    }
    let services = parse_services(&payload.services)?;
    let availability = match payload.availability.as_deref() {
        Some(value) => Availability::parse(value)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown availability '{value}'")))?,
        None => Availability::Available,
    };

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user.user_id),
        mechanic_name: Set(payload.mechanic_name),
        workshop_name: Set(payload.workshop_name),
        description: Set(payload.description),
        phone: Set(payload.phone),
        email: Set(payload.email),
        address: Set(payload.address),
        city: Set(payload.city),
        state: Set(payload.state),
        pincode: Set(payload.pincode),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        services: Set(services_json(&services)),
        photo: Set(payload.photo),
        is_open: Set(payload.is_open.unwrap_or(true)),
        availability: Set(availability.as_str().into()),
        // Derived pair starts empty and is only ever written by recomputation.
        rating: Set(Decimal::ZERO),
        reviews_count: Set(0),
        is_verified: Set(false),
        verified_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let workshop = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "workshop_create",
        Some("workshops"),
        Some(serde_json::json!({ "workshop_id": workshop.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Workshop created",
        workshop_from_entity(workshop)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_workshop(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateWorkshopRequest,
) -> AppResult<ApiResponse<Workshop>> {
    let existing = Workshops::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(user, existing.owner_id)?;

    let mut active: ActiveModel = existing.into();
    if let Some(mechanic_name) = payload.mechanic_name {
        active.mechanic_name = Set(mechanic_name);
    }
    if let Some(workshop_name) = payload.workshop_name {
        active.workshop_name = Set(workshop_name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(phone);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(state_name) = payload.state {
        active.state = Set(state_name);
    }
    if let Some(pincode) = payload.pincode {
        active.pincode = Set(pincode);
    }
    if let Some(latitude) = payload.latitude {
        active.latitude = Set(latitude);
    }
    if let Some(longitude) = payload.longitude {
        active.longitude = Set(longitude);
    }
    if let Some(services) = payload.services {
        let services = parse_services(&services)?;
        active.services = Set(services_json(&services));
    }
    if let Some(photo) = payload.photo {
        active.photo = Set(Some(photo));
    }
    if let Some(is_open) = payload.is_open {
        active.is_open = Set(is_open);
    }
    if let Some(availability) = payload.availability {
        let availability = Availability::parse(&availability)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown availability '{availability}'")))?;
        active.availability = Set(availability.as_str().into());
    }
    active.updated_at = Set(Utc::now().into());
    let workshop = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "workshop_update",
        Some("workshops"),
        Some(serde_json::json!({ "workshop_id": workshop.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        workshop_from_entity(workshop)?,
        Some(Meta::empty()),
    ))
}

pub async fn delete_workshop(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Workshops::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner(user, existing.owner_id)?;

    // Requests and reviews go with it via the FK cascades.
    Workshops::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "workshop_delete",
        Some("workshops"),
        Some(serde_json::json!({ "workshop_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn parse_services(tags: &[String]) -> AppResult<Vec<ServiceType>> {
    if tags.is_empty() {
        return Err(AppError::BadRequest(
            "At least one service must be offered".into(),
        ));
    }
    tags.iter()
        .map(|tag| {
            ServiceType::parse(tag)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown service type '{tag}'")))
        })
        .collect()
}

fn services_json(services: &[ServiceType]) -> serde_json::Value {
    serde_json::Value::Array(
        services
            .iter()
            .map(|s| serde_json::Value::String(s.as_str().into()))
            .collect(),
    )
}

pub(crate) fn workshop_from_entity(model: WorkshopModel) -> AppResult<Workshop> {
    let services = model
        .services
        .as_array()
        .and_then(|tags| {
            tags.iter()
                .map(|tag| tag.as_str().and_then(ServiceType::parse))
                .collect::<Option<Vec<ServiceType>>>()
        })
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "workshop {} has a malformed services column",
                model.id
            ))
        })?;
    let availability = Availability::parse(&model.availability).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "workshop {} has an unknown availability '{}'",
            model.id,
            model.availability
        ))
    })?;

    Ok(Workshop {
        id: model.id,
        owner_id: model.owner_id,
        mechanic_name: model.mechanic_name,
        workshop_name: model.workshop_name,
        description: model.description,
        phone: model.phone,
        email: model.email,
        address: model.address,
        city: model.city,
        state: model.state,
        pincode: model.pincode,
        latitude: model.latitude,
        longitude: model.longitude,
        services,
        photo: model.photo,
        is_open: model.is_open,
        availability,
        rating: model.rating,
        reviews_count: model.reviews_count,
        is_verified: model.is_verified,
        verified_at: model.verified_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        distance_km: None,
    })
}
