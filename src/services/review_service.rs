use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::reviews::{CreateReviewRequest, ReviewList, ReviewWithWorkshop, UpdateReviewRequest},
    entity::{
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews, Model as ReviewModel},
        service_requests::Entity as ServiceRequests,
        workshops::{ActiveModel as WorkshopActive, Entity as Workshops, Model as WorkshopModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::ReviewQuery,
    services::workshop_service::workshop_from_entity,
    state::AppState,
};

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<ReviewWithWorkshop>> {
    validate_rating(payload.rating)?;

    let txn = state.orm.begin().await?;

    // The workshop row lock serializes concurrent review writers so the
    // derived rating pair is recomputed against a settled review set.
    let workshop = Workshops::find_by_id(payload.workshop_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(request_id) = payload.service_request_id {
        let request = ServiceRequests::find_by_id(request_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        if request.user_id != user.user_id {
            return Err(AppError::BadRequest(
                "Service request belongs to another user".into(),
            ));
        }
        if request.workshop_id != workshop.id {
            return Err(AppError::BadRequest(
                "Service request references another workshop".into(),
            ));
        }
        let reviewed = Reviews::find()
            .filter(ReviewCol::ServiceRequestId.eq(request_id))
            .one(&txn)
            .await?;
        if reviewed.is_some() {
            return Err(AppError::BadRequest(
                "Service request already has a review".into(),
            ));
        }
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        workshop_id: Set(workshop.id),
        service_request_id: Set(payload.service_request_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let workshop = recompute_rating(&txn, workshop).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_create",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id, "workshop_id": workshop.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Review created",
        ReviewWithWorkshop {
            review: review_from_entity(review),
            workshop: workshop_from_entity(workshop)?,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_reviews(
    state: &AppState,
    query: ReviewQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut finder = Reviews::find().order_by_desc(ReviewCol::CreatedAt);
    if let Some(workshop_id) = query.workshop_id {
        finder = finder.filter(ReviewCol::WorkshopId.eq(workshop_id));
    }

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(meta),
    ))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<ReviewWithWorkshop>> {
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let txn = state.orm.begin().await?;

    let existing = Reviews::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    let workshop = Workshops::find_by_id(existing.workshop_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ReviewActive = existing.into();
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        active.comment = Set(comment);
    }
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&txn).await?;

    let workshop = recompute_rating(&txn, workshop).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_update",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": review.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        ReviewWithWorkshop {
            review: review_from_entity(review),
            workshop: workshop_from_entity(workshop)?,
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;

    let existing = Reviews::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    let workshop = Workshops::find_by_id(existing.workshop_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    existing.delete(&txn).await?;
    recompute_rating(&txn, workshop).await?;
    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_delete",
        Some("reviews"),
        Some(serde_json::json!({ "review_id": id })),
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

fn validate_rating(rating: i32) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

/// Recompute the derived rating pair from the current review set and persist
/// both fields in one update. Caller must hold the workshop row lock.
async fn recompute_rating(
    txn: &DatabaseTransaction,
    workshop: WorkshopModel,
) -> AppResult<WorkshopModel> {
    let ratings: Vec<i32> = Reviews::find()
        .select_only()
        .column(ReviewCol::Rating)
        .filter(ReviewCol::WorkshopId.eq(workshop.id))
        .into_tuple()
        .all(txn)
        .await?;

    let count = ratings.len() as i32;
    let rating = if ratings.is_empty() {
        Decimal::ZERO
    } else {
        let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
        (Decimal::from(sum) / Decimal::from(count)).round_dp(2)
    };

    let mut active: WorkshopActive = workshop.into();
    active.rating = Set(rating);
    active.reviews_count = Set(count);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        user_id: model.user_id,
        workshop_id: model.workshop_id,
        service_request_id: model.service_request_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
