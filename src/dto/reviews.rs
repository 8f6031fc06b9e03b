use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Review, Workshop};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub workshop_id: Uuid,
    pub service_request_id: Option<Uuid>,
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
}

/// A mutated review together with the workshop state after recomputation, so
/// callers see the new rating without a second read.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewWithWorkshop {
    pub review: Review,
    pub workshop: Workshop,
}
