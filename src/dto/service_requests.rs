use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ServiceRequest;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateServiceRequestRequest {
    pub workshop_id: Uuid,
    pub service_type: String,
    pub description: String,
    pub urgency: Option<String>,
    pub user_latitude: Decimal,
    pub user_longitude: Decimal,
    #[serde(default)]
    pub user_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceRequestList {
    pub items: Vec<ServiceRequest>,
}
