use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Workshop;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWorkshopRequest {
    pub mechanic_name: String,
    pub workshop_name: String,
    #[serde(default)]
    pub description: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub services: Vec<String>,
    pub photo: Option<String>,
    pub is_open: Option<bool>,
    pub availability: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWorkshopRequest {
    pub mechanic_name: Option<String>,
    pub workshop_name: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub services: Option<Vec<String>>,
    pub photo: Option<String>,
    pub is_open: Option<bool>,
    pub availability: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkshopList {
    pub items: Vec<Workshop>,
}
