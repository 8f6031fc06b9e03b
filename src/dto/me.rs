use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// "customer" or "mechanic"; the admin tag is never self-assigned.
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
}
