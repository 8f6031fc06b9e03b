use serde::Serialize;
use utoipa::ToSchema;

use crate::models::MechanicProfile;

#[derive(Debug, Serialize, ToSchema)]
pub struct MechanicList {
    pub items: Vec<MechanicProfile>,
}
