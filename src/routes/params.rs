use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

// Query structs carry page/per_page inline: the urlencoded deserializer cannot
// handle numeric fields behind serde(flatten).

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkshopQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub service_type: Option<String>,
    pub city: Option<String>,
    /// With `user_lon`, switches the listing to distance order.
    pub user_lat: Option<f64>,
    pub user_lon: Option<f64>,
}

impl WorkshopQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RequestListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
}

impl RequestListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub workshop_id: Option<Uuid>,
}

impl ReviewQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MechanicQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub user_lat: Option<f64>,
    pub user_lon: Option<f64>,
}

impl MechanicQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
