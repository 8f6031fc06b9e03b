use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::mechanics::MechanicList,
    entity::{
        Users,
        profiles::{Column as ProfileCol, Entity as Profiles},
        users::Column as UserCol,
    },
    error::AppResult,
    geo,
    models::MechanicProfile,
    response::{ApiResponse, Meta},
    routes::params::MechanicQuery,
    state::AppState,
};

/// Public mechanics directory.
///
/// With a query point the listing is ordered ascending by flat-earth distance
/// and profiles without coordinates are dropped; without one it is a plain
/// listing that keeps them.
pub async fn list_mechanics(
    state: &AppState,
    query: MechanicQuery,
) -> AppResult<ApiResponse<MechanicList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let rows = Profiles::find()
        .find_also_related(Users)
        .filter(UserCol::UserType.eq("mechanic"))
        .order_by_asc(ProfileCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mechanics: Vec<MechanicProfile> = rows
        .into_iter()
        .filter_map(|(profile, user)| {
            let user = user?;
            Some(MechanicProfile {
                user_id: user.id,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                phone: profile.phone,
                latitude: profile.latitude,
                longitude: profile.longitude,
                distance_km: None,
            })
        })
        .collect();

    let (items, total) = match (query.user_lat, query.user_lon) {
        (Some(user_lat), Some(user_lon)) => {
            let ranked = geo::rank_by_distance((user_lat, user_lon), mechanics, |m| {
                geo::opt_coords_f64(m.latitude.as_ref(), m.longitude.as_ref())
            });
            let total = ranked.len() as i64;
            let items = ranked
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(|(mut mechanic, distance)| {
                    mechanic.distance_km = Some((distance * 100.0).round() / 100.0);
                    mechanic
                })
                .collect();
            (items, total)
        }
        _ => {
            let total = mechanics.len() as i64;
            let items = mechanics
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            (items, total)
        }
    };

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Mechanics",
        MechanicList { items },
        Some(meta),
    ))
}
