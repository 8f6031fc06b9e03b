//! Flat-earth distance ranking.
//!
//! One degree of latitude and of longitude both count as a constant 111 km,
//! with no cosine-of-latitude correction. This matches the distance expression
//! clients already rely on for ordering within a single metro area; it is not
//! geodesic distance and must not be "fixed" into one.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

pub const KM_PER_DEGREE: f64 = 111.0;

pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat1 - lat2) * KM_PER_DEGREE;
    let dlon = (lon1 - lon2) * KM_PER_DEGREE;
    (dlat * dlat + dlon * dlon).sqrt()
}

/// Rank `items` ascending by distance from `origin`.
///
/// Items without coordinates are excluded from the result; ties keep input
/// order (the sort is stable).
pub fn rank_by_distance<T>(
    origin: (f64, f64),
    items: Vec<T>,
    coords: impl Fn(&T) -> Option<(f64, f64)>,
) -> Vec<(T, f64)> {
    let mut ranked: Vec<(T, f64)> = items
        .into_iter()
        .filter_map(|item| {
            let (lat, lon) = coords(&item)?;
            let d = distance_km(origin.0, origin.1, lat, lon);
            Some((item, d))
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

pub fn coords_f64(lat: &Decimal, lon: &Decimal) -> Option<(f64, f64)> {
    Some((lat.to_f64()?, lon.to_f64()?))
}

pub fn opt_coords_f64(lat: Option<&Decimal>, lon: Option<&Decimal>) -> Option<(f64, f64)> {
    coords_f64(lat?, lon?)
}

/// Distance as stored on a service request: two decimal places.
pub fn distance_decimal(km: f64) -> Option<Decimal> {
    Decimal::from_f64(km).map(|d| d.round_dp(2))
}
