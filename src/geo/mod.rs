use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;
const ROAD_DETOUR_FACTOR: f64 = 1.2;
const FALLBACK_DISTANCE_KM: f64 = 500.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

static CITY_CENTROIDS: &[(&str, f64, f64)] = &[
    ("ahmedabad", 23.0225, 72.5714),
    ("bengaluru", 12.9716, 77.5946),
    ("bhopal", 23.2599, 77.4126),
    ("chandigarh", 30.7333, 76.7794),
    ("chennai", 13.0827, 80.2707),
    ("coimbatore", 11.0168, 76.9558),
    ("delhi", 28.7041, 77.1025),
    ("guwahati", 26.1445, 91.7362),
    ("hyderabad", 17.3850, 78.4867),
    ("indore", 22.7196, 75.8577),
    ("jaipur", 26.9124, 75.7873),
    ("kanpur", 26.4499, 80.3319),
    ("kochi", 9.9312, 76.2673),
    ("kolkata", 22.5726, 88.3639),
    ("lucknow", 26.8467, 80.9462),
    ("ludhiana", 30.9010, 75.8573),
    ("mumbai", 19.0760, 72.8777),
    ("nagpur", 21.1458, 79.0882),
    ("patna", 25.5941, 85.1376),
    ("pune", 18.5204, 73.8567),
    ("raipur", 21.2514, 81.6296),
    ("surat", 21.1702, 72.8311),
    ("vadodara", 22.3072, 73.1812),
    ("visakhapatnam", 17.6868, 83.2185),
];

static CITY_INDEX: LazyLock<HashMap<&'static str, GeoPoint>> = LazyLock::new(|| {
    CITY_CENTROIDS
        .iter()
        .map(|&(name, lat, lng)| (name, GeoPoint { lat, lng }))
        .collect()
});

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

/// Estimated road distance between two cities. Unknown cities fall back to a
/// fixed sentinel instead of failing.
pub fn estimate_km(origin: &str, destination: &str) -> f64 {
    match (lookup(origin), lookup(destination)) {
        (Some(a), Some(b)) => haversine_km(a, b) * ROAD_DETOUR_FACTOR,
        _ => FALLBACK_DISTANCE_KM,
    }
}

fn lookup(city: &str) -> Option<&'static GeoPoint> {
    CITY_INDEX.get(city.trim().to_lowercase().as_str())
}
