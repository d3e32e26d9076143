//! # Geographic Utilities
//!
//! Distance geometry shared by every stage of the planner.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`polyline_length`] | Total length of a path in meters |
//! | [`compute_center`] | Arithmetic-mean centroid of a set of points |
//! | [`meters_to_degrees`] | Convert meters to approximate degrees at a latitude |
//! | [`coord_key`] | Rounded coordinate key used to dedup path vertices |
//!
//! ## Example
//!
//! ```rust
//! use waypoint_router::{GpsPoint, geo_utils};
//!
//! let a = GpsPoint::new(37.5, 127.0);
//! let b = GpsPoint::new(37.5, 127.0009);
//!
//! let dist = geo_utils::haversine_distance(&a, &b);
//! assert!((dist - 80.0).abs() < 4.0);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Great-circle distance on a sphere of radius 6,371,000 m. Accurate to within
//! 0.3% for the walking-scale distances handled here.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates in degrees. Out-of-range input is
//! rejected upstream by [`crate::PlanRequest::endpoints`].

use crate::GpsPoint;

/// Mean Earth radius used by [`haversine_distance`].
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points in meters.
///
/// Symmetric, and exactly `0.0` for identical points.
///
/// # Example
///
/// ```rust
/// use waypoint_router::{GpsPoint, geo_utils};
///
/// let city_hall = GpsPoint::new(37.5663, 126.9779);
/// let gangnam = GpsPoint::new(37.4979, 127.0276);
///
/// let distance = geo_utils::haversine_distance(&city_hall, &gangnam);
/// assert!((distance - 8_780.0).abs() < 200.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Calculate the total length of a path in meters.
///
/// Empty or single-point paths return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Convert meters to approximate degrees at a given latitude.
///
/// Uses the longitude scale (`111,320 m × cos(latitude)`), which is the larger
/// of the two degree sizes, so the result is conservative for both axes.
///
/// - At the equator, 1 degree ≈ 111,320 meters
/// - At the poles, longitude degrees become meaningless (clamped)
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Center/Centroid Functions
// =============================================================================

/// Compute the arithmetic-mean centroid of a set of points.
///
/// Returns (0, 0) for empty input. Plain averaging is fine for clusters a few
/// dozen meters wide; it is not meant for antimeridian-spanning input.
///
/// # Example
///
/// ```rust
/// use waypoint_router::{GpsPoint, geo_utils};
///
/// let points = vec![
///     GpsPoint::new(37.50, 127.00),
///     GpsPoint::new(37.52, 127.02),
/// ];
///
/// let center = geo_utils::compute_center(&points);
/// assert!((center.latitude - 37.51).abs() < 1e-9);
/// assert!((center.longitude - 127.01).abs() < 1e-9);
/// ```
pub fn compute_center(points: &[GpsPoint]) -> GpsPoint {
    if points.is_empty() {
        return GpsPoint::new(0.0, 0.0);
    }

    let sum_lat: f64 = points.iter().map(|p| p.latitude).sum();
    let sum_lng: f64 = points.iter().map(|p| p.longitude).sum();
    let n = points.len() as f64;

    GpsPoint::new(sum_lat / n, sum_lng / n)
}

// =============================================================================
// Vertex Keys
// =============================================================================

/// Coordinate key rounded to 6 decimal places (~0.1 m).
///
/// Two vertices with the same key are treated as the same vertex when
/// stitching segments together.
pub type CoordKey = (i64, i64);

#[inline]
pub fn coord_key(point: &GpsPoint) -> CoordKey {
    (
        (point.latitude * 1e6).round() as i64,
        (point.longitude * 1e6).round() as i64,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
