//! Path canonicalization.
//!
//! Collapses near-duplicate consecutive points. The tolerance is a planar
//! Euclidean distance in degrees, not a geodesic one: it only needs to catch
//! vertices that are effectively the same spot.

use geo::{Distance, Euclidean, Point};
use log::debug;

use crate::GpsPoint;

/// Keep a point only if it is farther than `tolerance` (degrees) from the last
/// kept point. Points with non-finite coordinates are dropped.
///
/// The first and last finite points always survive: when the last point falls
/// within tolerance of the point kept before it, that earlier point is
/// replaced instead. A path that collapses entirely onto its first point is
/// returned as that single point.
///
/// # Example
/// ```
/// use waypoint_router::{GpsPoint, clean_path};
///
/// let path = vec![
///     GpsPoint::new(37.500000, 127.000000),
///     GpsPoint::new(37.500001, 127.000001), // same spot
///     GpsPoint::new(f64::NAN, 127.0),
///     GpsPoint::new(37.501000, 127.001000),
/// ];
/// let cleaned = clean_path(&path, 0.00001);
/// assert_eq!(cleaned.len(), 2);
/// ```
pub fn clean_path(points: &[GpsPoint], tolerance: f64) -> Vec<GpsPoint> {
    let mut cleaned: Vec<GpsPoint> = Vec::with_capacity(points.len());
    let mut last: Option<Point> = None;

    for p in points {
        if !p.latitude.is_finite() || !p.longitude.is_finite() {
            continue;
        }

        let current = Point::new(p.longitude, p.latitude);
        let keep = match last {
            Some(prev) => Euclidean::distance(prev, current) > tolerance,
            None => true,
        };

        if keep {
            cleaned.push(*p);
            last = Some(current);
        }
    }

    pin_last(&mut cleaned, points, tolerance);

    if cleaned.len() != points.len() {
        debug!("Cleaned path from {} to {} points", points.len(), cleaned.len());
    }

    cleaned
}

fn within(a: &GpsPoint, b: &GpsPoint, tolerance: f64) -> bool {
    let a = Point::new(a.longitude, a.latitude);
    let b = Point::new(b.longitude, b.latitude);
    Euclidean::distance(a, b) <= tolerance
}

/// Make the last finite input point the last output point.
fn pin_last(cleaned: &mut Vec<GpsPoint>, points: &[GpsPoint], tolerance: f64) {
    let Some(final_point) = points
        .iter()
        .rev()
        .find(|p| p.latitude.is_finite() && p.longitude.is_finite())
    else {
        return;
    };

    if cleaned.len() < 2 || cleaned.last() == Some(final_point) {
        return;
    }

    cleaned.pop();
    while cleaned.len() > 1 && cleaned.last().is_some_and(|p| within(p, final_point, tolerance)) {
        cleaned.pop();
    }
    cleaned.push(*final_point);
}
