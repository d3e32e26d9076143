//! Waypoint route validation.
//!
//! A single candidate waypoint is tested against the direct route. The
//! waypoint route is start→waypoint plus waypoint→end; it is discarded in
//! favour of the direct route when a leg cannot be routed, when the legs do
//! not meet cleanly or reverse direction at the join, or (optionally) when it
//! is far longer or shorter than the direct route.

use log::{debug, info, warn};

use crate::assembly::PathBuilder;
use crate::geo_utils::{coord_key, haversine_distance, polyline_length};
use crate::routing::SegmentRouter;
use crate::{GpsPoint, PlannerConfig, Segment};

/// Why a waypoint route was replaced by the direct route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// A leg could not be routed by the provider
    LegFailed,
    /// A leg came back without any points
    EmptyLeg,
    /// Legs do not meet, or the route reverses at the waypoint
    GoingBackwards,
    /// Total length outside the accepted ratio band
    UnreasonableLength,
}

/// How the returned path was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No waypoint was offered; the direct route was returned
    Direct,
    /// The waypoint route passed validation
    Waypoint,
    /// A waypoint was offered but rejected
    Fallback(FallbackReason),
}

/// Result of [`validate_route`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRoute {
    pub path: Vec<GpsPoint>,
    /// Set only when `outcome` is [`RouteOutcome::Waypoint`]
    pub used_waypoint: Option<GpsPoint>,
    pub outcome: RouteOutcome,
    /// Length of the direct route in meters
    pub base_distance: f64,
}

/// Direction of travel between two points in local meters (north, east).
fn step(from: &GpsPoint, to: &GpsPoint) -> (f64, f64) {
    let cos_lat = from.latitude.to_radians().cos();
    (to.latitude - from.latitude, (to.longitude - from.longitude) * cos_lat)
}

/// Direction of the last non-degenerate step of a path.
fn terminal_direction(path: &[GpsPoint]) -> Option<(f64, f64)> {
    let last = path.last()?;
    let last_key = coord_key(last);
    let prev = path.iter().rev().find(|p| coord_key(p) != last_key)?;
    Some(step(prev, last))
}

/// Direction of the first non-degenerate step of a path.
fn initial_direction(path: &[GpsPoint]) -> Option<(f64, f64)> {
    let first = path.first()?;
    let first_key = coord_key(first);
    let next = path.iter().find(|p| coord_key(p) != first_key)?;
    Some(step(first, next))
}

/// True if the waypoint route should be rejected at the join.
///
/// Rejects when either leg is empty, when the gap between the end of
/// `to_waypoint` and the start of `from_waypoint` exceeds `max_join_gap_meters`,
/// or when the first leg's final direction and the second leg's initial
/// direction have a negative dot product. Legs too short to have a direction
/// skip the dot-product test.
pub fn is_path_going_backwards(
    to_waypoint: &[GpsPoint],
    from_waypoint: &[GpsPoint],
    max_join_gap_meters: f64,
) -> bool {
    let (Some(join_end), Some(join_start)) = (to_waypoint.last(), from_waypoint.first()) else {
        return true;
    };

    let gap = haversine_distance(join_end, join_start);
    if gap > max_join_gap_meters {
        debug!("Legs meet with a {:.1}m gap (max {:.1}m)", gap, max_join_gap_meters);
        return true;
    }

    match (terminal_direction(to_waypoint), initial_direction(from_waypoint)) {
        (Some((a_n, a_e)), Some((b_n, b_e))) => {
            let dot = a_n * b_n + a_e * b_e;
            if dot < 0.0 {
                debug!("Route reverses at waypoint (dot = {:.3e})", dot);
            }
            dot < 0.0
        }
        _ => false,
    }
}

/// True if `candidate_distance` lies within
/// `[min_ratio × base_distance, max_ratio × base_distance]`.
///
/// # Example
/// ```
/// use waypoint_router::is_reasonable_length;
///
/// assert!(is_reasonable_length(1000.0, 1800.0, 0.5, 2.5));
/// assert!(!is_reasonable_length(1000.0, 2600.0, 0.5, 2.5));
/// assert!(!is_reasonable_length(1000.0, 400.0, 0.5, 2.5));
/// ```
pub fn is_reasonable_length(base_distance: f64, candidate_distance: f64, min_ratio: f64, max_ratio: f64) -> bool {
    candidate_distance >= base_distance * min_ratio && candidate_distance <= base_distance * max_ratio
}

/// Route start→end through `waypoint` if the result is geometrically sane,
/// otherwise return the direct route.
///
/// The direct route itself degrades to a straight line if the provider fails.
pub async fn validate_route<R: SegmentRouter + ?Sized>(
    router: &R,
    start: &GpsPoint,
    end: &GpsPoint,
    waypoint: Option<&GpsPoint>,
    config: &PlannerConfig,
) -> ValidatedRoute {
    let direct = Segment::new(*start, *end);
    let base_path = match router.route_segment(direct).await {
        Ok(points) if !points.is_empty() => points,
        Ok(_) => {
            warn!("Direct route returned no points, using straight line");
            direct.straight_line()
        }
        Err(e) => {
            warn!("Direct route failed ({}), using straight line", e);
            direct.straight_line()
        }
    };
    let base_distance = polyline_length(&base_path);

    let fallback = |reason: FallbackReason| {
        info!("Waypoint rejected ({:?}), returning direct route", reason);
        ValidatedRoute {
            path: base_path.clone(),
            used_waypoint: None,
            outcome: RouteOutcome::Fallback(reason),
            base_distance,
        }
    };

    let Some(waypoint) = waypoint else {
        return ValidatedRoute {
            path: base_path.clone(),
            used_waypoint: None,
            outcome: RouteOutcome::Direct,
            base_distance,
        };
    };

    let to_waypoint = match router.route_segment(Segment::new(*start, *waypoint)).await {
        Ok(points) if points.is_empty() => return fallback(FallbackReason::EmptyLeg),
        Ok(points) => points,
        Err(e) => {
            warn!("Leg to waypoint failed: {}", e);
            return fallback(FallbackReason::LegFailed);
        }
    };
    let from_waypoint = match router.route_segment(Segment::new(*waypoint, *end)).await {
        Ok(points) if points.is_empty() => return fallback(FallbackReason::EmptyLeg),
        Ok(points) => points,
        Err(e) => {
            warn!("Leg from waypoint failed: {}", e);
            return fallback(FallbackReason::LegFailed);
        }
    };

    if is_path_going_backwards(&to_waypoint, &from_waypoint, config.max_join_gap_meters) {
        return fallback(FallbackReason::GoingBackwards);
    }

    let mut builder = PathBuilder::new();
    builder.push_routed(&to_waypoint);
    builder.push_routed(&from_waypoint);
    let combined = builder.finish();
    let candidate_distance = polyline_length(&combined);

    if !is_reasonable_length(base_distance, candidate_distance, config.min_length_ratio, config.max_length_ratio) {
        if config.reject_unreasonable_length {
            return fallback(FallbackReason::UnreasonableLength);
        }
        warn!(
            "Waypoint route is {:.0}m against {:.0}m direct; keeping it anyway",
            candidate_distance, base_distance
        );
    }

    info!(
        "Waypoint route accepted: {:.0}m vs {:.0}m direct, {} points",
        candidate_distance,
        base_distance,
        combined.len()
    );

    ValidatedRoute {
        path: combined,
        used_waypoint: Some(*waypoint),
        outcome: RouteOutcome::Waypoint,
        base_distance,
    }
}
