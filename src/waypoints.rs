//! Waypoint selection.
//!
//! Turns cluster centroids into a short, density-ranked list of waypoints
//! relevant to one start→end corridor:
//!
//! 1. Corridor filter: a cluster must lie within `direct_distance × corridor_factor`
//!    of the start or of the end.
//! 2. Exclusion: clusters near a waypoint already used by the opposite leg are dropped.
//! 3. Dedup: in descending density order, a cluster is kept only if it is farther
//!    than `dedup_radius_meters` from every cluster already kept.
//! 4. Cap at `max_waypoints` (never more than [`MAX_WAYPOINTS`]).

use log::{debug, info};
use rand::Rng;

use crate::geo_utils::{compute_center, haversine_distance, meters_to_degrees};
use crate::{Cluster, GpsPoint, PlannerConfig, Waypoint, MAX_WAYPOINTS};

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// The zone between a start and an end point used to bound candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corridor {
    pub start: GpsPoint,
    pub end: GpsPoint,
    pub direct_distance: f64,
}

impl Corridor {
    pub fn new(start: GpsPoint, end: GpsPoint) -> Self {
        Self { start, end, direct_distance: haversine_distance(&start, &end) }
    }

    /// True if `point` is within `direct_distance × factor` of either endpoint.
    pub fn contains(&self, point: &GpsPoint, factor: f64) -> bool {
        let nearest = haversine_distance(&self.start, point).min(haversine_distance(&self.end, point));
        nearest <= self.direct_distance * factor
    }

    /// Position of `point` along the start→end axis: 0.0 at start, 1.0 at end.
    ///
    /// Uses a local equirectangular projection, which is plenty for ordering.
    pub fn progress(&self, point: &GpsPoint) -> f64 {
        let cos_lat = self.start.latitude.to_radians().cos();
        let ax = (self.end.longitude - self.start.longitude) * cos_lat;
        let ay = self.end.latitude - self.start.latitude;
        let px = (point.longitude - self.start.longitude) * cos_lat;
        let py = point.latitude - self.start.latitude;

        let len_sq = ax * ax + ay * ay;
        if len_sq == 0.0 {
            return 0.0;
        }
        (px * ax + py * ay) / len_sq
    }
}

/// Select waypoints for the corridor from `start` to `end`.
///
/// The result is ordered by descending cluster density; callers that want a
/// single candidate take element 0.
///
/// # Example
/// ```
/// use waypoint_router::{Cluster, GpsPoint, PlannerConfig, select_waypoints};
///
/// let start = GpsPoint::new(37.50, 127.00);
/// let end = GpsPoint::new(37.51, 127.01);
/// let clusters = vec![
///     Cluster { centroid: GpsPoint::new(37.505, 127.005), density: 4 },
///     Cluster { centroid: GpsPoint::new(38.50, 128.00), density: 9 }, // far away
/// ];
///
/// let selected = select_waypoints(&start, &end, &clusters, &[], &PlannerConfig::default());
/// assert_eq!(selected.len(), 1);
/// assert_eq!(selected[0].density, 4);
/// ```
pub fn select_waypoints(
    start: &GpsPoint,
    end: &GpsPoint,
    clusters: &[Cluster],
    exclude: &[GpsPoint],
    config: &PlannerConfig,
) -> Vec<Waypoint> {
    let corridor = Corridor::new(*start, *end);

    let mut candidates: Vec<&Cluster> = clusters
        .iter()
        .filter(|c| corridor.contains(&c.centroid, config.corridor_factor))
        .filter(|c| {
            !exclude
                .iter()
                .any(|x| haversine_distance(x, &c.centroid) <= config.exclusion_radius_meters)
        })
        .collect();

    debug!(
        "{} of {} clusters inside corridor ({:.0}m direct) after exclusions",
        candidates.len(),
        clusters.len(),
        corridor.direct_distance
    );

    // Stable: equal densities keep cluster creation order
    candidates.sort_by(|a, b| b.density.cmp(&a.density));

    let cap = config.max_waypoints.min(MAX_WAYPOINTS);
    let mut selected: Vec<Waypoint> = Vec::with_capacity(cap);

    for cluster in candidates {
        if selected.len() >= cap {
            break;
        }
        let too_close = selected
            .iter()
            .any(|kept| haversine_distance(&kept.point, &cluster.centroid) <= config.dedup_radius_meters);
        if !too_close {
            selected.push(Waypoint::from(*cluster));
        }
    }

    info!(
        "Selected {} waypoints (dedup radius {:.0}m, cap {})",
        selected.len(),
        config.dedup_radius_meters,
        cap
    );

    selected
}

/// Order waypoints by how far along the start→end axis they lie.
pub fn order_along_corridor(start: &GpsPoint, end: &GpsPoint, waypoints: &[Waypoint]) -> Vec<Waypoint> {
    let corridor = Corridor::new(*start, *end);
    let mut ordered = waypoints.to_vec();
    ordered.sort_by(|a, b| corridor.progress(&a.point).total_cmp(&corridor.progress(&b.point)));
    ordered
}

/// Generate a waypoint beside the midpoint of start→end.
///
/// The point lies on the perpendicular through the midpoint, at
/// `base_distance + U[0, jitter]` meters on a randomly chosen side. Used when
/// no cluster candidate is left for a leg.
///
/// # Example
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use waypoint_router::{GpsPoint, lateral_offset_waypoint};
/// use waypoint_router::geo_utils::haversine_distance;
///
/// let start = GpsPoint::new(37.50, 127.00);
/// let end = GpsPoint::new(37.51, 127.00);
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let wp = lateral_offset_waypoint(&start, &end, 300.0, 100.0, &mut rng);
/// let mid = GpsPoint::new(37.505, 127.00);
/// let offset = haversine_distance(&mid, &wp);
/// assert!(offset > 290.0 && offset < 410.0);
/// ```
pub fn lateral_offset_waypoint<R: Rng + ?Sized>(
    start: &GpsPoint,
    end: &GpsPoint,
    base_distance: f64,
    jitter: f64,
    rng: &mut R,
) -> GpsPoint {
    let mid = compute_center(&[*start, *end]);
    let cos_lat = mid.latitude.to_radians().cos();

    // Direction of travel in local meters (x = east, y = north)
    let dx = (end.longitude - start.longitude) * cos_lat * METERS_PER_DEGREE_LAT;
    let dy = (end.latitude - start.latitude) * METERS_PER_DEGREE_LAT;
    let len = (dx * dx + dy * dy).sqrt();

    let (px, py) = if len > 0.0 { (-dy / len, dx / len) } else { (0.0, 1.0) };

    let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let extra = if jitter > 0.0 { rng.gen_range(0.0..=jitter) } else { 0.0 };
    let distance = base_distance + extra;

    let d_lat = side * py * distance / METERS_PER_DEGREE_LAT;
    let d_lng = side * px * meters_to_degrees(distance, mid.latitude);

    debug!(
        "Lateral waypoint {:.0}m {} of midpoint ({:.6}, {:.6})",
        distance,
        if side > 0.0 { "left" } else { "right" },
        mid.latitude,
        mid.longitude
    );

    GpsPoint::new(mid.latitude + d_lat, mid.longitude + d_lng)
}
