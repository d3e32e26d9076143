//! # Waypoint Router
//!
//! Pedestrian route planning that prefers to pass through dense clusters of
//! "good" quality markers.
//!
//! This library provides:
//! - Greedy fixed-radius clustering of quality markers
//! - Corridor-bounded waypoint selection with density ranking
//! - Segment-by-segment route assembly over an external pedestrian router
//! - Geometric validation of waypoint routes with direct-route fallback
//!
//! ## Features
//!
//! - **`serde`** - Serialize/deserialize requests, results and points
//! - **`http`** - Enable the TMAP pedestrian routing client
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use waypoint_router::{GpsPoint, Marker, MarkerQuality, PlannerConfig};
//! use waypoint_router::{clustering, waypoints};
//!
//! let markers = vec![
//!     Marker::new(37.5050, 127.0050, MarkerQuality::Good),
//!     Marker::new(37.5051, 127.0050, MarkerQuality::Good),
//!     Marker::new(37.5050, 127.0051, MarkerQuality::Good),
//! ];
//!
//! let config = PlannerConfig::default();
//! let clusters = clustering::cluster_markers(&markers, config.cluster_radius_meters, config.min_cluster_size);
//! assert_eq!(clusters.len(), 1);
//!
//! let start = GpsPoint::new(37.50, 127.00);
//! let end = GpsPoint::new(37.51, 127.01);
//! let selected = waypoints::select_waypoints(&start, &end, &clusters, &[], &config);
//! assert_eq!(selected.len(), 1);
//! ```

pub mod error;
pub use error::{Result, RouteError};

pub mod geo_utils;

// Greedy marker clustering
pub mod clustering;
pub use clustering::cluster_markers;

// Corridor filtering, dedup and lateral offset waypoints
pub mod waypoints;
pub use waypoints::{lateral_offset_waypoint, order_along_corridor, select_waypoints, Corridor};

// Provider seam and offline router
pub mod routing;
pub use routing::{SegmentRouter, StraightLineRouter};

// TMAP pedestrian routing client
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{TmapClient, TmapConfig};

pub mod assembly;
pub use assembly::{assemble_route, assemble_route_concurrent};

pub mod validation;
pub use validation::{
    is_path_going_backwards, is_reasonable_length, validate_route,
    FallbackReason, RouteOutcome, ValidatedRoute,
};

pub mod canonical;
pub use canonical::clean_path;

pub mod planner;
pub use planner::{MarkerStore, RoutePlanner};

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate.
///
/// Equality is exact; use [`geo_utils::haversine_distance`] to judge closeness.
///
/// # Example
/// ```
/// use waypoint_router::GpsPoint;
/// let point = GpsPoint::new(37.5665, 126.9780); // Seoul
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    #[cfg_attr(feature = "serde", serde(rename = "lat", alias = "latitude"))]
    pub latitude: f64,
    #[cfg_attr(feature = "serde", serde(rename = "lng", alias = "longitude"))]
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Quality flag attached to a marker by the user who placed it.
///
/// Any flag other than `"good"` maps to [`MarkerQuality::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum MarkerQuality {
    Good,
    Other,
}

impl From<String> for MarkerQuality {
    fn from(flag: String) -> Self {
        if flag.eq_ignore_ascii_case("good") {
            MarkerQuality::Good
        } else {
            MarkerQuality::Other
        }
    }
}

impl From<MarkerQuality> for String {
    fn from(quality: MarkerQuality) -> Self {
        match quality {
            MarkerQuality::Good => "good".to_string(),
            MarkerQuality::Other => "other".to_string(),
        }
    }
}

/// A user-placed marker from the marker store. Read-only input to the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    #[cfg_attr(feature = "serde", serde(alias = "marker_type"))]
    pub quality: MarkerQuality,
}

impl Marker {
    pub fn new(latitude: f64, longitude: f64, quality: MarkerQuality) -> Self {
        Self { latitude, longitude, quality }
    }

    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }

    pub fn is_good(&self) -> bool {
        self.quality == MarkerQuality::Good
    }
}

/// A group of nearby good markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// Arithmetic mean of member coordinates
    pub centroid: GpsPoint,
    /// Number of member markers
    pub density: u32,
}

/// A candidate intermediate stop promoted from a cluster centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub point: GpsPoint,
    /// Density of the source cluster, used for ranking
    pub density: u32,
}

impl From<Cluster> for Waypoint {
    fn from(cluster: Cluster) -> Self {
        Self { point: cluster.centroid, density: cluster.density }
    }
}

/// One start→end leg sent to the routing provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: GpsPoint,
    pub to: GpsPoint,
}

impl Segment {
    pub fn new(from: GpsPoint, to: GpsPoint) -> Self {
        Self { from, to }
    }

    /// Degraded geometry used when the provider cannot route this segment.
    pub fn straight_line(&self) -> Vec<GpsPoint> {
        vec![self.from, self.to]
    }
}

/// Inbound route-planning request.
///
/// `start` and `end` are optional so a malformed request can be rejected with
/// [`RouteError::InvalidInput`] instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PlanRequest {
    pub start: Option<GpsPoint>,
    pub end: Option<GpsPoint>,
    /// Explicit via-points; when present no cluster waypoints are chosen
    pub stopovers: Vec<GpsPoint>,
    /// Waypoints used by a previous leg (reverse-direction planning)
    pub exclude_waypoints: Vec<GpsPoint>,
}

impl PlanRequest {
    pub fn new(start: GpsPoint, end: GpsPoint) -> Self {
        Self { start: Some(start), end: Some(end), ..Default::default() }
    }

    pub fn with_stopovers(mut self, stopovers: Vec<GpsPoint>) -> Self {
        self.stopovers = stopovers;
        self
    }

    pub fn excluding(mut self, waypoints: Vec<GpsPoint>) -> Self {
        self.exclude_waypoints = waypoints;
        self
    }

    /// Validate and return the `(start, end)` pair.
    pub fn endpoints(&self) -> Result<(GpsPoint, GpsPoint)> {
        let start = self
            .start
            .ok_or_else(|| RouteError::InvalidInput("start is required".to_string()))?;
        let end = self
            .end
            .ok_or_else(|| RouteError::InvalidInput("end is required".to_string()))?;

        if !start.is_valid() {
            return Err(RouteError::InvalidInput(format!(
                "start ({}, {}) is out of range",
                start.latitude, start.longitude
            )));
        }
        if !end.is_valid() {
            return Err(RouteError::InvalidInput(format!(
                "end ({}, {}) is out of range",
                end.latitude, end.longitude
            )));
        }
        if let Some(bad) = self.stopovers.iter().find(|p| !p.is_valid()) {
            return Err(RouteError::InvalidInput(format!(
                "stopover ({}, {}) is out of range",
                bad.latitude, bad.longitude
            )));
        }

        Ok((start, end))
    }
}

/// Result returned to the caller: always a path, possibly a degraded one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PlanningResult {
    pub path: Vec<GpsPoint>,
    /// Waypoint the path detours through; pass it back as an exclusion when
    /// planning the reverse leg
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub used_waypoint: Option<GpsPoint>,
}

/// Upper bound on waypoints accepted by the assembler.
pub const MAX_WAYPOINTS: usize = 5;

/// Configuration for waypoint selection, assembly and validation.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Markers closer than this to any cluster member join that cluster.
    /// Default: 50.0 meters
    pub cluster_radius_meters: f64,

    /// Clusters with fewer members are discarded.
    /// Default: 3
    pub min_cluster_size: u32,

    /// Clusters farther than `direct_distance * corridor_factor` from both
    /// start and end are ignored.
    /// Default: 1.5
    pub corridor_factor: f64,

    /// Clusters within this distance of an excluded waypoint are dropped.
    /// Default: 100.0 meters
    pub exclusion_radius_meters: f64,

    /// Minimum separation between two selected waypoints.
    /// Default: 500.0 meters
    pub dedup_radius_meters: f64,

    /// Maximum number of waypoints returned by selection (clamped to 5).
    /// Default: 5
    pub max_waypoints: usize,

    /// Consecutive path points closer than this (planar, degrees) are collapsed.
    /// Default: 0.00001 (~1 meter)
    pub path_tolerance_degrees: f64,

    /// Largest gap allowed where the two legs of a waypoint route meet.
    /// Default: 30.0 meters
    pub max_join_gap_meters: f64,

    /// Waypoint route must be at least this fraction of the direct route.
    /// Default: 0.5
    pub min_length_ratio: f64,

    /// Waypoint route must be at most this multiple of the direct route.
    /// Default: 2.5
    pub max_length_ratio: f64,

    /// Fall back to the direct route when the length check fails.
    /// Default: true
    pub reject_unreasonable_length: bool,

    /// Perpendicular offset of a generated lateral waypoint.
    /// Default: 300.0 meters
    pub lateral_offset_meters: f64,

    /// Upper bound of random jitter added to the lateral offset.
    /// Default: 100.0 meters
    pub lateral_jitter_meters: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cluster_radius_meters: 50.0,
            min_cluster_size: 3,
            corridor_factor: 1.5,
            exclusion_radius_meters: 100.0,
            dedup_radius_meters: 500.0,
            max_waypoints: MAX_WAYPOINTS,
            path_tolerance_degrees: 0.00001,
            max_join_gap_meters: 30.0,
            min_length_ratio: 0.5,
            max_length_ratio: 2.5,
            reject_unreasonable_length: true,
            lateral_offset_meters: 300.0,
            lateral_jitter_meters: 100.0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
