//! Request-level planning: markers → clusters → waypoint → validated path.

use async_trait::async_trait;
use log::{info, warn};
use rand::Rng;

use crate::assembly::assemble_route;
use crate::canonical::clean_path;
use crate::clustering::cluster_markers;
use crate::routing::SegmentRouter;
use crate::validation::{validate_route, RouteOutcome};
use crate::waypoints::{lateral_offset_waypoint, order_along_corridor, select_waypoints};
use crate::{GpsPoint, Marker, PlanRequest, PlannerConfig, PlanningResult, Result, Waypoint};

/// Source of quality markers.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// All markers of quality "good".
    async fn good_markers(&self) -> Result<Vec<Marker>>;
}

#[async_trait]
impl MarkerStore for Vec<Marker> {
    async fn good_markers(&self) -> Result<Vec<Marker>> {
        Ok(self.iter().filter(|m| m.is_good()).copied().collect())
    }
}

#[async_trait]
impl<S: MarkerStore + ?Sized> MarkerStore for &S {
    async fn good_markers(&self) -> Result<Vec<Marker>> {
        (**self).good_markers().await
    }
}

/// Plans pedestrian routes through dense marker clusters.
///
/// Holds no per-request state; one planner can serve concurrent requests.
///
/// # Example
/// ```
/// # futures::executor::block_on(async {
/// use waypoint_router::{GpsPoint, Marker, MarkerQuality, PlanRequest, PlannerConfig};
/// use waypoint_router::{RoutePlanner, StraightLineRouter};
///
/// let markers = vec![
///     Marker::new(37.5050, 127.0050, MarkerQuality::Good),
///     Marker::new(37.5051, 127.0050, MarkerQuality::Good),
///     Marker::new(37.5050, 127.0051, MarkerQuality::Good),
/// ];
/// let planner = RoutePlanner::new(markers, StraightLineRouter, PlannerConfig::default());
///
/// let request = PlanRequest::new(GpsPoint::new(37.50, 127.00), GpsPoint::new(37.51, 127.01));
/// let result = planner.plan_route(&request).await.unwrap();
/// assert_eq!(result.path.len(), 3);
/// assert!(result.used_waypoint.is_some());
/// # });
/// ```
pub struct RoutePlanner<S, R> {
    store: S,
    router: R,
    config: PlannerConfig,
}

impl<S: MarkerStore, R: SegmentRouter> RoutePlanner<S, R> {
    pub fn new(store: S, router: R, config: PlannerConfig) -> Self {
        Self { store, router, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Clusters of the store's good markers. A store failure counts as no markers.
    async fn load_clusters(&self) -> Vec<crate::Cluster> {
        let markers = match self.store.good_markers().await {
            Ok(markers) => markers,
            Err(e) => {
                warn!("Marker store unavailable ({}), planning without markers", e);
                Vec::new()
            }
        };
        cluster_markers(&markers, self.config.cluster_radius_meters, self.config.min_cluster_size)
    }

    async fn candidates(&self, start: &GpsPoint, end: &GpsPoint, exclude: &[GpsPoint]) -> Vec<Waypoint> {
        let clusters = self.load_clusters().await;
        select_waypoints(start, end, &clusters, exclude, &self.config)
    }

    fn finish(&self, path: Vec<GpsPoint>, used_waypoint: Option<GpsPoint>) -> PlanningResult {
        PlanningResult {
            path: clean_path(&path, self.config.path_tolerance_degrees),
            used_waypoint,
        }
    }

    /// Plan start→end.
    ///
    /// With stopovers the route visits them in order and no cluster waypoint
    /// is added. Otherwise the densest corridor cluster is tried as a single
    /// waypoint and kept only if [`validate_route`] accepts it.
    ///
    /// Only invalid input is an error; provider failures degrade the path.
    pub async fn plan_route(&self, request: &PlanRequest) -> Result<PlanningResult> {
        let (start, end) = request.endpoints()?;

        if !request.stopovers.is_empty() {
            let mut points = Vec::with_capacity(request.stopovers.len() + 2);
            points.push(start);
            points.extend_from_slice(&request.stopovers);
            points.push(end);

            info!("Routing through {} stopovers", request.stopovers.len());
            let path = assemble_route(&self.router, &points).await;
            return Ok(self.finish(path, None));
        }

        let candidates = self.candidates(&start, &end, &request.exclude_waypoints).await;
        let best = candidates.first().map(|w| w.point);
        if best.is_none() {
            info!("No waypoint candidates, routing directly");
        }

        let validated = validate_route(&self.router, &start, &end, best.as_ref(), &self.config).await;
        Ok(self.finish(validated.path, validated.used_waypoint))
    }

    /// Plan start→end through every selected cluster waypoint.
    ///
    /// Waypoints are visited in corridor order. `used_waypoint` reports the
    /// densest of them. No geometric validation is applied.
    pub async fn plan_via_clusters(&self, request: &PlanRequest) -> Result<PlanningResult> {
        let (start, end) = request.endpoints()?;

        let candidates = self.candidates(&start, &end, &request.exclude_waypoints).await;
        let densest = candidates.first().map(|w| w.point);
        let ordered = order_along_corridor(&start, &end, &candidates);

        let mut points = Vec::with_capacity(ordered.len() + 2);
        points.push(start);
        points.extend(ordered.iter().map(|w| w.point));
        points.push(end);

        info!("Routing via {} cluster waypoints", ordered.len());
        let path = assemble_route(&self.router, &points).await;
        Ok(self.finish(path, densest))
    }

    /// Plan the return leg end→start of a round trip.
    ///
    /// `previous` is the waypoint the outbound leg used; it is excluded so the
    /// return takes a different way. When no cluster is left a lateral
    /// waypoint beside the midpoint is generated with `rng`. This also applies
    /// when there are no markers at all, so the return leg detours even then;
    /// use [`RoutePlanner::plan_route`] with swapped endpoints for a plain
    /// direct return.
    pub async fn plan_reverse_route<G: Rng + ?Sized + Send>(
        &self,
        request: &PlanRequest,
        previous: Option<GpsPoint>,
        rng: &mut G,
    ) -> Result<PlanningResult> {
        let (start, end) = request.endpoints()?;

        if !request.stopovers.is_empty() {
            let mut points = Vec::with_capacity(request.stopovers.len() + 2);
            points.push(end);
            points.extend(request.stopovers.iter().rev().copied());
            points.push(start);

            let path = assemble_route(&self.router, &points).await;
            return Ok(self.finish(path, None));
        }

        let mut exclude = request.exclude_waypoints.clone();
        exclude.extend(previous);

        let candidates = self.candidates(&end, &start, &exclude).await;
        let waypoint = match candidates.first() {
            Some(w) => w.point,
            None => {
                let generated = lateral_offset_waypoint(
                    &end,
                    &start,
                    self.config.lateral_offset_meters,
                    self.config.lateral_jitter_meters,
                    rng,
                );
                info!(
                    "No cluster for return leg, trying lateral waypoint ({:.6}, {:.6})",
                    generated.latitude, generated.longitude
                );
                generated
            }
        };

        let validated = validate_route(&self.router, &end, &start, Some(&waypoint), &self.config).await;
        if let RouteOutcome::Fallback(reason) = validated.outcome {
            warn!("Return leg falls back to direct route: {:?}", reason);
        }
        Ok(self.finish(validated.path, validated.used_waypoint))
    }
}
