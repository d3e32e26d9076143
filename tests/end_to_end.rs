//! Planning scenarios run through the public API with in-test routers.

use std::collections::HashSet;

use async_trait::async_trait;
use waypoint_router::geo_utils::{coord_key, haversine_distance};
use waypoint_router::{
    is_path_going_backwards, GpsPoint, Marker, MarkerQuality, PlanRequest, PlannerConfig, Result, RouteError,
    RoutePlanner, Segment, SegmentRouter, StraightLineRouter,
};

/// Interpolates `steps` intermediate points per segment, like a provider
/// returning detailed geometry.
struct InterpolatingRouter {
    steps: usize,
}

#[async_trait]
impl SegmentRouter for InterpolatingRouter {
    async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>> {
        let n = self.steps + 1;
        Ok((0..=n)
            .map(|i| {
                if i == n {
                    return segment.to;
                }
                let t = i as f64 / n as f64;
                GpsPoint::new(
                    segment.from.latitude + (segment.to.latitude - segment.from.latitude) * t,
                    segment.from.longitude + (segment.to.longitude - segment.from.longitude) * t,
                )
            })
            .collect())
    }
}

/// Fails every segment that starts at `broken`.
struct FlakyRouter {
    broken: GpsPoint,
}

#[async_trait]
impl SegmentRouter for FlakyRouter {
    async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>> {
        if segment.from == self.broken {
            return Err(RouteError::Status(500));
        }
        InterpolatingRouter { steps: 3 }.route_segment(segment).await
    }
}

fn cluster_at(lat: f64, lng: f64, count: usize) -> Vec<Marker> {
    (0..count)
        .map(|i| Marker::new(lat + i as f64 * 0.00003, lng - i as f64 * 0.00003, MarkerQuality::Good))
        .collect()
}

#[tokio::test]
async fn no_good_markers_returns_direct_route() {
    let start = GpsPoint::new(37.50, 127.00);
    let end = GpsPoint::new(37.51, 127.01);
    let markers = vec![
        Marker::new(37.505, 127.005, MarkerQuality::Other),
        Marker::new(37.505, 127.005, MarkerQuality::Other),
        Marker::new(37.505, 127.005, MarkerQuality::Other),
    ];

    let router = InterpolatingRouter { steps: 4 };
    let expected = router.route_segment(Segment::new(start, end)).await.unwrap();

    let planner = RoutePlanner::new(markers, router, PlannerConfig::default());
    let result = planner.plan_route(&PlanRequest::new(start, end)).await.unwrap();

    assert_eq!(result.path, expected);
    assert!(result.used_waypoint.is_none());
}

#[tokio::test]
async fn failing_segment_keeps_endpoints() {
    let start = GpsPoint::new(37.50, 127.00);
    let stop = GpsPoint::new(37.505, 127.004);
    let end = GpsPoint::new(37.51, 127.01);

    let planner = RoutePlanner::new(Vec::new(), FlakyRouter { broken: stop }, PlannerConfig::default());
    let request = PlanRequest::new(start, end).with_stopovers(vec![stop]);
    let result = planner.plan_route(&request).await.unwrap();

    let i = result.path.iter().position(|p| *p == stop).unwrap();
    assert_eq!(result.path[i + 1], end);
    assert_eq!(result.path.first(), Some(&start));
    assert_eq!(result.path.last(), Some(&end));
}

#[tokio::test]
async fn waypoint_behind_destination_is_rejected() {
    let start = GpsPoint::new(37.50, 127.00);
    let end = GpsPoint::new(37.51, 127.00);
    // Inside the corridor but past the end: the second leg doubles back
    let beyond = GpsPoint::new(37.515, 127.00);

    let to_wp = StraightLineRouter.route_segment(Segment::new(start, beyond)).await.unwrap();
    let from_wp = StraightLineRouter.route_segment(Segment::new(beyond, end)).await.unwrap();
    assert!(is_path_going_backwards(&to_wp, &from_wp, 30.0));

    let planner = RoutePlanner::new(cluster_at(37.515, 127.00, 4), StraightLineRouter, PlannerConfig::default());
    let result = planner.plan_route(&PlanRequest::new(start, end)).await.unwrap();

    assert_eq!(result.path, vec![start, end]);
    assert!(result.used_waypoint.is_none());
}

#[tokio::test]
async fn invalid_requests_fail_before_routing() {
    let planner = RoutePlanner::new(Vec::new(), StraightLineRouter, PlannerConfig::default());

    let empty = PlanRequest::default();
    assert!(matches!(planner.plan_route(&empty).await, Err(RouteError::InvalidInput(_))));

    let bad_stop = PlanRequest::new(GpsPoint::new(37.5, 127.0), GpsPoint::new(37.51, 127.01))
        .with_stopovers(vec![GpsPoint::new(37.5, 200.0)]);
    assert!(matches!(planner.plan_route(&bad_stop).await, Err(RouteError::InvalidInput(_))));
}

#[tokio::test]
async fn via_clusters_path_is_canonical() {
    let start = GpsPoint::new(37.50, 127.00);
    let end = GpsPoint::new(37.54, 127.04);

    let mut markers = Vec::new();
    markers.extend(cluster_at(37.51, 127.01, 3));
    markers.extend(cluster_at(37.52, 127.02, 6));
    markers.extend(cluster_at(37.5225, 127.0225, 3)); // within 500m of the dense one
    markers.extend(cluster_at(37.53, 127.03, 4));

    let config = PlannerConfig::default();
    let tolerance = config.path_tolerance_degrees;
    let planner = RoutePlanner::new(markers, InterpolatingRouter { steps: 20 }, config);
    let result = planner.plan_via_clusters(&PlanRequest::new(start, end)).await.unwrap();

    assert_eq!(result.path.first(), Some(&start));
    assert_eq!(result.path.last(), Some(&end));

    let keys: HashSet<_> = result.path.iter().map(coord_key).collect();
    assert_eq!(keys.len(), result.path.len());

    for w in result.path.windows(2) {
        let d = ((w[0].latitude - w[1].latitude).powi(2) + (w[0].longitude - w[1].longitude).powi(2)).sqrt();
        assert!(d > tolerance);
    }

    // Three separated clusters visited: 4 segments of 22 points, 3 shared joins
    assert_eq!(result.path.len(), 4 * 22 - 3);

    let used = result.used_waypoint.unwrap();
    assert!(haversine_distance(&used, &GpsPoint::new(37.52, 127.02)) < 50.0);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn json_request_to_json_result() {
    let request: PlanRequest = serde_json::from_str(
        r#"{"start": {"lat": 37.50, "lng": 127.00}, "end": {"latitude": 37.51, "longitude": 127.01}}"#,
    )
    .unwrap();

    let planner = RoutePlanner::new(Vec::new(), StraightLineRouter, PlannerConfig::default());
    let result = planner.plan_route(&request).await.unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["path"].as_array().unwrap().len(), 2);
    assert_eq!(json["path"][0]["lat"], 37.5);
    assert!(json.get("usedWaypoint").is_none());
}
