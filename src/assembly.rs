//! Route assembly: stitch `[start, ...waypoints, end]` into one path.
//!
//! One provider call per consecutive pair. Vertices whose 6-decimal
//! coordinate key was already emitted are skipped, which removes the
//! duplicate vertex at every segment join. A failed segment degrades to its
//! two endpoints so the path stays connected, and assembly moves on.

use std::collections::HashSet;

use futures::future::join_all;
use log::{debug, info, warn};

use crate::geo_utils::{coord_key, CoordKey};
use crate::routing::SegmentRouter;
use crate::{GpsPoint, Result, Segment};

/// Accumulates segment geometry with cross-segment vertex dedup.
#[derive(Debug, Default)]
pub(crate) struct PathBuilder {
    path: Vec<GpsPoint>,
    visited: HashSet<CoordKey>,
    failed_segments: usize,
}

impl PathBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append routed geometry, skipping already-emitted vertices.
    pub(crate) fn push_routed(&mut self, points: &[GpsPoint]) {
        for point in points {
            if self.visited.insert(coord_key(point)) {
                self.path.push(*point);
            }
        }
    }

    /// Append a segment's endpoints after a provider failure.
    ///
    /// Endpoints are always present afterwards; only an immediate repeat of
    /// the last emitted vertex is suppressed.
    pub(crate) fn push_fallback(&mut self, segment: &Segment) {
        self.failed_segments += 1;
        for point in [segment.from, segment.to] {
            let key = coord_key(&point);
            let repeats_last = self.path.last().map(coord_key) == Some(key);
            if !repeats_last {
                self.path.push(point);
            }
            self.visited.insert(key);
        }
    }

    /// Apply one segment outcome in path order.
    pub(crate) fn push_outcome(&mut self, index: usize, segment: &Segment, outcome: Result<Vec<GpsPoint>>) {
        match outcome {
            Ok(points) if !points.is_empty() => {
                debug!("Segment {} -> {}: {} points", index, index + 1, points.len());
                self.push_routed(&points);
            }
            Ok(_) => {
                warn!("Segment {} -> {} returned no points, using straight line", index, index + 1);
                self.push_fallback(segment);
            }
            Err(e) => {
                warn!("Segment {} -> {} failed ({}), using straight line", index, index + 1, e);
                self.push_fallback(segment);
            }
        }
    }

    pub(crate) fn failed_segments(&self) -> usize {
        self.failed_segments
    }

    pub(crate) fn finish(self) -> Vec<GpsPoint> {
        self.path
    }
}

fn segments_of(points: &[GpsPoint]) -> Vec<Segment> {
    points.windows(2).map(|w| Segment::new(w[0], w[1])).collect()
}

/// Route every consecutive pair of `points` in order and stitch the results.
///
/// Segments are awaited one after another: each segment's dedup depends on
/// the vertices emitted before it. With fewer than two points the input is
/// returned unchanged.
///
/// # Example
/// ```
/// # futures::executor::block_on(async {
/// use waypoint_router::{GpsPoint, StraightLineRouter, assemble_route};
///
/// let points = vec![
///     GpsPoint::new(37.500, 127.000),
///     GpsPoint::new(37.505, 127.005),
///     GpsPoint::new(37.510, 127.010),
/// ];
/// let path = assemble_route(&StraightLineRouter, &points).await;
/// assert_eq!(path, points); // shared join vertex emitted once
/// # });
/// ```
pub async fn assemble_route<R: SegmentRouter + ?Sized>(router: &R, points: &[GpsPoint]) -> Vec<GpsPoint> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let segments = segments_of(points);
    let mut builder = PathBuilder::new();

    for (index, segment) in segments.iter().enumerate() {
        let outcome = router.route_segment(*segment).await;
        builder.push_outcome(index, segment, outcome);
    }

    log_summary(segments.len(), &builder);
    builder.finish()
}

/// Like [`assemble_route`] but issues all provider calls at once.
///
/// Dedup runs afterwards over the in-order results, so the output matches
/// [`assemble_route`] for any router whose answers do not depend on call order.
pub async fn assemble_route_concurrent<R: SegmentRouter + ?Sized>(router: &R, points: &[GpsPoint]) -> Vec<GpsPoint> {
    if points.len() < 2 {
        return points.to_vec();
    }

    let segments = segments_of(points);
    let outcomes = join_all(segments.iter().map(|s| router.route_segment(*s))).await;

    let mut builder = PathBuilder::new();
    for (index, (segment, outcome)) in segments.iter().zip(outcomes).enumerate() {
        builder.push_outcome(index, segment, outcome);
    }

    log_summary(segments.len(), &builder);
    builder.finish()
}

fn log_summary(segment_count: usize, builder: &PathBuilder) {
    info!(
        "Assembled {} segments into {} points ({} degraded to straight lines)",
        segment_count,
        builder.path.len(),
        builder.failed_segments()
    );
}
