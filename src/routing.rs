//! Segment routing seam.
//!
//! The planner never talks to a routing provider directly; it issues one
//! [`SegmentRouter::route_segment`] call per start→end pair. The call is the
//! only network round-trip in a planning request, so it is the only
//! suspension point. Dropping the planning future cancels it.

use async_trait::async_trait;

use crate::{GpsPoint, Result, Segment};

/// A pedestrian routing provider able to route exactly one segment.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use waypoint_router::{GpsPoint, Result, Segment, SegmentRouter};
///
/// struct Midpoint;
///
/// #[async_trait]
/// impl SegmentRouter for Midpoint {
///     async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>> {
///         let mid = GpsPoint::new(
///             (segment.from.latitude + segment.to.latitude) / 2.0,
///             (segment.from.longitude + segment.to.longitude) / 2.0,
///         );
///         Ok(vec![segment.from, mid, segment.to])
///     }
/// }
/// ```
#[async_trait]
pub trait SegmentRouter: Send + Sync {
    /// Route one segment, returning its ordered geometry.
    ///
    /// Implementations return an upstream error variant
    /// ([`crate::RouteError::is_upstream`]) when the provider fails, times out
    /// or answers without usable geometry.
    async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>>;
}

#[async_trait]
impl<R: SegmentRouter + ?Sized> SegmentRouter for &R {
    async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>> {
        (**self).route_segment(segment).await
    }
}

#[async_trait]
impl<R: SegmentRouter + ?Sized> SegmentRouter for Box<R> {
    async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>> {
        (**self).route_segment(segment).await
    }
}

/// Offline router that connects every segment with a straight line.
///
/// Useful without provider credentials and as the reference for what a
/// fully degraded route looks like.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineRouter;

#[async_trait]
impl SegmentRouter for StraightLineRouter {
    async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>> {
        Ok(segment.straight_line())
    }
}
