//! Error types for route planning.
//!
//! Only [`RouteError::InvalidInput`] ever reaches a caller of the planner.
//! Every other variant is produced at the provider or marker-store boundary
//! and recovered locally (straight-line segments, direct-route fallback).

use thiserror::Error;

/// Errors raised while planning a route.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Start or end coordinate missing, non-finite or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport-level failure talking to the routing provider.
    #[error("routing provider unavailable: {0}")]
    Upstream(String),

    /// The routing provider answered with a non-success HTTP status.
    #[error("routing provider returned HTTP {0}")]
    Status(u16),

    /// The routing provider did not answer within the configured timeout.
    #[error("routing provider timed out")]
    Timeout,

    /// The provider response contained no usable line or point geometry.
    #[error("routing provider returned no usable geometry")]
    NoGeometry,

    /// The marker store could not be queried.
    #[error("marker store unavailable: {0}")]
    MarkerStore(String),
}

impl RouteError {
    /// True for failures of the routing provider, which are always recoverable
    /// by substituting a straight segment.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RouteError::Upstream(_) | RouteError::Status(_) | RouteError::Timeout | RouteError::NoGeometry
        )
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;
