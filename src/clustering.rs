//! Greedy fixed-radius clustering of good markers.
//!
//! Single pass: each marker joins the first existing cluster that has any
//! member closer than the radius, otherwise it starts a new cluster. The
//! result depends on input order for ambiguous inputs. Marker volumes are
//! small (dozens), so the O(n·c·m) scan needs no spatial index.

use log::{debug, info};

use crate::geo_utils::{compute_center, haversine_distance};
use crate::{Cluster, GpsPoint, Marker};

/// Cluster good markers and return the centroids of clusters that reached
/// `min_cluster_size`, in order of creation.
///
/// Markers that are not [`crate::MarkerQuality::Good`] or carry invalid
/// coordinates are ignored.
///
/// # Example
/// ```
/// use waypoint_router::{Marker, MarkerQuality, cluster_markers};
///
/// let markers = vec![
///     Marker::new(37.50000, 127.00000, MarkerQuality::Good),
///     Marker::new(37.50005, 127.00000, MarkerQuality::Good),
///     Marker::new(37.50000, 127.00005, MarkerQuality::Good),
/// ];
///
/// let clusters = cluster_markers(&markers, 50.0, 3);
/// assert_eq!(clusters.len(), 1);
/// assert_eq!(clusters[0].density, 3);
/// ```
pub fn cluster_markers(markers: &[Marker], radius_meters: f64, min_cluster_size: u32) -> Vec<Cluster> {
    let mut groups: Vec<Vec<GpsPoint>> = Vec::new();

    for marker in markers.iter().filter(|m| m.is_good()) {
        let position = marker.position();
        if !position.is_valid() {
            debug!("Skipping marker with invalid coordinates {:?}", position);
            continue;
        }

        let target = groups.iter().position(|members| {
            members
                .iter()
                .any(|existing| haversine_distance(existing, &position) < radius_meters)
        });

        match target {
            Some(idx) => groups[idx].push(position),
            None => groups.push(vec![position]),
        }
    }

    let clusters: Vec<Cluster> = groups
        .iter()
        .filter(|members| members.len() >= min_cluster_size as usize)
        .map(|members| Cluster {
            centroid: compute_center(members),
            density: members.len() as u32,
        })
        .collect();

    info!(
        "Clustered {} markers into {} groups, {} with >= {} members",
        markers.len(),
        groups.len(),
        clusters.len(),
        min_cluster_size
    );

    clusters
}
