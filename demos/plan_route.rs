//! Plan a route through marker clusters without network access.
//!
//! Run with: cargo run --example plan_route

use rand::{rngs::StdRng, SeedableRng};
use waypoint_router::{
    geo_utils, GpsPoint, Marker, MarkerQuality, PlanRequest, PlannerConfig, RoutePlanner, StraightLineRouter,
};

fn blob(lat: f64, lng: f64, count: usize) -> Vec<Marker> {
    (0..count)
        .map(|i| Marker::new(lat + i as f64 * 0.00004, lng + i as f64 * 0.00003, MarkerQuality::Good))
        .collect()
}

#[tokio::main]
async fn main() {
    // Gangnam area
    let start = GpsPoint::new(37.4979, 127.0276);
    let end = GpsPoint::new(37.5088, 127.0631);

    let mut markers = Vec::new();
    markers.extend(blob(37.5012, 127.0390, 6)); // dense, near the middle
    markers.extend(blob(37.5050, 127.0520, 4));
    markers.extend(blob(37.5300, 127.1000, 8)); // outside the corridor
    markers.push(Marker::new(37.5030, 127.0450, MarkerQuality::Other));

    let config = PlannerConfig::default();
    println!("Waypoint Router Example\n");
    println!(
        "Config: cluster_radius={}m, min_cluster={}, corridor_factor={}, dedup_radius={}m\n",
        config.cluster_radius_meters, config.min_cluster_size, config.corridor_factor, config.dedup_radius_meters
    );

    let planner = RoutePlanner::new(markers, StraightLineRouter, config);
    let request = PlanRequest::new(start, end);

    let direct = geo_utils::haversine_distance(&start, &end);
    println!("Direct distance: {:.0}m\n", direct);

    match planner.plan_route(&request).await {
        Ok(result) => {
            println!("Single waypoint route:");
            println!("  points: {}", result.path.len());
            println!("  length: {:.0}m", geo_utils::polyline_length(&result.path));
            match result.used_waypoint {
                Some(wp) => println!("  waypoint: ({:.6}, {:.6})", wp.latitude, wp.longitude),
                None => println!("  waypoint: none (direct)"),
            }

            let mut rng = StdRng::seed_from_u64(2024);
            match planner.plan_reverse_route(&request, result.used_waypoint, &mut rng).await {
                Ok(back) => {
                    println!("\nReturn route:");
                    println!("  points: {}", back.path.len());
                    println!("  length: {:.0}m", geo_utils::polyline_length(&back.path));
                    if let Some(wp) = back.used_waypoint {
                        println!("  waypoint: ({:.6}, {:.6})", wp.latitude, wp.longitude);
                    }
                }
                Err(e) => println!("Return route failed: {}", e),
            }
        }
        Err(e) => println!("Planning failed: {}", e),
    }

    match planner.plan_via_clusters(&request).await {
        Ok(result) => {
            println!("\nVia all clusters:");
            for (i, p) in result.path.iter().enumerate() {
                println!("  {}: ({:.6}, {:.6})", i, p.latitude, p.longitude);
            }
        }
        Err(e) => println!("Planning failed: {}", e),
    }
}
