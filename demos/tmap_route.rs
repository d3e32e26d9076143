//! Route one request against the live TMAP pedestrian API.
//!
//! Run with: TMAP_APP_KEY=... cargo run --example tmap_route --features http

use std::time::Instant;

use waypoint_router::{
    geo_utils, GpsPoint, Marker, MarkerQuality, PlanRequest, PlannerConfig, RoutePlanner, TmapClient, TmapConfig,
};

#[tokio::main]
async fn main() {
    let app_key = match std::env::var("TMAP_APP_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("Set TMAP_APP_KEY to run this example");
            std::process::exit(1);
        }
    };

    let client = match TmapClient::new(TmapConfig::with_app_key(app_key)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            std::process::exit(1);
        }
    };

    let markers = vec![
        Marker::new(37.5665, 126.9850, MarkerQuality::Good),
        Marker::new(37.5666, 126.9851, MarkerQuality::Good),
        Marker::new(37.5664, 126.9852, MarkerQuality::Good),
    ];

    let planner = RoutePlanner::new(markers, client, PlannerConfig::default());
    let request = PlanRequest::new(GpsPoint::new(37.5651, 126.9783), GpsPoint::new(37.5700, 126.9920));

    let start = Instant::now();
    match planner.plan_route(&request).await {
        Ok(result) => {
            println!("Route: {} points, {:.0}m in {:?}", result.path.len(), geo_utils::polyline_length(&result.path), start.elapsed());
            match result.used_waypoint {
                Some(wp) => println!("Waypoint: ({:.6}, {:.6})", wp.latitude, wp.longitude),
                None => println!("Waypoint: none"),
            }
        }
        Err(e) => eprintln!("Planning failed: {}", e),
    }
}
