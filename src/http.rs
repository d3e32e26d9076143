//! TMAP pedestrian routing client.
//!
//! One POST per segment with:
//! - Connection pooling (one `reqwest::Client` per `TmapClient`)
//! - Automatic retry with exponential backoff on 429
//! - Tolerant geometry parsing (malformed coordinates are skipped)

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routing::SegmentRouter;
use crate::{GpsPoint, Result, RouteError, Segment};

pub const DEFAULT_ENDPOINT: &str = "https://apis.openapi.sk.com/tmap/routes/pedestrian";

const COORD_TYPE: &str = "WGS84GEO";

/// Connection settings for [`TmapClient`].
#[derive(Debug, Clone)]
pub struct TmapConfig {
    /// Value of the `appKey` header.
    pub app_key: String,

    /// Default: [`DEFAULT_ENDPOINT`]
    pub endpoint: String,

    /// TMAP `searchOption` ("10" = recommended + shortest mix).
    /// Default: "10"
    pub search_option: String,

    /// Whole-request timeout.
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Retries after a 429 before giving up.
    /// Default: 3
    pub max_retries: u32,

    /// Base delay before retrying a 429; doubles per attempt, capped at 8×.
    /// Default: 500 ms
    pub retry_backoff: Duration,
}

impl Default for TmapConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            search_option: "10".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl TmapConfig {
    pub fn with_app_key(app_key: impl Into<String>) -> Self {
        Self { app_key: app_key.into(), ..Default::default() }
    }
}

/// Request body. TMAP expects coordinates as strings, x = longitude.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PedestrianRequest<'a> {
    start_x: String,
    start_y: String,
    end_x: String,
    end_y: String,
    start_name: &'a str,
    end_name: &'a str,
    req_coord_type: &'a str,
    res_coord_type: &'a str,
    search_option: &'a str,
}

impl<'a> PedestrianRequest<'a> {
    fn new(segment: &Segment, search_option: &'a str) -> Self {
        Self {
            start_x: segment.from.longitude.to_string(),
            start_y: segment.from.latitude.to_string(),
            end_x: segment.to.longitude.to_string(),
            end_y: segment.to.latitude.to_string(),
            start_name: "start",
            end_name: "end",
            req_coord_type: COORD_TYPE,
            res_coord_type: COORD_TYPE,
            search_option,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PedestrianResponse {
    features: Option<Vec<Feature>>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Option<Value>,
}

/// `[lng, lat]` → point; anything else is skipped.
fn parse_coordinate(value: &Value) -> Option<GpsPoint> {
    let pair = value.as_array()?;
    let lng = pair.first()?.as_f64()?;
    let lat = pair.get(1)?.as_f64()?;
    Some(GpsPoint::new(lat, lng))
}

/// Flatten a TMAP feature collection into a path.
///
/// `LineString` features contribute all their coordinates and `Point`
/// features their single coordinate, in feature order.
fn parse_features(body: &[u8]) -> Result<Vec<GpsPoint>> {
    let response: PedestrianResponse = serde_json::from_slice(body)
        .map_err(|e| RouteError::Upstream(format!("JSON parse error: {}", e)))?;

    let features = response
        .features
        .ok_or_else(|| RouteError::Upstream("response has no features".to_string()))?;

    let mut path = Vec::new();
    for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
        let Some(coordinates) = geometry.coordinates.as_ref() else {
            continue;
        };
        match geometry.kind.as_str() {
            "LineString" => {
                if let Some(coords) = coordinates.as_array() {
                    path.extend(coords.iter().filter_map(parse_coordinate));
                }
            }
            "Point" => path.extend(parse_coordinate(coordinates)),
            _ => {}
        }
    }

    if path.is_empty() {
        return Err(RouteError::NoGeometry);
    }
    Ok(path)
}

fn backoff(base: Duration, attempt: u32) -> Duration {
    base * (1 << attempt.min(3))
}

/// [`SegmentRouter`] backed by the TMAP pedestrian API.
pub struct TmapClient {
    client: Client,
    config: TmapConfig,
}

impl TmapClient {
    pub fn new(config: TmapConfig) -> Result<Self> {
        if config.app_key.is_empty() {
            return Err(RouteError::InvalidInput("TMAP app key is empty".to_string()));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(config.timeout)
            .build()
            .map_err(|e| RouteError::Upstream(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TmapConfig {
        &self.config
    }

    async fn request_segment(&self, segment: &Segment) -> Result<Vec<GpsPoint>> {
        let body = PedestrianRequest::new(segment, &self.config.search_option);
        let req_start = Instant::now();
        let mut retries = 0;

        loop {
            let response = self
                .client
                .post(&self.config.endpoint)
                .header("appKey", &self.config.app_key)
                .json(&body)
                .send()
                .await
                .map_err(map_transport_error)?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > self.config.max_retries {
                    return Err(RouteError::Status(status.as_u16()));
                }
                let wait = backoff(self.config.retry_backoff, retries);
                warn!("[TMAP] 429 Too Many Requests, retry {} with {:?} backoff", retries, wait);
                tokio::time::sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                return Err(RouteError::Status(status.as_u16()));
            }

            let bytes = response.bytes().await.map_err(map_transport_error)?;
            let path = parse_features(&bytes)?;

            debug!(
                "[TMAP] {} points in {:?} ({} bytes)",
                path.len(),
                req_start.elapsed(),
                bytes.len()
            );
            return Ok(path);
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> RouteError {
    if e.is_timeout() {
        RouteError::Timeout
    } else {
        RouteError::Upstream(e.to_string())
    }
}

#[async_trait]
impl SegmentRouter for TmapClient {
    async fn route_segment(&self, segment: Segment) -> Result<Vec<GpsPoint>> {
        self.request_segment(&segment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const FEATURES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":{"type":"Point","coordinates":[127.0,37.5]}},
        {"type":"Feature","geometry":{"type":"LineString","coordinates":[[127.0,37.5],[127.005,37.505],[127.01,37.51]]}}
    ]}"#;

    enum Reply {
        Respond(&'static str, &'static str),
        Silent,
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Read one request (headers plus Content-Length body) and return it lowercased.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= pos + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_ascii_lowercase()
    }

    /// Local server answering connections with `replies` in order; the last
    /// reply repeats. Returns the endpoint and the captured requests.
    async fn serve(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/tmap/routes/pedestrian", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        tokio::spawn(async move {
            let mut index = 0;
            loop {
                let (mut stream, _) = listener.accept().await.unwrap();
                let reply = &replies[index.min(replies.len() - 1)];
                index += 1;

                let request = read_request(&mut stream).await;
                captured.lock().unwrap().push(request);

                match reply {
                    Reply::Respond(status, body) => {
                        stream.write_all(http_response(status, body).as_bytes()).await.unwrap();
                        stream.shutdown().await.ok();
                    }
                    Reply::Silent => {
                        tokio::spawn(async move {
                            tokio::time::sleep(Duration::from_secs(30)).await;
                            drop(stream);
                        });
                    }
                }
            }
        });

        (endpoint, requests)
    }

    fn local_client(endpoint: String, max_retries: u32) -> TmapClient {
        let config = TmapConfig {
            endpoint,
            max_retries,
            retry_backoff: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            ..TmapConfig::with_app_key("test-key")
        };
        TmapClient::new(config).unwrap()
    }

    fn segment() -> Segment {
        Segment::new(GpsPoint::new(37.5, 127.0), GpsPoint::new(37.51, 127.01))
    }

    #[tokio::test]
    async fn test_retries_after_429_then_parses_body() {
        let (endpoint, requests) = serve(vec![
            Reply::Respond("429 Too Many Requests", "{}"),
            Reply::Respond("200 OK", FEATURES),
        ])
        .await;
        let client = local_client(endpoint, 3);

        let path = client.route_segment(segment()).await.unwrap();
        assert_eq!(
            path,
            vec![
                GpsPoint::new(37.5, 127.0),
                GpsPoint::new(37.5, 127.0),
                GpsPoint::new(37.505, 127.005),
                GpsPoint::new(37.51, 127.01),
            ]
        );

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("post /tmap/routes/pedestrian"));
        assert!(requests[0].contains("appkey: test-key"));
        assert!(requests[0].contains("\"startx\":\"127\""));
        assert!(requests[0].contains("\"rescoordtype\":\"wgs84geo\""));
    }

    #[tokio::test]
    async fn test_429_beyond_max_retries_is_status_error() {
        let (endpoint, requests) = serve(vec![Reply::Respond("429 Too Many Requests", "{}")]).await;
        let client = local_client(endpoint, 0);

        let err = client.route_segment(segment()).await.unwrap_err();
        assert_eq!(err, RouteError::Status(429));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let (endpoint, _) = serve(vec![Reply::Respond("500 Internal Server Error", "oops")]).await;
        let client = local_client(endpoint, 3);

        let err = client.route_segment(segment()).await.unwrap_err();
        assert_eq!(err, RouteError::Status(500));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_unanswered_request_times_out() {
        let (endpoint, _) = serve(vec![Reply::Silent]).await;
        let config = TmapConfig {
            endpoint,
            timeout: Duration::from_millis(200),
            ..TmapConfig::with_app_key("test-key")
        };
        let client = TmapClient::new(config).unwrap();

        let err = client.route_segment(segment()).await.unwrap_err();
        assert_eq!(err, RouteError::Timeout);
    }

    #[tokio::test]
    async fn test_ok_without_geometry_is_no_geometry() {
        let (endpoint, _) = serve(vec![Reply::Respond("200 OK", r#"{"features":[]}"#)]).await;
        let client = local_client(endpoint, 3);
        assert_eq!(client.route_segment(segment()).await.unwrap_err(), RouteError::NoGeometry);
    }

    #[test]
    fn test_request_body_uses_string_coordinates() {
        let segment = Segment::new(GpsPoint::new(37.5665, 126.978), GpsPoint::new(37.57, 126.98));
        let body = serde_json::to_value(PedestrianRequest::new(&segment, "10")).unwrap();

        assert_eq!(body["startX"], "126.978");
        assert_eq!(body["startY"], "37.5665");
        assert_eq!(body["endX"], "126.98");
        assert_eq!(body["endY"], "37.57");
        assert_eq!(body["reqCoordType"], "WGS84GEO");
        assert_eq!(body["resCoordType"], "WGS84GEO");
        assert_eq!(body["searchOption"], "10");
    }

    #[test]
    fn test_parse_linestring_and_point() {
        let body = br#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [127.0, 37.5]}},
                {"type": "Feature", "geometry": {"type": "LineString",
                    "coordinates": [[127.0, 37.5], [127.001, 37.501], [127.002, 37.502]]}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [127.002, 37.502]}}
            ]
        }"#;

        let path = parse_features(body).unwrap();
        assert_eq!(path.len(), 5);
        assert_eq!(path[0], GpsPoint::new(37.5, 127.0));
        assert_eq!(path[3], GpsPoint::new(37.502, 127.002));
    }

    #[test]
    fn test_parse_skips_malformed_coordinates() {
        let body = br#"{"features": [
            {"geometry": {"type": "LineString", "coordinates": [[127.0, 37.5], ["x", 37.6], [127.1]]}},
            {"geometry": {"type": "Polygon", "coordinates": [[[127.0, 37.5]]]}},
            {"geometry": {"type": "Point"}},
            {"properties": {}}
        ]}"#;

        let path = parse_features(body).unwrap();
        assert_eq!(path, vec![GpsPoint::new(37.5, 127.0)]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_features(br#"{"features": []}"#), Err(RouteError::NoGeometry));
        assert!(matches!(parse_features(br#"{"error": {}}"#), Err(RouteError::Upstream(_))));
        assert!(matches!(parse_features(b"<html>"), Err(RouteError::Upstream(_))));
    }

    #[test]
    fn test_backoff_schedule() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff(base, 1), Duration::from_secs(1));
        assert_eq!(backoff(base, 2), Duration::from_secs(2));
        assert_eq!(backoff(base, 3), Duration::from_secs(4));
        assert_eq!(backoff(base, 7), Duration::from_secs(4));
    }

    #[test]
    fn test_config_defaults() {
        let config = TmapConfig::with_app_key("key");
        assert_eq!(config.app_key, "key");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.search_option, "10");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_empty_app_key_rejected() {
        assert!(matches!(
            TmapClient::new(TmapConfig::default()),
            Err(RouteError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_error() {
        let config = TmapConfig {
            endpoint: "http://127.0.0.1:1/tmap".to_string(),
            timeout: Duration::from_secs(2),
            ..TmapConfig::with_app_key("key")
        };
        let client = TmapClient::new(config).unwrap();
        let segment = Segment::new(GpsPoint::new(37.5, 127.0), GpsPoint::new(37.51, 127.01));
        let err = client.route_segment(segment).await.unwrap_err();
        assert!(err.is_upstream());
    }
}
