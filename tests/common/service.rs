//! Mock ArcGIS-style feature service built on wiremock
//!
//! Every mock requires the subscription key both as header and as query
//! parameter, so a request without credentials falls through to a 404.

use super::config::TEST_API_KEY;
use msil_extract::transport::{API_KEY_HEADER, API_KEY_PARAM};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockBuilder, MockServer, Request, Respond, ResponseTemplate};

/// Request path of a layer's query endpoint
pub fn query_path(service: &str, layer: u32) -> String {
    format!("/{service}/MapServer/{layer}/query")
}

fn authenticated(service: &str, layer: u32) -> MockBuilder {
    Mock::given(method("GET"))
        .and(path(query_path(service, layer)))
        .and(header(API_KEY_HEADER, TEST_API_KEY))
        .and(query_param(API_KEY_PARAM, TEST_API_KEY))
}

/// Matcher for page requests of a layer at the given offset
pub fn page_request(service: &str, layer: u32, offset: u64) -> MockBuilder {
    authenticated(service, layer)
        .and(query_param("f", "geojson"))
        .and(query_param("resultOffset", offset.to_string()))
}

/// Matcher for count-only requests of a layer
pub fn count_request(service: &str, layer: u32) -> MockBuilder {
    authenticated(service, layer)
        .and(query_param("f", "json"))
        .and(query_param("returnCountOnly", "true"))
}

/// A point feature whose `id` property identifies it
pub fn feature(id: u64) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [130.0 + (id as f64) * 0.0001, 30.0]
        },
        "properties": {"id": id}
    })
}

/// A GeoJSON page of `len` features with ids starting at `first_id`
pub fn page_body(first_id: u64, len: u64) -> Value {
    let features: Vec<Value> = (first_id..first_id + len).map(feature).collect();
    json!({"type": "FeatureCollection", "features": features})
}

/// Mount the count endpoint of a layer
pub async fn mount_count(server: &MockServer, service: &str, layer: u32, count: u64) {
    count_request(service, layer)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": count})))
        .mount(server)
        .await;
}

/// Mount one page response per entry of `sizes`, at consecutive offsets
///
/// Feature ids run continuously across pages, so the accumulated collection
/// of a correct page loop is `0..sizes.sum()` in order.
pub async fn mount_pages(
    server: &MockServer,
    service: &str,
    layer: u32,
    page_size: u32,
    sizes: &[u64],
) {
    let mut first_id = 0;
    for (index, &len) in sizes.iter().enumerate() {
        let offset = index as u64 * u64::from(page_size);
        page_request(service, layer, offset)
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(first_id, len)))
            .expect(1)
            .mount(server)
            .await;
        first_id += len;
    }
}

/// Mount count and pages for a layer whose features all fit the given page sizes
pub async fn mount_layer(
    server: &MockServer,
    service: &str,
    layer: u32,
    page_size: u32,
    count: u64,
    sizes: &[u64],
) {
    mount_count(server, service, layer, count).await;
    mount_pages(server, service, layer, page_size, sizes).await;
}

/// Requests received so far on one layer's query endpoint
pub async fn requests_to(server: &MockServer, service: &str, layer: u32) -> Vec<Request> {
    let target = query_path(service, layer);
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == target)
        .collect()
}

/// Page requests (as opposed to count requests) received on a layer
pub async fn page_requests_to(server: &MockServer, service: &str, layer: u32) -> Vec<Request> {
    requests_to(server, service, layer)
        .await
        .into_iter()
        .filter(|r| r.url.query_pairs().any(|(k, v)| k == "f" && v == "geojson"))
        .collect()
}

/// Page sizes a correct loop sees for `total` features: full pages, then the remainder
///
/// An exact multiple ends with an empty page.
pub fn page_sizes(total: u64, page_size: u32) -> Vec<u64> {
    let page_size = u64::from(page_size);
    let mut sizes = vec![page_size; (total / page_size) as usize];
    sizes.push(total % page_size);
    sizes
}

/// Responder that fails a fixed number of times before serving `body`
///
/// Records the arrival time of every request so tests can check backoff gaps.
pub struct FlakyResponder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    failures: usize,
    status: u16,
    body: Value,
}

impl FlakyResponder {
    /// Fail `failures` times with `status`, then answer 200 with `body`
    pub fn new(failures: usize, status: u16, body: Value) -> (Self, Arc<Mutex<Vec<Instant>>>) {
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        let responder = Self {
            arrivals: Arc::clone(&arrivals),
            failures,
            status,
            body,
        };
        (responder, arrivals)
    }
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let mut arrivals = self.arrivals.lock().unwrap();
        arrivals.push(Instant::now());
        if arrivals.len() <= self.failures {
            ResponseTemplate::new(self.status).set_body_string("busy")
        } else {
            ResponseTemplate::new(200).set_body_json(self.body.clone())
        }
    }
}

/// Raw TCP server that announces a JSON body and closes the connection early
///
/// Returns the base URI and a counter of accepted connections.
pub async fn spawn_truncating_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            Content-Type: application/json\r\n\
                            Content-Length: 1000\r\n\r\n\
                            {\"type\":\"FeatureCollection\",\"features\":[";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), connections)
}
