use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::Value;

/// One page served by the `/search` stub. `more` controls whether the page
/// carries a continuation token.
#[derive(Debug, Clone)]
pub struct StubPage {
    pub ids: Vec<&'static str>,
    pub more: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StubConfig {
    pub pages: Vec<StubPage>,
    pub videos: Vec<Value>,
    pub channels: Vec<Value>,
    /// When set, `/search` answers with this status and a Data-API-shaped
    /// error body instead of results.
    pub search_error: Option<(u16, String)>,
}

/// In-process stand-in for the three YouTube Data API endpoints the pipeline
/// talks to. Records which video IDs reach the detail endpoint so tests can
/// assert on the dedup behavior.
pub struct YoutubeStub {
    pub base_url: String,
    search_requests: Arc<Mutex<usize>>,
    video_requests: Arc<Mutex<Vec<Vec<String>>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl YoutubeStub {
    pub fn spawn(config: StubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start youtube stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let search_requests = Arc::new(Mutex::new(0));
        let video_requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let search_counter = Arc::clone(&search_requests);
        let video_log = Arc::clone(&video_requests);

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let path = url.split('?').next().unwrap_or(&url);

                let (status, body) = match path {
                    "/search" => {
                        *search_counter.lock().expect("lock search counter") += 1;
                        match &config.search_error {
                            Some((code, message)) => (
                                *code,
                                serde_json::json!({
                                    "error": { "code": code, "message": message }
                                }),
                            ),
                            None => (200, search_body(&config.pages, &url)),
                        }
                    }
                    "/videos" => {
                        let ids = id_param(&url);
                        video_log
                            .lock()
                            .expect("lock video request log")
                            .push(ids.clone());
                        (200, filtered_items(&config.videos, &ids))
                    }
                    "/channels" => (200, filtered_items(&config.channels, &id_param(&url))),
                    _ => (
                        404,
                        serde_json::json!({ "error": { "code": 404, "message": "not found" } }),
                    ),
                };

                let mut response =
                    tiny_http::Response::from_string(body.to_string()).with_status_code(status);
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                response = response.with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            search_requests,
            video_requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    #[allow(dead_code)]
    pub fn search_request_count(&self) -> usize {
        *self.search_requests.lock().expect("lock search counter")
    }

    /// The ID batches received by `/videos`, one entry per request.
    #[allow(dead_code)]
    pub fn video_id_batches(&self) -> Vec<Vec<String>> {
        self.video_requests
            .lock()
            .expect("lock video request log")
            .clone()
    }
}

impl Drop for YoutubeStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn search_body(pages: &[StubPage], url: &str) -> Value {
    let index = query_param(url, "pageToken")
        .and_then(|token| token.strip_prefix("page-").map(str::to_owned))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);

    let Some(page) = pages.get(index) else {
        return serde_json::json!({ "items": [] });
    };

    let items: Vec<Value> = page
        .ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": { "kind": "youtube#video", "videoId": id }
            })
        })
        .collect();

    let mut body = serde_json::json!({ "items": items });
    if page.more {
        body["nextPageToken"] = Value::String(format!("page-{}", index + 1));
    }
    body
}

fn filtered_items(resources: &[Value], ids: &[String]) -> Value {
    let items: Vec<Value> = resources
        .iter()
        .filter(|resource| {
            resource
                .get("id")
                .and_then(|v| v.as_str())
                .is_some_and(|id| ids.iter().any(|wanted| wanted == id))
        })
        .cloned()
        .collect();
    serde_json::json!({ "items": items })
}

fn id_param(url: &str) -> Vec<String> {
    query_param(url, "id")
        .map(|joined| joined.split(',').map(str::to_owned).collect())
        .unwrap_or_default()
}

fn query_param(url: &str, key: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    for pair in query.split('&') {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name == key {
            return Some(percent_decode(value));
        }
    }
    None
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    Err(_) => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// A `/videos` resource that passes every default filter: clearly English
/// title, short duration, full statistics.
pub fn video_resource(id: &str, title: &str, duration: &str) -> Value {
    serde_json::json!({
        "id": id,
        "snippet": {
            "title": title,
            "description": "Stub description for an excellent short video",
            "tags": ["stub", "short"],
            "publishedAt": "2026-08-04T15:23:01Z",
            "channelId": "UCstub",
        },
        "statistics": {
            "viewCount": "1000",
            "likeCount": "50",
            "commentCount": "10",
        },
        "contentDetails": {
            "duration": duration,
            "caption": "true",
            "definition": "hd",
        },
        "topicDetails": {
            "topicCategories": ["https://en.wikipedia.org/wiki/Food_(cooking)"],
        },
        "status": { "uploadStatus": "processed" },
    })
}

pub fn channel_resource(id: &str, subscriber_count: &str) -> Value {
    serde_json::json!({
        "id": id,
        "statistics": { "subscriberCount": subscriber_count },
    })
}
