//! Test helpers: CSV fixtures and a tiny blocking HTTP server.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

/// Write `content` to a CSV file inside a fresh temp dir.
pub fn write_csv(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("intents.csv");
    std::fs::write(&path, content).expect("write csv");
    (dir, path)
}

/// What the server saw for one request.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: String,
}

/// Canned reply: status, body, and an optional stall before answering.
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn stall(delay: Duration) -> Self {
        Self {
            status: 200,
            body: "1".to_string(),
            delay: Some(delay),
        }
    }
}

pub struct MockServer {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockServer {
    /// Serve forever on an ephemeral port. Each connection gets its own thread
    /// so a stalled reply does not hold up the next request.
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(&CapturedRequest) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder = Arc::new(responder);

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                let seen = Arc::clone(&seen);
                let responder = Arc::clone(&responder);
                thread::spawn(move || {
                    let _ = handle_client(stream, &seen, responder.as_ref());
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

fn handle_client<F>(
    stream: TcpStream,
    seen: &Mutex<Vec<CapturedRequest>>,
    responder: &F,
) -> std::io::Result<()>
where
    F: Fn(&CapturedRequest) -> Reply + ?Sized,
{
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();

    let mut content_length = 0usize;
    let mut content_type = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "content-type" => content_type = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    let request = CapturedRequest {
        method,
        path,
        content_type,
        body: String::from_utf8_lossy(&body).to_string(),
    };
    seen.lock().expect("lock").push(request.clone());

    let reply = responder(&request);
    if let Some(delay) = reply.delay {
        thread::sleep(delay);
    }

    let response = format!(
        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

/// Intent text of a captured `{"intent": ...}` body.
pub fn intent_of(request: &CapturedRequest) -> String {
    serde_json::from_str::<serde_json::Value>(&request.body)
        .ok()
        .and_then(|v| v.get("intent").and_then(|i| i.as_str()).map(str::to_string))
        .unwrap_or_default()
}
