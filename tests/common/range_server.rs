//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves one static body at every path except `/missing*` (404). Answers HEAD
//! with Content-Length and GET with `Range: bytes=<a>-` as 206 Partial Content.
//! Every request is counted so tests can assert which calls the engine made.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405.
    pub head_allowed: bool,
    /// If false, HEAD omits Content-Length.
    pub head_length: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// Announce the full length but close the connection after this many body bytes.
    pub truncate_after: Option<usize>,
    /// If false, GET omits Content-Length and ends the body by closing the connection.
    pub get_length: bool,
    /// If true, a ranged GET is answered with 206 covering the whole body from byte 0.
    pub range_from_zero: bool,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            head_length: true,
            support_ranges: true,
            truncate_after: None,
            get_length: true,
            range_from_zero: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestLog {
    heads: AtomicUsize,
    gets: AtomicUsize,
    ranges: Mutex<Vec<Option<String>>>,
}

pub struct RangeServer {
    base: String,
    log: Arc<RequestLog>,
}

impl RangeServer {
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base, name)
    }

    pub fn heads(&self) -> usize {
        self.log.heads.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.log.gets.load(Ordering::SeqCst)
    }

    /// `Range` header of each GET, in arrival order.
    pub fn ranges(&self) -> Vec<Option<String>> {
        self.log.ranges.lock().unwrap().clone()
    }
}

pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let log = Arc::new(RequestLog::default());
    let server_log = Arc::clone(&log);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&server_log);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}/", port),
        log,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, log: &RequestLog) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(request) = read_head(&mut stream) else {
        return;
    };
    let (method, path, range) = parse_request(&request);
    let total = body.len() as u64;

    if method.eq_ignore_ascii_case("HEAD") {
        log.heads.fetch_add(1, Ordering::SeqCst);
        let response = if !opts.head_allowed {
            "HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string()
        } else if path.starts_with("/missing") {
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
        } else if opts.head_length {
            format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
                total
            )
        } else {
            "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n".to_string()
        };
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    log.gets.fetch_add(1, Ordering::SeqCst);
    log.ranges
        .lock()
        .unwrap()
        .push(range.map(|start| format!("bytes={}-", start)));

    if path.starts_with("/missing") {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let (status, content_range, slice) = match range {
        Some(_) if opts.support_ranges && opts.range_from_zero => (
            "206 Partial Content",
            Some(format!("bytes 0-{}/{}", total.saturating_sub(1), total)),
            body,
        ),
        Some(start) if opts.support_ranges => {
            if start >= total {
                (
                    "416 Range Not Satisfiable",
                    Some(format!("bytes */{}", total)),
                    &body[0..0],
                )
            } else {
                (
                    "206 Partial Content",
                    Some(format!("bytes {}-{}/{}", start, total - 1, total)),
                    &body[start as usize..],
                )
            }
        }
        _ => ("200 OK", None, body),
    };

    let content_range = content_range
        .map(|v| format!("Content-Range: {}\r\n", v))
        .unwrap_or_default();
    let content_length = if opts.get_length {
        format!("Content-Length: {}\r\n", slice.len())
    } else {
        String::new()
    };
    let response = format!(
        "HTTP/1.1 {}\r\n{}{}Connection: close\r\n\r\n",
        status, content_length, content_range
    );
    let _ = stream.write_all(response.as_bytes());
    let sent = match opts.truncate_after {
        Some(limit) => &slice[..limit.min(slice.len())],
        None => slice,
    };
    let _ = stream.write_all(sent);
    let _ = stream.flush();
}

/// Accepts connections and never answers them. Returns the base URL.
pub fn start_stalled() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if data.windows(4).any(|w| w == b"\r\n\r\n") {
            return String::from_utf8(data).ok();
        }
    }
}

/// Returns (method, path, start offset of `Range: bytes=<start>-`).
fn parse_request(request: &str) -> (String, String, Option<u64>) {
    let mut lines = request.lines();
    let first = lines.next().unwrap_or("");
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("/").to_string();

    let mut range = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(spec) = value.strip_prefix("bytes=") {
                    if let Some((start, _)) = spec.split_once('-') {
                        range = start.trim().parse::<u64>().ok();
                    }
                }
            }
        }
    }
    (method, path, range)
}
