#![allow(dead_code)]

use std::net::SocketAddr;

use craft_gallery::{build_router, AppState, ServerConfig, Store};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const PUBLIC_BASE_URL: &str = "http://gallery.test";

/// Minimal PNG signature; enough for content sniffing.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Store,
    _dir: TempDir,
}

pub async fn boot() -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ServerConfig::new(
        "127.0.0.1:0",
        dir.path().join("gallery.sqlite"),
        dir.path().join("blobs"),
        PUBLIC_BASE_URL,
        8,
    )
    .expect("config");
    let store = Store::open(&config.store).await.expect("open store");
    let app = build_router(AppState::new(store.clone(), config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    TestServer {
        addr,
        store,
        _dir: dir,
    }
}

pub async fn send_raw_with_method(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&[u8]>,
) -> (u16, String, Vec<u8>) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if let Some(body) = body {
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    let mut bytes = req.into_bytes();
    if let Some(body) = body {
        bytes.extend_from_slice(body);
    }
    stream.write_all(&bytes).await.expect("write request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("http response must have separator");
    let head = String::from_utf8_lossy(&response[..split]).to_string();
    let body = response[split + 4..].to_vec();
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head, body)
}

fn parse_json(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).expect("json body")
}

pub async fn get_json(addr: SocketAddr, path: &str) -> (u16, Value) {
    let (status, _, body) = send_raw_with_method(addr, "GET", path, &[], None).await;
    (status, parse_json(&body))
}

pub async fn send_json(addr: SocketAddr, method: &str, path: &str, payload: &Value) -> (u16, Value) {
    send_text(addr, method, path, &payload.to_string()).await
}

/// Sends `body` verbatim with a JSON content type, for malformed-payload cases.
pub async fn send_text(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, Value) {
    let (status, _, body) = send_raw_with_method(
        addr,
        method,
        path,
        &[("Content-Type", "application/json")],
        Some(body.as_bytes()),
    )
    .await;
    (status, parse_json(&body))
}

pub async fn post_json(addr: SocketAddr, path: &str, payload: Value) -> (u16, Value) {
    send_json(addr, "POST", path, &payload).await
}

pub async fn post_multipart(
    addr: SocketAddr,
    path: &str,
    field: &str,
    file_name: &str,
    content: &[u8],
) -> (u16, Value) {
    let boundary = "gallery-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    let content_type = format!("multipart/form-data; boundary={boundary}");
    let (status, _, body) = send_raw_with_method(
        addr,
        "POST",
        path,
        &[("Content-Type", content_type.as_str())],
        Some(&body),
    )
    .await;
    (status, parse_json(&body))
}

pub async fn seed_student(addr: SocketAddr, nis: &str) -> i64 {
    let (status, body) = post_json(
        addr,
        "/api/students",
        json!({"name": "Ani", "nis": nis, "class": "5A", "grade": "5"}),
    )
    .await;
    assert_eq!(status, 201, "seed student: {body}");
    body["id"].as_i64().expect("student id")
}

pub async fn seed_artwork(addr: SocketAddr, student_id: i64, title: &str) -> i64 {
    let (status, body) = post_json(
        addr,
        "/api/artworks",
        json!({
            "title": title,
            "photoUrl": format!("{PUBLIC_BASE_URL}/blobs/uploads/1-{title}.png"),
            "studentId": student_id,
        }),
    )
    .await;
    assert_eq!(status, 201, "seed artwork: {body}");
    body["id"].as_i64().expect("artwork id")
}
