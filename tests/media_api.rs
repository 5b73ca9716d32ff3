mod support;

use serde_json::json;
use support::{boot, post_json, post_multipart, send_raw_with_method, PNG, PUBLIC_BASE_URL};

#[tokio::test]
async fn qrcode_endpoint_returns_data_url_and_target() {
    let server = boot().await;
    let (status, body) = post_json(
        server.addr,
        "/api/qrcode",
        json!({"artworkId": 7, "baseUrl": "https://gallery.example.sch.id/"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["redirectUrl"], "https://gallery.example.sch.id/artwork/7");
    assert!(body["qrCodeUrl"]
        .as_str()
        .unwrap_or_default()
        .starts_with("data:image/png;base64,"));

    let (status, _) = post_json(server.addr, "/api/qrcode", json!({"artworkId": 7})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn uploaded_image_is_served_back() {
    let server = boot().await;
    let (status, body) =
        post_multipart(server.addr, "/api/upload", "file", "my kite (1).png", PNG).await;
    assert_eq!(status, 200, "{body}");
    let url = body["url"].as_str().expect("url").to_string();
    let prefix = format!("{PUBLIC_BASE_URL}/blobs/uploads/");
    assert!(url.starts_with(&prefix), "{url}");
    assert!(url.ends_with("-mykite1.png"), "{url}");

    let path = url.trim_start_matches(PUBLIC_BASE_URL);
    let (status, head, bytes) = send_raw_with_method(server.addr, "GET", path, &[], None).await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: image/png"));
    assert_eq!(bytes, PNG);

    let (status, body) =
        post_multipart(server.addr, "/api/upload-student", "file", "face.png", PNG).await;
    assert_eq!(status, 200);
    assert!(body["url"]
        .as_str()
        .unwrap_or_default()
        .contains("/blobs/students/"));
}

#[tokio::test]
async fn uploads_reject_non_images_and_missing_files() {
    let server = boot().await;
    let (status, body) =
        post_multipart(server.addr, "/api/upload", "file", "notes.txt", b"just text").await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().is_some());

    let (status, _) = post_multipart(server.addr, "/api/upload", "other", "a.png", PNG).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn unknown_blobs_are_not_found() {
    let server = boot().await;
    let (status, _, _) =
        send_raw_with_method(server.addr, "GET", "/blobs/uploads/1-missing.png", &[], None).await;
    assert_eq!(status, 404);
    let (status, _, _) =
        send_raw_with_method(server.addr, "GET", "/blobs/secrets/1-a.png", &[], None).await;
    assert_eq!(status, 404);
}
