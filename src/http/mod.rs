//! HTTP surface: the public interaction endpoints, the admin CRUD API and the
//! media helpers, all sharing one [`AppState`].

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tracing::{info, Instrument};

use crate::database::Store;
use crate::interactions::engine::InteractionEngine;
use crate::media::blob::BlobStore;
use crate::utils::config::ServerConfig;

mod artworks;
pub mod error;
mod interactions;
mod media;
pub mod params;
mod students;

#[derive(Clone)]
pub struct AppState {
    pub engine: InteractionEngine,
    pub store: Store,
    pub blobs: BlobStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Store, config: ServerConfig) -> Self {
        Self {
            engine: InteractionEngine::new(store.clone()),
            blobs: BlobStore::new(config.blob_dir.clone()),
            store,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/healthz", get(media::healthz_handler))
        .route(
            "/interactions/like",
            get(interactions::like_status_handler).post(interactions::like_handler),
        )
        .route(
            "/interactions/save",
            get(interactions::save_status_handler).post(interactions::save_handler),
        )
        .route(
            "/interactions/view",
            get(interactions::view_count_handler).post(interactions::view_handler),
        )
        .route(
            "/api/students",
            get(students::list_students_handler)
                .post(students::create_student_handler)
                .put(students::update_student_handler),
        )
        .route(
            "/api/students/:id",
            get(students::get_student_handler)
                .put(students::update_student_by_path_handler)
                .delete(students::delete_student_handler),
        )
        .route(
            "/api/artworks",
            get(artworks::list_artworks_handler)
                .post(artworks::create_artwork_handler)
                .put(artworks::update_artwork_handler),
        )
        .route(
            "/api/artworks/:id",
            get(artworks::get_artwork_handler).delete(artworks::delete_artwork_handler),
        )
        .route("/api/qrcode", post(media::qrcode_handler))
        .route("/api/upload", post(media::upload_handler))
        .route("/api/upload-student", post(media::upload_student_handler))
        .route("/blobs/:folder/:name", get(media::blob_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn(request_tracing_middleware))
        .with_state(state)
}

async fn request_tracing_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request.uri().path().to_string();
    let span = tracing::info_span!("http.request", method = %method, route = %route);

    async move {
        let started = Instant::now();
        let response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request finished"
        );
        response
    }
    .instrument(span)
    .await
}
