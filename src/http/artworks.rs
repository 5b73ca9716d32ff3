use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tracing::info;

use crate::database::models::{
    Artwork, ArtworkUpdate, ArtworkWithStudent, NewArtwork, DEFAULT_SUBJECT,
};
use crate::database::repo;
use crate::error::Result;
use crate::http::error::{ApiResult, ResultExt};
use crate::http::params::{
    json_body, optional_text, path_id, required_id, required_text, FlexibleId, JsonPayload,
};
use crate::http::AppState;
use crate::media::qr;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkBody {
    id: Option<FlexibleId>,
    title: Option<String>,
    description: Option<String>,
    photo_url: Option<String>,
    year_created: Option<i32>,
    subject: Option<String>,
    student_id: Option<FlexibleId>,
}

impl ArtworkBody {
    fn year_or_current(&self) -> i32 {
        self.year_created
            .filter(|y| *y > 0)
            .unwrap_or_else(|| Utc::now().year())
    }

    fn into_new(self) -> Result<NewArtwork> {
        let year_created = self.year_or_current();
        Ok(NewArtwork {
            title: required_text(self.title, "title")?,
            photo_url: required_text(self.photo_url, "photoUrl")?,
            student_id: required_id(self.student_id.as_ref(), "studentId")?,
            description: optional_text(self.description),
            year_created,
            subject: optional_text(self.subject).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        })
    }

    fn into_update(self) -> Result<(i64, ArtworkUpdate)> {
        let year_created = self.year_or_current();
        let id = required_id(self.id.as_ref(), "id")?;
        Ok((
            id,
            ArtworkUpdate {
                title: required_text(self.title, "title")?,
                student_id: required_id(self.student_id.as_ref(), "studentId")?,
                description: optional_text(self.description),
                photo_url: optional_text(self.photo_url),
                year_created,
                subject: optional_text(self.subject).unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            },
        ))
    }
}

pub(crate) async fn list_artworks_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ArtworkWithStudent>>> {
    let artworks = state
        .store
        .call(|conn| repo::list_artworks(conn))
        .await
        .during("fetch artworks")?;
    Ok(Json(artworks))
}

pub(crate) async fn get_artwork_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ArtworkWithStudent>> {
    let action = "fetch artwork";
    let id = path_id(&raw_id, "artwork").during(action)?;
    let artwork = state
        .store
        .call(move |conn| repo::get_artwork(conn, id))
        .await
        .during(action)?;
    Ok(Json(artwork))
}

/// Creates the artwork and embeds a QR code pointing at its public detail page.
pub(crate) async fn create_artwork_handler(
    State(state): State<AppState>,
    payload: JsonPayload<ArtworkBody>,
) -> ApiResult<(StatusCode, Json<ArtworkWithStudent>)> {
    let action = "create artwork";
    let new = json_body(payload).and_then(ArtworkBody::into_new).during(action)?;
    let base_url = state.config.public_base_url.clone();
    let created = state
        .store
        .call(move |conn| {
            repo::create_artwork(conn, &new, |id| qr::qr_data_url(&qr::artwork_url(&base_url, id)))
        })
        .await
        .during(action)?;
    info!(
        artwork_id = created.artwork.id,
        student_id = created.artwork.student_id,
        "artwork created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn update_artwork_handler(
    State(state): State<AppState>,
    payload: JsonPayload<ArtworkBody>,
) -> ApiResult<Json<ArtworkWithStudent>> {
    let action = "update artwork";
    let (id, update) = json_body(payload).and_then(ArtworkBody::into_update).during(action)?;
    let artwork = state
        .store
        .call(move |conn| repo::update_artwork(conn, id, &update))
        .await
        .during(action)?;
    info!(artwork_id = id, "artwork updated");
    Ok(Json(artwork))
}

pub(crate) async fn delete_artwork_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Artwork>> {
    let action = "delete artwork";
    let id = path_id(&raw_id, "artwork").during(action)?;
    let artwork = state
        .store
        .call(move |conn| repo::delete_artwork(conn, id))
        .await
        .during(action)?;
    info!(artwork_id = id, "artwork deleted");
    Ok(Json(artwork))
}
