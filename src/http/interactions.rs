use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{GalleryError, Result};
use crate::http::error::{ApiResult, ResultExt};
use crate::http::params::{json_body, required_id, FlexibleId, JsonPayload};
use crate::http::AppState;
use crate::interactions::{ArtworkId, InteractionKind, InteractionState, SessionId, Toggle};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionBody {
    artwork_id: Option<FlexibleId>,
    session_id: Option<String>,
}

impl InteractionBody {
    fn parse(self) -> Result<(ArtworkId, SessionId)> {
        let artwork = ArtworkId::new(required_id(self.artwork_id.as_ref(), "artworkId")?)?;
        let session = SessionId::new(self.session_id.unwrap_or_default())?;
        Ok((artwork, session))
    }
}

fn query_artwork(params: &HashMap<String, String>) -> Result<ArtworkId> {
    match params.get("artworkId") {
        Some(raw) if !raw.trim().is_empty() => ArtworkId::parse(raw),
        _ => Err(GalleryError::validation("artworkId is required")),
    }
}

fn query_session(params: &HashMap<String, String>) -> Result<Option<SessionId>> {
    params
        .get("sessionId")
        .filter(|raw| !raw.trim().is_empty())
        .map(SessionId::new)
        .transpose()
}

async fn toggle(
    state: AppState,
    toggle: Toggle,
    payload: JsonPayload<InteractionBody>,
    action: &'static str,
) -> ApiResult<Json<InteractionState>> {
    let (artwork, session) = json_body(payload).and_then(InteractionBody::parse).during(action)?;
    let st = state.engine.toggle(toggle, artwork, session).await.during(action)?;
    Ok(Json(st))
}

async fn read(
    state: AppState,
    kind: InteractionKind,
    params: HashMap<String, String>,
    action: &'static str,
) -> ApiResult<Json<InteractionState>> {
    let artwork = query_artwork(&params).during(action)?;
    let session = query_session(&params).during(action)?;
    let st = state.engine.state(kind, artwork, session).await.during(action)?;
    Ok(Json(st))
}

pub(crate) async fn like_handler(
    State(state): State<AppState>,
    payload: JsonPayload<InteractionBody>,
) -> ApiResult<Json<InteractionState>> {
    toggle(state, Toggle::Like, payload, "process like").await
}

pub(crate) async fn like_status_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<InteractionState>> {
    read(state, InteractionKind::Like, params, "get like status").await
}

pub(crate) async fn save_handler(
    State(state): State<AppState>,
    payload: JsonPayload<InteractionBody>,
) -> ApiResult<Json<InteractionState>> {
    toggle(state, Toggle::Save, payload, "process save").await
}

pub(crate) async fn save_status_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<InteractionState>> {
    read(state, InteractionKind::Save, params, "get save status").await
}

pub(crate) async fn view_handler(
    State(state): State<AppState>,
    payload: JsonPayload<InteractionBody>,
) -> ApiResult<Json<InteractionState>> {
    let action = "process view";
    let (artwork, session) = json_body(payload).and_then(InteractionBody::parse).during(action)?;
    let st = state.engine.record_view(artwork, session).await.during(action)?;
    Ok(Json(st))
}

pub(crate) async fn view_count_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<InteractionState>> {
    read(state, InteractionKind::View, params, "get view count").await
}
