//! Anonymous per-session engagement: likes, saves and first views.
//!
//! Each interaction kind owns a relation table keyed by
//! `(artwork_id, session_id)` and a denormalized counter column on
//! `artworks`. The engine mutates both in the same transaction so the counter
//! always equals the number of relation rows.

pub mod engine;

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{GalleryError, Result};

pub use engine::InteractionEngine;

const MAX_SESSION_ID_BYTES: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Like,
    Save,
    View,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Save => "save",
            Self::View => "view",
        }
    }

    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Like => "likes",
            Self::Save => "saves",
            Self::View => "views",
        }
    }

    pub(crate) fn counter_column(self) -> &'static str {
        match self {
            Self::Like => "like_count",
            Self::Save => "save_count",
            Self::View => "view_count",
        }
    }

    pub fn state_field(self) -> &'static str {
        match self {
            Self::Like => "liked",
            Self::Save => "saved",
            Self::View => "viewed",
        }
    }

    pub fn count_field(self) -> &'static str {
        match self {
            Self::Like => "likeCount",
            Self::Save => "saveCount",
            Self::View => "viewCount",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two relations that flip on every call. Views are append-only and are
/// not representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Like,
    Save,
}

impl From<Toggle> for InteractionKind {
    fn from(t: Toggle) -> Self {
        match t {
            Toggle::Like => Self::Like,
            Toggle::Save => Self::Save,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtworkId(i64);

impl ArtworkId {
    pub fn new(raw: i64) -> Result<Self> {
        if raw <= 0 {
            return Err(GalleryError::validation("artworkId must be a positive integer"));
        }
        Ok(Self(raw))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| GalleryError::validation("artworkId must be a positive integer"))?;
        Self::new(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier a browser generates once and sends with every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(GalleryError::validation("sessionId is required"));
        }
        if trimmed.len() > MAX_SESSION_ID_BYTES {
            return Err(GalleryError::validation(format!(
                "sessionId must be at most {MAX_SESSION_ID_BYTES} bytes"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of any engine call, serialized as e.g. `{"liked": true, "likeCount": 3}`.
///
/// `active` is `None` only for a view-count query made without a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionState {
    pub kind: InteractionKind,
    pub active: Option<bool>,
    pub count: i64,
}

impl Serialize for InteractionState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1 + usize::from(self.active.is_some())))?;
        if let Some(active) = self.active {
            map.serialize_entry(self.kind.state_field(), &active)?;
        }
        map.serialize_entry(self.kind.count_field(), &self.count)?;
        map.end()
    }
}
