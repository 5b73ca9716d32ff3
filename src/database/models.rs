use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::Serialize;

pub const DEFAULT_SUBJECT: &str = "Art & Craft";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub nis: String,
    pub class: String,
    pub grade: String,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub(crate) const COLUMNS: &'static str =
        "s.id, s.name, s.nis, s.class, s.grade, s.photo_url, s.created_at, s.updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            nis: row.get(2)?,
            class: row.get(3)?,
            grade: row.get(4)?,
            photo_url: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtworkTally {
    pub artworks: i64,
}

/// Student as listed by the admin screens, with the number of owned artworks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentWithCount {
    #[serde(flatten)]
    pub student: Student,
    #[serde(rename = "_count")]
    pub count: ArtworkTally,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub name: String,
    pub nis: String,
    pub class: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub photo_url: String,
    pub qr_code_url: Option<String>,
    pub year_created: i32,
    pub subject: String,
    pub student_id: i64,
    pub like_count: i64,
    pub save_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artwork {
    // Legacy rows may still carry NULL counters; they read as zero.
    pub(crate) const COLUMNS: &'static str = "a.id, a.title, a.description, a.photo_url, \
        a.qr_code_url, a.year_created, a.subject, a.student_id, \
        COALESCE(a.like_count, 0), COALESCE(a.save_count, 0), COALESCE(a.view_count, 0), \
        a.created_at, a.updated_at";

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            photo_url: row.get(3)?,
            qr_code_url: row.get(4)?,
            year_created: row.get(5)?,
            subject: row.get(6)?,
            student_id: row.get(7)?,
            like_count: row.get(8)?,
            save_count: row.get(9)?,
            view_count: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtworkWithStudent {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub student: StudentSummary,
}

impl ArtworkWithStudent {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            artwork: Artwork::from_row(row)?,
            student: StudentSummary {
                name: row.get(13)?,
                nis: row.get(14)?,
                class: row.get(15)?,
                grade: row.get(16)?,
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub nis: String,
    pub class: String,
    pub grade: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub name: String,
    pub nis: String,
    pub class: String,
    pub grade: String,
}

#[derive(Debug, Clone)]
pub struct NewArtwork {
    pub title: String,
    pub description: Option<String>,
    pub photo_url: String,
    pub year_created: i32,
    pub subject: String,
    pub student_id: i64,
}

/// Admin edit of an artwork. Counters are never part of an admin edit.
#[derive(Debug, Clone)]
pub struct ArtworkUpdate {
    pub title: String,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub year_created: i32,
    pub subject: String,
    pub student_id: i64,
}
