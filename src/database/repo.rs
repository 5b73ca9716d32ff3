use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::database::models::{
    Artwork, ArtworkTally, ArtworkUpdate, ArtworkWithStudent, NewArtwork, NewStudent, Student,
    StudentUpdate, StudentWithCount,
};
use crate::error::{GalleryError, Result};

fn student_select(filter: &str) -> String {
    format!(
        "SELECT {}, (SELECT COUNT(*) FROM artworks a WHERE a.student_id = s.id)
         FROM students s {filter}",
        Student::COLUMNS
    )
}

fn artwork_select(filter: &str) -> String {
    format!(
        "SELECT {}, s.name, s.nis, s.class, s.grade
         FROM artworks a JOIN students s ON s.id = a.student_id {filter}",
        Artwork::COLUMNS
    )
}

fn student_with_count(row: &rusqlite::Row<'_>) -> rusqlite::Result<StudentWithCount> {
    Ok(StudentWithCount {
        student: Student::from_row(row)?,
        count: ArtworkTally {
            artworks: row.get(8)?,
        },
    })
}

pub fn list_students(conn: &Connection) -> Result<Vec<StudentWithCount>> {
    let mut stmt = conn.prepare(&student_select("ORDER BY s.created_at DESC, s.id DESC"))?;
    let rows = stmt
        .query_map([], student_with_count)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn get_student(conn: &Connection, id: i64) -> Result<StudentWithCount> {
    conn.query_row(&student_select("WHERE s.id = ?1"), params![id], student_with_count)
        .optional()?
        .ok_or_else(|| GalleryError::not_found("student", id))
}

fn find_student(tx: &Transaction<'_>, id: i64) -> Result<Option<Student>> {
    let sql = format!("SELECT {} FROM students s WHERE s.id = ?1", Student::COLUMNS);
    Ok(tx.query_row(&sql, params![id], Student::from_row).optional()?)
}

fn nis_taken(tx: &Transaction<'_>, nis: &str, except_id: Option<i64>) -> Result<bool> {
    let taken = tx
        .query_row(
            "SELECT id FROM students WHERE nis = ?1",
            params![nis],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some_and(|id| Some(id) != except_id);
    Ok(taken)
}

pub fn create_student(conn: &mut Connection, new: &NewStudent) -> Result<Student> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if nis_taken(&tx, &new.nis, None)? {
        return Err(GalleryError::DuplicateNis(new.nis.clone()));
    }
    let now = Utc::now();
    let id: i64 = tx.query_row(
        "INSERT INTO students (name, nis, class, grade, photo_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
         RETURNING id",
        params![new.name, new.nis, new.class, new.grade, new.photo_url, now],
        |row| row.get(0),
    )?;
    let student = find_student(&tx, id)?.ok_or_else(|| GalleryError::not_found("student", id))?;
    tx.commit()?;
    Ok(student)
}

pub fn update_student(conn: &mut Connection, id: i64, update: &StudentUpdate) -> Result<Student> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if find_student(&tx, id)?.is_none() {
        return Err(GalleryError::not_found("student", id));
    }
    if nis_taken(&tx, &update.nis, Some(id))? {
        return Err(GalleryError::DuplicateNis(update.nis.clone()));
    }
    tx.execute(
        "UPDATE students SET name = ?2, nis = ?3, class = ?4, grade = ?5, updated_at = ?6
         WHERE id = ?1",
        params![id, update.name, update.nis, update.class, update.grade, Utc::now()],
    )?;
    let student = find_student(&tx, id)?.ok_or_else(|| GalleryError::not_found("student", id))?;
    tx.commit()?;
    Ok(student)
}

/// Removes the student together with every artwork they own and the
/// interaction rows pointing at those artworks.
pub fn delete_student(conn: &mut Connection, id: i64) -> Result<Student> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let student = find_student(&tx, id)?.ok_or_else(|| GalleryError::not_found("student", id))?;

    for table in ["likes", "saves", "views"] {
        tx.execute(
            &format!(
                "DELETE FROM {table}
                 WHERE artwork_id IN (SELECT id FROM artworks WHERE student_id = ?1)"
            ),
            params![id],
        )?;
    }
    tx.execute("DELETE FROM artworks WHERE student_id = ?1", params![id])?;
    tx.execute("DELETE FROM students WHERE id = ?1", params![id])?;

    tx.commit()?;
    Ok(student)
}

pub fn list_artworks(conn: &Connection) -> Result<Vec<ArtworkWithStudent>> {
    let mut stmt = conn.prepare(&artwork_select("ORDER BY a.created_at DESC, a.id DESC"))?;
    let rows = stmt
        .query_map([], ArtworkWithStudent::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn get_artwork(conn: &Connection, id: i64) -> Result<ArtworkWithStudent> {
    conn.query_row(&artwork_select("WHERE a.id = ?1"), params![id], ArtworkWithStudent::from_row)
        .optional()?
        .ok_or_else(|| GalleryError::not_found("artwork", id))
}

/// Inserts the artwork and stores the QR code produced by `render_qr` for
/// its freshly assigned id, all in one transaction.
pub fn create_artwork<F>(
    conn: &mut Connection,
    new: &NewArtwork,
    render_qr: F,
) -> Result<ArtworkWithStudent>
where
    F: FnOnce(i64) -> Result<String>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if find_student(&tx, new.student_id)?.is_none() {
        return Err(GalleryError::not_found("student", new.student_id));
    }

    let now = Utc::now();
    let id: i64 = tx.query_row(
        "INSERT INTO artworks (title, description, photo_url, year_created, subject, student_id,
                               like_count, save_count, view_count, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 0, 0, ?7, ?7)
         RETURNING id",
        params![
            new.title,
            new.description,
            new.photo_url,
            new.year_created,
            new.subject,
            new.student_id,
            now
        ],
        |row| row.get(0),
    )?;

    let qr = render_qr(id)?;
    tx.execute(
        "UPDATE artworks SET qr_code_url = ?2 WHERE id = ?1",
        params![id, qr],
    )?;

    let artwork = tx
        .query_row(&artwork_select("WHERE a.id = ?1"), params![id], ArtworkWithStudent::from_row)?;
    tx.commit()?;
    Ok(artwork)
}

pub fn update_artwork(
    conn: &mut Connection,
    id: i64,
    update: &ArtworkUpdate,
) -> Result<ArtworkWithStudent> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    if find_student(&tx, update.student_id)?.is_none() {
        return Err(GalleryError::not_found("student", update.student_id));
    }
    let changed = tx.execute(
        "UPDATE artworks
         SET title = ?2, description = ?3, photo_url = COALESCE(?4, photo_url),
             year_created = ?5, subject = ?6, student_id = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            id,
            update.title,
            update.description,
            update.photo_url,
            update.year_created,
            update.subject,
            update.student_id,
            Utc::now()
        ],
    )?;
    if changed == 0 {
        return Err(GalleryError::not_found("artwork", id));
    }
    let artwork = tx
        .query_row(&artwork_select("WHERE a.id = ?1"), params![id], ArtworkWithStudent::from_row)?;
    tx.commit()?;
    Ok(artwork)
}

pub fn delete_artwork(conn: &mut Connection, id: i64) -> Result<Artwork> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let sql = format!("SELECT {} FROM artworks a WHERE a.id = ?1", Artwork::COLUMNS);
    let artwork = tx
        .query_row(&sql, params![id], Artwork::from_row)
        .optional()?
        .ok_or_else(|| GalleryError::not_found("artwork", id))?;

    for table in ["likes", "saves", "views"] {
        tx.execute(&format!("DELETE FROM {table} WHERE artwork_id = ?1"), params![id])?;
    }
    tx.execute("DELETE FROM artworks WHERE id = ?1", params![id])?;

    tx.commit()?;
    Ok(artwork)
}
