use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::database::models::{NewStudent, Student, StudentUpdate, StudentWithCount};
use crate::database::repo;
use crate::error::Result;
use crate::http::error::{ApiResult, ResultExt};
use crate::http::params::{
    json_body, optional_text, path_id, required_id, required_text, FlexibleId, JsonPayload,
};
use crate::http::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBody {
    id: Option<FlexibleId>,
    name: Option<String>,
    nis: Option<String>,
    class: Option<String>,
    grade: Option<String>,
    photo_url: Option<String>,
}

impl StudentBody {
    fn into_new(self) -> Result<NewStudent> {
        Ok(NewStudent {
            name: required_text(self.name, "name")?,
            nis: required_text(self.nis, "nis")?,
            class: required_text(self.class, "class")?,
            grade: required_text(self.grade, "grade")?,
            photo_url: optional_text(self.photo_url),
        })
    }

    fn into_update(self) -> Result<StudentUpdate> {
        Ok(StudentUpdate {
            name: required_text(self.name, "name")?,
            nis: required_text(self.nis, "nis")?,
            class: required_text(self.class, "class")?,
            grade: required_text(self.grade, "grade")?,
        })
    }
}

pub(crate) async fn list_students_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StudentWithCount>>> {
    let students = state
        .store
        .call(|conn| repo::list_students(conn))
        .await
        .during("fetch students")?;
    Ok(Json(students))
}

pub(crate) async fn get_student_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<StudentWithCount>> {
    let action = "fetch student";
    let id = path_id(&raw_id, "student").during(action)?;
    let student = state
        .store
        .call(move |conn| repo::get_student(conn, id))
        .await
        .during(action)?;
    Ok(Json(student))
}

pub(crate) async fn create_student_handler(
    State(state): State<AppState>,
    payload: JsonPayload<StudentBody>,
) -> ApiResult<(StatusCode, Json<Student>)> {
    let action = "create student";
    let new = json_body(payload).and_then(StudentBody::into_new).during(action)?;
    let student = state
        .store
        .call(move |conn| repo::create_student(conn, &new))
        .await
        .during(action)?;
    info!(student_id = student.id, nis = %student.nis, "student created");
    Ok((StatusCode::CREATED, Json(student)))
}

/// `PUT /api/students` with the id carried in the body.
pub(crate) async fn update_student_handler(
    State(state): State<AppState>,
    payload: JsonPayload<StudentBody>,
) -> ApiResult<Json<Student>> {
    let action = "update student";
    let body = json_body(payload).during(action)?;
    let id = required_id(body.id.as_ref(), "id").during(action)?;
    update(state, id, body).await
}

pub(crate) async fn update_student_by_path_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: JsonPayload<StudentBody>,
) -> ApiResult<Json<Student>> {
    let action = "update student";
    let id = path_id(&raw_id, "student").during(action)?;
    let body = json_body(payload).during(action)?;
    update(state, id, body).await
}

async fn update(state: AppState, id: i64, body: StudentBody) -> ApiResult<Json<Student>> {
    let action = "update student";
    let update = body.into_update().during(action)?;
    let student = state
        .store
        .call(move |conn| repo::update_student(conn, id, &update))
        .await
        .during(action)?;
    info!(student_id = id, "student updated");
    Ok(Json(student))
}

pub(crate) async fn delete_student_handler(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Student>> {
    let action = "delete student";
    let id = path_id(&raw_id, "student").during(action)?;
    let student = state
        .store
        .call(move |conn| repo::delete_student(conn, id))
        .await
        .during(action)?;
    info!(student_id = id, "student deleted with their artworks");
    Ok(Json(student))
}
