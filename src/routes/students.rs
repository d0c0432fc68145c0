use crate::{
    data::{
        repository::{Removal, StudentRepository},
        student::{StudentInput, StudentRecord},
    },
    error::{
        EstudiantesResult, StudentNotDeletedSnafu, StudentNotEditedSnafu, StudentNotFoundSnafu,
    },
    state::StudentCollection,
    validation::validate_identifier,
};
use axum::{Json, extract::Path};
use snafu::OptionExt;

pub const DELETED_MESSAGE: &str = "El Estudiante se eliminó correctamente";

pub async fn get_students(
    StudentCollection(mut collection): StudentCollection,
) -> EstudiantesResult<Json<Vec<StudentRecord>>> {
    let students = StudentRepository::new(collection.as_mut())
        .list_all()
        .await?;
    Ok(Json(students))
}

pub async fn get_student(
    Path(id): Path<String>,
    StudentCollection(mut collection): StudentCollection,
) -> EstudiantesResult<Json<StudentRecord>> {
    let id = validate_identifier(&id)?;

    StudentRepository::new(collection.as_mut())
        .get_by_id(id)
        .await?
        .context(StudentNotFoundSnafu { id })
        .map(Json)
}

/// `GET /estudiante/create` matches the static create route before `/estudiante/{id}`,
/// so hand the segment over as the id it looks like.
pub async fn get_create_as_student(
    collection: StudentCollection,
) -> EstudiantesResult<Json<StudentRecord>> {
    get_student(Path(String::from("create")), collection).await
}

#[axum::debug_handler(state = crate::state::EstudiantesState)]
pub async fn post_new_student(
    StudentCollection(mut collection): StudentCollection,
    Json(input): Json<StudentInput>,
) -> EstudiantesResult<Json<StudentRecord>> {
    let student = StudentRepository::new(collection.as_mut())
        .create(&input)
        .await?;
    Ok(Json(student))
}

pub async fn put_edited_student(
    Path(id): Path<String>,
    StudentCollection(mut collection): StudentCollection,
    Json(input): Json<StudentInput>,
) -> EstudiantesResult<Json<StudentRecord>> {
    let id = validate_identifier(&id)?;

    StudentRepository::new(collection.as_mut())
        .update(id, &input)
        .await?
        .context(StudentNotEditedSnafu { id })
        .map(Json)
}

pub async fn delete_student(
    Path(id): Path<String>,
    StudentCollection(mut collection): StudentCollection,
) -> EstudiantesResult<Json<&'static str>> {
    let id = validate_identifier(&id)?;

    match StudentRepository::new(collection.as_mut()).delete(id).await? {
        Removal::Deleted => Ok(Json(DELETED_MESSAGE)),
        Removal::NotFound => StudentNotDeletedSnafu { id }.fail(),
    }
}
