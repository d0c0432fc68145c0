use crate::{
    routes::students::{
        delete_student, get_create_as_student, get_student, get_students, post_new_student,
        put_edited_student,
    },
    state::EstudiantesState,
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod students;

pub const API_PREFIX: &str = "/api/v1";
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn router(state: EstudiantesState) -> Router {
    let api = Router::new()
        .route("/estudiantes", get(get_students))
        .route("/estudiante/{id}", get(get_student))
        .route(
            "/estudiante/create",
            get(get_create_as_student).post(post_new_student),
        )
        .route("/estudiante/edit/{id}", put(put_edited_student))
        .route("/estudiante/delete/{id}", delete(delete_student));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
