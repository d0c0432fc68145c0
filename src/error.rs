use crate::store::ObjectId;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use snafu::Snafu;
use std::num::ParseIntError;

pub type EstudiantesResult<T> = Result<T, EstudiantesError>;

pub const UNEXPECTED_FAILURE_MESSAGE: &str = "Se produjo un error inesperado.";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum EstudiantesError {
    #[snafu(display("Identificador (ID) inválido"))]
    InvalidIdentifier {
        source: hex::FromHexError,
        original: String,
    },
    #[snafu(display("Por favor, ingrese una nota entre cero (0) y veinte (20)."))]
    MissingGrade,
    #[snafu(display("La nota no puede ser menor a cero (0)."))]
    GradeTooLow { nota: f64 },
    #[snafu(display("La nota no puede ser mayor a veinte (20)."))]
    GradeTooHigh { nota: f64 },
    #[snafu(display("No se ha encontrado al estudiante"))]
    StudentNotFound { id: ObjectId },
    #[snafu(display("No se ha encontrado al estudiante con id {}", id))]
    StudentNotEdited { id: ObjectId },
    #[snafu(display("No se ha encontrado al estudiante con id {}", id))]
    StudentNotDeleted { id: ObjectId },

    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Document {} has a missing or mistyped field `{}`", id, field))]
    MalformedDocument { id: String, field: &'static str },
    #[snafu(display("Inserted student {} could not be read back", id))]
    InsertedStudentMissing { id: ObjectId },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse {} as a number", name))]
    ParseNumber {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unknown document store backend {:?}", backend))]
    UnknownStoreBackend { backend: String },
}

impl EstudiantesError {
    pub const fn status_code(&self) -> StatusCode {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        match self {
            Self::InvalidIdentifier { .. } => BI,
            Self::MissingGrade | Self::GradeTooLow { .. } | Self::GradeTooHigh { .. } => BI,
            // get and edit report a missing student as bad input, delete as not found
            Self::StudentNotFound { .. } | Self::StudentNotEdited { .. } => BI,
            Self::StudentNotDeleted { .. } => NF,
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MakeQuery { .. } | Self::MigrateError { .. } => ISE,
            Self::MalformedDocument { .. } | Self::InsertedStudentMissing { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParseNumber { .. } => ISE,
            Self::UnknownStoreBackend { .. } => ISE,
        }
    }
}

impl IntoResponse for EstudiantesError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(?self, "Unexpected failure handling request");
            return (status_code, Json(UNEXPECTED_FAILURE_MESSAGE)).into_response();
        }

        warn!(?self, "Rejected request");
        (status_code, Json(self.to_string())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(error: EstudiantesError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024)
            .await
            .expect("readable body");
        let text: String = serde_json::from_slice(&bytes).expect("json string body");
        (status, text)
    }

    #[tokio::test]
    async fn client_errors_carry_their_message() {
        let (status, text) = body_text(EstudiantesError::GradeTooHigh { nota: 21.0 }).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "La nota no puede ser mayor a veinte (20).");
    }

    #[tokio::test]
    async fn not_found_is_asymmetric_between_edit_and_delete() {
        let id: ObjectId = "65f0a1b2c3d4e5f601234567".parse().unwrap();

        let (edit_status, edit_text) = body_text(EstudiantesError::StudentNotEdited { id }).await;
        let (delete_status, delete_text) =
            body_text(EstudiantesError::StudentNotDeleted { id }).await;

        assert_eq!(edit_status, StatusCode::BAD_REQUEST);
        assert_eq!(delete_status, StatusCode::NOT_FOUND);
        assert_eq!(edit_text, delete_text);
        assert!(delete_text.ends_with("65f0a1b2c3d4e5f601234567"));
    }

    #[tokio::test]
    async fn unexpected_failures_hide_their_details() {
        let (status, text) = body_text(EstudiantesError::MalformedDocument {
            id: "65f0a1b2c3d4e5f601234567".into(),
            field: "nota",
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, UNEXPECTED_FAILURE_MESSAGE);
    }
}
