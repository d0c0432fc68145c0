use crate::{
    error::{EstudiantesResult, MalformedDocumentSnafu},
    store::{Document, DocumentBody, ObjectId},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::OptionExt;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub id: ObjectId,
    pub nombre: String,
    pub apellido: String,
    pub aprobado: bool,
    pub nota: f64,
    pub fecha: DateTime<Utc>,
}

/// Body of both the create and the edit requests.
#[derive(Deserialize, Debug, Clone)]
pub struct StudentInput {
    pub nombre: String,
    pub apellido: String,
    pub aprobado: bool,
    pub nota: Option<f64>,
}

fn required_field<T>(
    document: &Document,
    field: &'static str,
    extract: impl FnOnce(&Value) -> Option<T>,
) -> EstudiantesResult<T> {
    document
        .body
        .get(field)
        .and_then(extract)
        .context(MalformedDocumentSnafu {
            id: document.id.to_string(),
            field,
        })
}

pub fn to_external(document: &Document) -> EstudiantesResult<StudentRecord> {
    let string = |value: &Value| value.as_str().map(ToString::to_string);

    Ok(StudentRecord {
        id: document.id,
        nombre: required_field(document, "nombre", string)?,
        apellido: required_field(document, "apellido", string)?,
        aprobado: required_field(document, "aprobado", Value::as_bool)?,
        nota: required_field(document, "nota", Value::as_f64)?,
        fecha: required_field(document, "fecha", |value| {
            DateTime::parse_from_rfc3339(value.as_str()?)
                .ok()
                .map(|fecha| fecha.with_timezone(&Utc))
        })?,
    })
}

/// The identifier is always left to the store. `fecha` is only written when
/// `assign_timestamp` is set, so edits never touch the creation time.
pub fn to_document(input: &StudentInput, assign_timestamp: bool) -> DocumentBody {
    let mut body = DocumentBody::new();
    body.insert("nombre".into(), input.nombre.clone().into());
    body.insert("apellido".into(), input.apellido.clone().into());
    body.insert("aprobado".into(), input.aprobado.into());
    body.insert("nota".into(), input.nota.into());

    if assign_timestamp {
        //millisecond precision, same as the store's native datetimes
        let fecha = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        body.insert("fecha".into(), fecha.into());
    }

    body
}
