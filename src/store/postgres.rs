use crate::{
    config::DbConfig,
    error::{
        EstudiantesResult, GetDatabaseConnectionSnafu, MakeQuerySnafu, MalformedDocumentSnafu,
        MigrateSnafu, OpenDatabaseSnafu,
    },
    store::{Collection, Document, DocumentBody, DocumentStore, ObjectId},
};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, pool::PoolConnection, postgres::PgPoolOptions, types::Json};

/// Documents live as JSONB bodies in one `documents` table, keyed by collection name and a
/// database-generated 24 hex character id.
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    pub async fn new(options: PgPoolOptions, config: &DbConfig) -> EstudiantesResult<Self> {
        let pool = options
            .connect(&config.get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        Ok(Self::from_pool(pool))
    }

    /// Wraps a pool whose database already has the migrations applied.
    pub const fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn open_collection(&self, name: &str) -> EstudiantesResult<Box<dyn Collection>> {
        let conn = self
            .pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)?;
        trace!(collection = %name, "Acquired store connection");

        Ok(Box::new(PostgresCollection {
            name: name.to_string(),
            conn,
        }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct PostgresCollection {
    name: String,
    conn: PoolConnection<Postgres>,
}

impl Drop for PostgresCollection {
    fn drop(&mut self) {
        trace!(collection = %self.name, "Releasing store connection");
    }
}

fn into_document((id, Json(body)): (String, Json<DocumentBody>)) -> EstudiantesResult<Document> {
    let Ok(parsed) = id.parse() else {
        return MalformedDocumentSnafu { id, field: "_id" }.fail();
    };
    Ok(Document { id: parsed, body })
}

#[async_trait]
impl Collection for PostgresCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&mut self) -> EstudiantesResult<Vec<Document>> {
        sqlx::query_as::<_, (String, Json<DocumentBody>)>(
            "SELECT id, body FROM public.documents WHERE collection = $1",
        )
        .bind(&self.name)
        .fetch(&mut *self.conn)
        .map(|row| row.context(MakeQuerySnafu).and_then(into_document))
        .try_collect()
        .await
    }

    async fn find_one(&mut self, id: ObjectId) -> EstudiantesResult<Option<Document>> {
        sqlx::query_as::<_, (String, Json<DocumentBody>)>(
            "SELECT id, body FROM public.documents WHERE collection = $1 AND id = $2",
        )
        .bind(&self.name)
        .bind(id.to_string())
        .fetch_optional(&mut *self.conn)
        .await
        .context(MakeQuerySnafu)?
        .map(into_document)
        .transpose()
    }

    async fn insert_one(&mut self, body: DocumentBody) -> EstudiantesResult<ObjectId> {
        let id: String = sqlx::query_scalar(
            "INSERT INTO public.documents (collection, body) VALUES ($1, $2) RETURNING id",
        )
        .bind(&self.name)
        .bind(Json(body))
        .fetch_one(&mut *self.conn)
        .await
        .context(MakeQuerySnafu)?;

        let Ok(parsed) = id.parse() else {
            return MalformedDocumentSnafu { id, field: "_id" }.fail();
        };
        Ok(parsed)
    }

    async fn update_one(&mut self, id: ObjectId, set: DocumentBody) -> EstudiantesResult<u64> {
        //the containment check keeps a no-op update from counting as a modification
        let result = sqlx::query(
            "UPDATE public.documents SET body = body || $3
             WHERE collection = $1 AND id = $2 AND NOT (body @> $3)",
        )
        .bind(&self.name)
        .bind(id.to_string())
        .bind(Json(set))
        .execute(&mut *self.conn)
        .await
        .context(MakeQuerySnafu)?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&mut self, id: ObjectId) -> EstudiantesResult<u64> {
        let result = sqlx::query("DELETE FROM public.documents WHERE collection = $1 AND id = $2")
            .bind(&self.name)
            .bind(id.to_string())
            .execute(&mut *self.conn)
            .await
            .context(MakeQuerySnafu)?;

        Ok(result.rows_affected())
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::data::{
        repository::{Removal, StudentRepository},
        student::StudentInput,
    };
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn ana(nota: f64) -> StudentInput {
        StudentInput {
            nombre: "Ana".into(),
            apellido: "Lopez".into(),
            aprobado: true,
            nota: Some(nota),
        }
    }

    async fn collection(pool: PgPool, name: &str) -> Box<dyn Collection> {
        PostgresStore::from_pool(pool)
            .open_collection(name)
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn generated_ids_are_object_ids(pool: PgPool) {
        let mut students = collection(pool, "estudiantes").await;

        let first = students.insert_one(DocumentBody::new()).await.unwrap();
        let second = students.insert_one(DocumentBody::new()).await.unwrap();
        assert_ne!(first, second);

        let raw = first.to_string();
        assert_eq!(raw.len(), 24);
        assert!(raw.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[sqlx::test]
    async fn create_reads_back_what_was_stored(pool: PgPool) {
        let mut students = collection(pool, "estudiantes").await;
        let mut repository = StudentRepository::new(students.as_mut());

        let created = repository.create(&ana(14.5)).await.unwrap();
        assert_eq!(created.nota, 14.5);
        assert_eq!(
            repository.get_by_id(created.id).await.unwrap(),
            Some(created.clone())
        );
        assert_eq!(repository.list_all().await.unwrap(), vec![created]);
    }

    #[sqlx::test]
    async fn identical_edit_modifies_nothing(pool: PgPool) {
        let mut students = collection(pool, "estudiantes").await;
        let mut repository = StudentRepository::new(students.as_mut());
        let created = repository.create(&ana(9.0)).await.unwrap();

        let edited = repository.update(created.id, &ana(11.0)).await.unwrap();
        assert_eq!(edited.map(|s| (s.nota, s.fecha)), Some((11.0, created.fecha)));

        assert_eq!(repository.update(created.id, &ana(11.0)).await.unwrap(), None);
    }

    #[sqlx::test]
    async fn collections_do_not_see_each_other(pool: PgPool) {
        let mut students = collection(pool.clone(), "estudiantes").await;
        let mut others = collection(pool, "otros").await;

        let Value::Object(body) = json!({"nombre": "Ana"}) else {
            unreachable!()
        };
        let id = students.insert_one(body).await.unwrap();

        assert_eq!(others.find_one(id).await.unwrap(), None);
        assert_eq!(others.delete_one(id).await.unwrap(), 0);
        assert!(others.find().await.unwrap().is_empty());
        assert_eq!(students.find().await.unwrap().len(), 1);
    }

    #[sqlx::test]
    async fn delete_reports_missing_students(pool: PgPool) {
        let mut students = collection(pool, "estudiantes").await;
        let mut repository = StudentRepository::new(students.as_mut());
        let created = repository.create(&ana(12.0)).await.unwrap();

        assert_eq!(repository.delete(created.id).await.unwrap(), Removal::Deleted);
        assert_eq!(repository.get_by_id(created.id).await.unwrap(), None);
        assert_eq!(repository.delete(created.id).await.unwrap(), Removal::NotFound);
    }

    #[sqlx::test]
    async fn table_rejects_ids_that_are_not_object_ids(pool: PgPool) {
        let result = sqlx::query(
            "INSERT INTO public.documents (id, collection, body) VALUES ($1, 'estudiantes', '{}')",
        )
        .bind("NOT-AN-ID")
        .execute(&pool)
        .await;

        assert!(result.is_err());
    }
}
