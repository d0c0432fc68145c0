use crate::{
    data::student::{StudentInput, StudentRecord, to_document, to_external},
    error::{EstudiantesResult, InsertedStudentMissingSnafu},
    store::{Collection, ObjectId},
    validation::validate_grade,
};
use snafu::OptionExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Deleted,
    NotFound,
}

/// Student CRUD against one collection handle; the handle's connection belongs to the caller.
pub struct StudentRepository<'c> {
    collection: &'c mut dyn Collection,
}

impl<'c> StudentRepository<'c> {
    pub fn new(collection: &'c mut dyn Collection) -> Self {
        Self { collection }
    }

    pub async fn list_all(&mut self) -> EstudiantesResult<Vec<StudentRecord>> {
        self.collection
            .find()
            .await?
            .iter()
            .map(to_external)
            .collect()
    }

    pub async fn get_by_id(&mut self, id: ObjectId) -> EstudiantesResult<Option<StudentRecord>> {
        self.collection
            .find_one(id)
            .await?
            .as_ref()
            .map(to_external)
            .transpose()
    }

    /// Inserts then reads the student back, so the caller sees exactly what was stored.
    pub async fn create(&mut self, input: &StudentInput) -> EstudiantesResult<StudentRecord> {
        validate_grade(input.nota)?;

        let id = self.collection.insert_one(to_document(input, true)).await?;
        info!(%id, collection = self.collection.name(), "Created student");

        self.get_by_id(id)
            .await?
            .context(InsertedStudentMissingSnafu { id })
    }

    /// `None` when nothing was modified, which covers both an unknown id and an edit that
    /// matches what is already stored.
    pub async fn update(
        &mut self,
        id: ObjectId,
        input: &StudentInput,
    ) -> EstudiantesResult<Option<StudentRecord>> {
        validate_grade(input.nota)?;

        let modified = self
            .collection
            .update_one(id, to_document(input, false))
            .await?;
        if modified == 0 {
            debug!(%id, "Edit modified no students");
            return Ok(None);
        }
        info!(%id, collection = self.collection.name(), "Edited student");

        self.get_by_id(id).await
    }

    pub async fn delete(&mut self, id: ObjectId) -> EstudiantesResult<Removal> {
        match self.collection.delete_one(id).await? {
            0 => Ok(Removal::NotFound),
            deleted => {
                info!(%id, deleted, collection = self.collection.name(), "Deleted student");
                Ok(Removal::Deleted)
            }
        }
    }
}
