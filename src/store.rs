//! The document store the service persists students into.
//!
//! A [`DocumentStore`] hands out one [`Collection`] per request; the handle owns whatever
//! connection the backend needs and gives it back when dropped.

use crate::error::{EstudiantesError, EstudiantesResult, InvalidIdentifierSnafu};
use async_trait::async_trait;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use snafu::ResultExt;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

pub mod memory;
pub mod postgres;

/// Field values of a stored document, without its identifier.
pub type DocumentBody = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: ObjectId,
    pub body: DocumentBody,
}

/// The store's native identifier: 12 bytes, written as 24 hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const LEN: usize = 12;

    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }
}

impl FromStr for ObjectId {
    type Err = EstudiantesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; Self::LEN];
        hex::decode_to_slice(s, &mut bytes).context(InvalidIdentifierSnafu { original: s })?;
        Ok(Self(bytes))
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[async_trait]
pub trait DocumentStore: Debug + Send + Sync {
    /// Acquires a handle on the named collection for the duration of one request.
    async fn open_collection(&self, name: &str) -> EstudiantesResult<Box<dyn Collection>>;

    async fn close(&self);
}

#[async_trait]
pub trait Collection: Send {
    fn name(&self) -> &str;

    /// Every document, in the store's natural order.
    async fn find(&mut self) -> EstudiantesResult<Vec<Document>>;

    async fn find_one(&mut self, id: ObjectId) -> EstudiantesResult<Option<Document>>;

    /// Inserts a new document, returning the identifier the store assigned to it.
    async fn insert_one(&mut self, body: DocumentBody) -> EstudiantesResult<ObjectId>;

    /// Overwrites the given fields of one document, leaving the others alone.
    ///
    /// Returns how many documents actually changed, so an update that matches but writes
    /// identical values reports `0`.
    async fn update_one(&mut self, id: ObjectId, set: DocumentBody) -> EstudiantesResult<u64>;

    /// Returns how many documents were removed (`0` or `1`).
    async fn delete_one(&mut self, id: ObjectId) -> EstudiantesResult<u64>;
}
