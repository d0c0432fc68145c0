use crate::{
    error::EstudiantesResult,
    store::{Collection, Document, DocumentBody, DocumentStore, ObjectId},
};
use async_trait::async_trait;
use chrono::Utc;
use rand::{Rng, rng};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};
use tokio::sync::RwLock;

/// A store that keeps every collection in process memory, in insertion order.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
    counter: Arc<AtomicU32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Arc::default(),
            counter: Arc::new(AtomicU32::new(rng().random())),
        }
    }

    /// 4 bytes of seconds since the epoch, 5 random bytes, then 3 bytes of a counter.
    fn generate_id(&self) -> ObjectId {
        let mut bytes = [0; ObjectId::LEN];

        let seconds = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        rng().fill(&mut bytes[4..9]);
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);

        ObjectId::from_bytes(bytes)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn open_collection(&self, name: &str) -> EstudiantesResult<Box<dyn Collection>> {
        Ok(Box::new(MemoryCollection {
            name: name.to_string(),
            store: self.clone(),
        }))
    }

    async fn close(&self) {}
}

pub struct MemoryCollection {
    name: String,
    store: MemoryStore,
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&mut self) -> EstudiantesResult<Vec<Document>> {
        let collections = self.store.collections.read().await;
        Ok(collections.get(&self.name).cloned().unwrap_or_default())
    }

    async fn find_one(&mut self, id: ObjectId) -> EstudiantesResult<Option<Document>> {
        let collections = self.store.collections.read().await;
        Ok(collections
            .get(&self.name)
            .and_then(|documents| documents.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn insert_one(&mut self, body: DocumentBody) -> EstudiantesResult<ObjectId> {
        let id = self.store.generate_id();
        self.store
            .collections
            .write()
            .await
            .entry(self.name.clone())
            .or_default()
            .push(Document { id, body });
        Ok(id)
    }

    async fn update_one(&mut self, id: ObjectId, set: DocumentBody) -> EstudiantesResult<u64> {
        let mut collections = self.store.collections.write().await;
        let Some(document) = collections
            .get_mut(&self.name)
            .and_then(|documents| documents.iter_mut().find(|doc| doc.id == id))
        else {
            return Ok(0);
        };

        if set
            .iter()
            .all(|(field, value)| document.body.get(field) == Some(value))
        {
            return Ok(0);
        }

        document.body.extend(set);
        Ok(1)
    }

    async fn delete_one(&mut self, id: ObjectId) -> EstudiantesResult<u64> {
        let mut collections = self.store.collections.write().await;
        let Some(documents) = collections.get_mut(&self.name) else {
            return Ok(0);
        };

        match documents.iter().position(|doc| doc.id == id) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
