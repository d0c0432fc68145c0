use crate::{
    config::{RuntimeConfiguration, StoreBackend},
    error::{EstudiantesError, EstudiantesResult},
    store::{Collection, DocumentStore, memory::MemoryStore, postgres::PostgresStore},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct EstudiantesState {
    store: Arc<dyn DocumentStore>,
    collection: Arc<str>,
}

impl EstudiantesState {
    pub async fn new(config: &RuntimeConfiguration) -> EstudiantesResult<Self> {
        let store: Arc<dyn DocumentStore> = match config.backend() {
            StoreBackend::Postgres(db_config) => {
                let options = PgPoolOptions::new().max_connections(db_config.max_connections());
                Arc::new(PostgresStore::new(options, db_config).await?)
            }
            StoreBackend::Memory => {
                warn!("Using the in-memory document store, nothing will outlive this process");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(store, config.collection()))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>, collection: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub async fn open_collection(&self) -> EstudiantesResult<Box<dyn Collection>> {
        self.store.open_collection(&self.collection).await
    }

    pub async fn sensible_shutdown(&self) {
        self.store.close().await;
    }
}

/// The students collection, opened for the lifetime of one request. Dropping it (on every
/// exit path of the handler) gives the connection back to the store.
pub struct StudentCollection(pub Box<dyn Collection>);

impl FromRequestParts<EstudiantesState> for StudentCollection {
    type Rejection = EstudiantesError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &EstudiantesState,
    ) -> Result<Self, Self::Rejection> {
        state.open_collection().await.map(Self)
    }
}
