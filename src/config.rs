use crate::error::{
    BadEnvVarSnafu, EstudiantesResult, ParseNumberSnafu, UnknownStoreBackendSnafu,
};
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::{env::VarError, sync::Arc};

const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
const DEFAULT_COLLECTION: &str = "estudiantes";
const DEFAULT_MAX_CONNECTIONS: u32 = 15;

type EnvSource<'a> = &'a dyn Fn(&'static str) -> Result<String, dotenvy::Error>;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    server_ip: Arc<str>,
    collection: Arc<str>,
    backend: StoreBackend,
}

#[derive(Clone, Debug)]
pub enum StoreBackend {
    Postgres(Arc<DbConfig>),
    Memory,
}

impl RuntimeConfiguration {
    pub fn new() -> EstudiantesResult<Self> {
        Self::from_source(&|name| dotenvy::var(name))
    }

    fn from_source(source: EnvSource) -> EstudiantesResult<Self> {
        let server_ip = optional_var(source, "ESTUDIANTES_SERVER_IP")?
            .unwrap_or_else(|| DEFAULT_SERVER_IP.to_string());
        let collection = optional_var(source, "ESTUDIANTES_COLLECTION")?
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());

        let backend = match optional_var(source, "ESTUDIANTES_STORE")?.as_deref() {
            None | Some("postgres") => StoreBackend::Postgres(Arc::new(DbConfig::new(source)?)),
            Some("memory") => StoreBackend::Memory,
            Some(other) => return UnknownStoreBackendSnafu { backend: other }.fail(),
        };

        Ok(Self {
            server_ip: server_ip.into(),
            collection: collection.into(),
            backend,
        })
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub fn collection(&self) -> Arc<str> {
        self.collection.clone()
    }

    pub const fn backend(&self) -> &StoreBackend {
        &self.backend
    }
}

fn optional_var(source: EnvSource, name: &'static str) -> EstudiantesResult<Option<String>> {
    match source(name) {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(e) => Err(e).context(BadEnvVarSnafu { name }),
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
    max_connections: u32,
}

impl DbConfig {
    fn new(source: EnvSource) -> EstudiantesResult<Self> {
        let get_env_var = |name| source(name).context(BadEnvVarSnafu { name });

        let max_connections = match optional_var(source, "DB_MAX_CONNECTIONS")? {
            Some(raw) => raw.parse().context(ParseNumberSnafu {
                name: "DB_MAX_CONNECTIONS",
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?
                .parse()
                .context(ParseNumberSnafu { name: "DB_PORT" })?,
            database: get_env_var("DB_NAME")?,
            max_connections,
        })
    }

    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }
}
