use gavel_core::models::Config;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use refinery::Runner;
use rusqlite::OpenFlags;
use std::{ops::DerefMut, path::PathBuf};
use thiserror::Error;

// Everything that can go wrong below the domain layer, collected into
// one error type. Domain failures (a bid too low, a lost race) are not
// errors and never appear here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("pool error: {0}")]
    ConnectionPool(#[from] r2d2::Error),
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("migration error: {0}")]
    Migration(#[from] refinery::Error),
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("inconsistent configuration")]
    InconsistentConfig,
    #[error("malformed record: {0}")]
    Malformed(String),
}

// Where the records live: a file on disk, or a named in-memory database
pub enum Storage {
    File(PathBuf),
    Memory(String),
}

// SQLite serializes writers, so the pools are split: readers unlimited,
// the writer capped at one connection. That cap is what queues the
// conditional writes of racing bids behind each other. Anything talking
// to the store clones one shared Database handle.
#[derive(Clone, Debug)]
pub struct Database {
    reader: Pool<SqliteConnectionManager>,
    writer: Pool<SqliteConnectionManager>,
    config: Config,
}

impl Database {
    pub fn open(db: Option<&PathBuf>, config: Option<&Config>) -> Result<Self, Error> {
        // In-memory databases are named so the reader and writer pools
        // share one instance; a fresh name per open keeps them private.
        let storage = db
            .map(|path| Storage::File(path.clone()))
            .unwrap_or_else(|| Storage::Memory(uuid::Uuid::new_v4().to_string()));

        let (reader, writer) = open_rw(&storage, Some(crate::embedded::migrations::runner()))?;

        // The stored configuration wins; a caller-supplied one must
        // agree with it, or seeds it on first open.
        let conn = writer.get()?;
        let stored = crate::config::get(&conn)?;

        let config = match (stored, config) {
            (Some(stored), Some(config)) => {
                if stored != *config {
                    return Err(Error::InconsistentConfig);
                }
                stored
            }
            (Some(stored), None) => stored,
            (None, Some(config)) => {
                crate::config::set(config, &conn)?;
                config.clone()
            }
            (None, None) => {
                let config = Config::default();
                crate::config::set(&config, &conn)?;
                config
            }
        };
        drop(conn);

        Ok(Database {
            reader,
            writer,
            config,
        })
    }

    // Check out a connection from the appropriate pool. Mutations must
    // ask for the writer; snapshots and validation reads stay on the
    // reader side.
    pub fn connect(&self, write: bool) -> Result<PooledConnection<SqliteConnectionManager>, Error> {
        let conn = if write {
            self.writer.get()
        } else {
            self.reader.get()
        };
        Ok(conn?)
    }

    pub(crate) fn engine_config(&self) -> &Config {
        &self.config
    }
}

// Construct one connection pool over the given storage
fn pool(
    storage: &Storage,
    max_size: Option<u32>,
    readonly: bool,
    migration: Option<Runner>,
) -> Result<Pool<SqliteConnectionManager>, Error> {
    let mut flags = OpenFlags::default();
    if readonly {
        flags.set(OpenFlags::SQLITE_OPEN_READ_WRITE, false);
        flags.set(OpenFlags::SQLITE_OPEN_READ_ONLY, true);
        flags.set(OpenFlags::SQLITE_OPEN_CREATE, false);
    }

    let db = match storage {
        Storage::File(path) => SqliteConnectionManager::file(path),
        Storage::Memory(name) => {
            // SQLITE_OPEN_CREATE misbehaves with the memdb vfs
            SqliteConnectionManager::file(format!("file:/{}?vfs=memdb", name))
        }
    }
    .with_flags(flags)
    .with_init(|c| {
        c.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = true;
            PRAGMA mmap_size = 134217728;
            PRAGMA journal_size_limit = 27103364;
            PRAGMA cache_size=2000;
            "#,
        )
    });

    let pool = if let Some(n) = max_size {
        r2d2::Pool::builder().max_size(n)
    } else {
        r2d2::Pool::builder()
    }
    .build(db)?;

    if let Some(runner) = migration {
        let mut conn = pool.get()?;
        runner.run(conn.deref_mut())?;
    }

    Ok(pool)
}

// The writer pool runs the migrations; the reader opens read-only after
fn open_rw(
    storage: &Storage,
    migration: Option<Runner>,
) -> Result<(Pool<SqliteConnectionManager>, Pool<SqliteConnectionManager>), Error> {
    let writer = pool(storage, Some(1), false, migration)?;
    let reader = pool(storage, None, true, None)?;
    Ok((reader, writer))
}
