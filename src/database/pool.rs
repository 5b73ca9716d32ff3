use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::database::schema::SCHEMA;
use crate::error::Result;
use crate::utils::config::StoreConfig;

/// Async handle over a bounded set of SQLite connections.
///
/// Every operation is shipped to the blocking pool with the connection it
/// checked out; the semaphore permit travels with it so a dropped request
/// future cannot free a slot while its statement is still running.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    busy_timeout: Duration,
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
}

impl Store {
    pub async fn open(cfg: &StoreConfig) -> Result<Self> {
        let store = Self {
            inner: Arc::new(StoreInner {
                path: cfg.db_path.clone(),
                busy_timeout: cfg.busy_timeout,
                idle: Mutex::new(Vec::with_capacity(cfg.max_connections)),
                permits: Arc::new(Semaphore::new(cfg.max_connections.max(1))),
            }),
        };
        store
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;
        info!(
            path = %cfg.db_path.display(),
            max_connections = cfg.max_connections,
            "store ready"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Runs `f` on a pooled connection off the async worker threads.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self.inner.permits.clone().acquire_owned().await?;
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut conn = inner.checkout()?;
            let result = f(&mut conn);
            // A failed closure has already rolled back its transaction on drop.
            inner.checkin(conn);
            result
        })
        .await?
    }
}

impl StoreInner {
    fn checkout(&self) -> Result<Connection> {
        let pooled = self
            .idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop();
        match pooled {
            Some(conn) => Ok(conn),
            None => {
                debug!(path = %self.path.display(), "opening new sqlite connection");
                Ok(open_connection(&self.path, self.busy_timeout)?)
            }
        }
    }

    fn checkin(&self, conn: Connection) {
        self.idle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(conn);
    }
}

fn open_connection(path: &Path, busy_timeout: Duration) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(conn)
}
