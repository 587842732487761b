use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mgmt_common::{EntityKey, Uuid};
use mgmt_config::LockServiceConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::error::LockError;
use crate::record::{LockDiagnostics, LockRecord};

struct Entry {
    record: LockRecord,
    backtrace: String,
    timer: JoinHandle<()>,
}

/// On a single node, grants and releases advisory locks over named cluster
/// entities (spec §4.3). The whole map is guarded by one mutex, held only
/// for the duration of a single mutation — never across an `.await` other
/// than the mutex acquisition itself (spec §5 "Lock Service maps").
pub struct LockService {
    locks: Arc<Mutex<HashMap<EntityKey, Entry>>>,
    timeout: Duration,
}

impl LockService {
    pub fn new(config: &LockServiceConfig) -> Self {
        Self { locks: Arc::new(Mutex::new(HashMap::new())), timeout: config.lock_timeout() }
    }

    /// Grants `entity` to `requester` if vacant, or returns
    /// [`LockError::AlreadyHeld`] if another UUID already holds it (spec
    /// §4.3 "acquire"). Idempotent by owner: re-acquiring a key you already
    /// own succeeds without installing a second timer.
    #[instrument(skip(self), fields(entity = %entity, requester = %requester))]
    pub async fn acquire(&self, entity: EntityKey, requester: Uuid) -> Result<(), LockError> {
        let mut locks = self.locks.lock().await;
        if let Some(entry) = locks.get(&entity) {
            if entry.record.owner == requester {
                return Ok(());
            }
            return Err(LockError::AlreadyHeld { entity });
        }

        let backtrace = capture_backtrace();
        let timer = self.spawn_auto_release(entity.clone());
        locks.insert(entity.clone(), Entry { record: LockRecord { owner: requester, acquired_at: Instant::now() }, backtrace, timer });
        info!("lock granted");
        Ok(())
    }

    /// Removes `entity`'s record if `requester` owns it (spec §4.3
    /// "release"). Cancels the auto-release timer.
    #[instrument(skip(self), fields(entity = %entity, requester = %requester))]
    pub async fn release(&self, entity: EntityKey, requester: Uuid) -> Result<(), LockError> {
        let mut locks = self.locks.lock().await;
        match locks.get(&entity) {
            None => Err(LockError::NotHeld { entity }),
            Some(entry) if entry.record.owner != requester => {
                Err(LockError::OwnerMismatch { entity, requester })
            }
            Some(_) => {
                let entry = locks.remove(&entity).expect("presence just checked above");
                entry.timer.abort();
                info!("lock released");
                Ok(())
            }
        }
    }

    /// Acquires every entry in order; on the first failure, releases every
    /// lock this call took so far (in reverse order) and returns
    /// [`LockError::PartialFail`] wrapping the triggering failure (spec §4.3
    /// "acquire_many").
    pub async fn acquire_many(&self, entries: &[EntityKey], requester: Uuid) -> Result<(), LockError> {
        let mut taken = Vec::with_capacity(entries.len());
        for entity in entries {
            match self.acquire(entity.clone(), requester).await {
                Ok(()) => taken.push(entity.clone()),
                Err(err) => {
                    for rollback in taken.into_iter().rev() {
                        let _ = self.release(rollback, requester).await;
                    }
                    return Err(LockError::PartialFail { source: Box::new(err) });
                }
            }
        }
        Ok(())
    }

    /// Best-effort release of every entry; continues past failures but
    /// reports the first one encountered (spec §4.3 "release_many").
    pub async fn release_many(&self, entries: &[EntityKey], requester: Uuid) -> Result<(), LockError> {
        let mut first_error = None;
        for entity in entries {
            if let Err(err) = self.release(entity.clone(), requester).await {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Snapshot of every currently held lock, for diagnostics and tests.
    pub async fn held_locks_snapshot(&self) -> HashMap<EntityKey, LockDiagnostics> {
        self.locks
            .lock()
            .await
            .iter()
            .map(|(key, entry)| {
                (
                    key.clone(),
                    LockDiagnostics {
                        owner: entry.record.owner,
                        acquired_at: entry.record.acquired_at,
                        backtrace: entry.backtrace.clone(),
                    },
                )
            })
            .collect()
    }

    fn spawn_auto_release(&self, entity: EntityKey) -> JoinHandle<()> {
        let locks = self.locks.clone();
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut locks = locks.lock().await;
            if locks.remove(&entity).is_some() {
                info!(entity = %entity, "auto-release timer expired, lock reclaimed");
            }
        })
    }
}

fn capture_backtrace() -> String {
    std::backtrace::Backtrace::capture().to_string()
}

impl Drop for LockService {
    fn drop(&mut self) {
        if let Ok(locks) = self.locks.try_lock() {
            for entry in locks.values() {
                entry.timer.abort();
            }
        }
    }
}
