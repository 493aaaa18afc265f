//! Session Store (spec.md §4.4, component C4): `get_or_create`, `touch`,
//! `get_context`, `set_context`, `delete`, plus idle/count-bounded eviction.
//! Grounded in the teacher's `RwLock<HashMap<...>>`-guarded store
//! (`sa-sessions/src/store.rs`) but keyed through an `lru::LruCache` so the
//! "count cap evicts least-recently-used" rule (spec.md §4.4) falls out of
//! the container itself instead of a hand-rolled scan.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use ogw_domain::config::SessionsConfig;
use ogw_domain::trace::TraceEvent;
use ogw_domain::{Error, Result};

use crate::entry::Session;

pub struct SessionStore {
    max_idle: Duration,
    max_context_bytes: usize,
    sessions: Mutex<LruCache<String, Session>>,
}

impl SessionStore {
    pub fn new(config: &SessionsConfig) -> Self {
        let cap = NonZeroUsize::new(config.max_session_count.max(1)).unwrap();
        Self {
            max_idle: Duration::from_secs(config.max_idle_secs),
            max_context_bytes: config.max_context_bytes,
            sessions: Mutex::new(LruCache::new(cap)),
        }
    }

    /// Returns the session id, creating a fresh session (with a random id
    /// if `requested_id` is `None`) and touching an existing one.
    pub fn get_or_create(&self, requested_id: Option<String>) -> String {
        let id = requested_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(&id) {
            session.touch();
            return id;
        }
        if let Some((evicted_id, _)) = sessions.push(id.clone(), Session::new(id.clone())) {
            if evicted_id != id {
                TraceEvent::SessionEvicted { session_id: evicted_id, reason: "count_cap" }.emit();
            }
        }
        TraceEvent::SessionCreated { session_id: id.clone() }.emit();
        id
    }

    pub fn touch(&self, id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(id) {
            Some(session) => {
                session.touch();
                Ok(())
            }
            None => Err(Error::NotFound(format!("session {id}"))),
        }
    }

    pub fn get_context(&self, id: &str, key: &str) -> Result<Option<Value>> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(id).ok_or_else(|| Error::NotFound(format!("session {id}")))?;
        Ok(session.get_context(key))
    }

    pub fn set_context(&self, id: &str, key: String, value: Value) -> Result<()> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(id).ok_or_else(|| Error::NotFound(format!("session {id}")))?;
        session
            .set_context(key, value, self.max_context_bytes)
            .map(|_| ())
            .map_err(|size| {
                Error::Validation(format!(
                    "session context would exceed {} bytes (attempted {size})",
                    self.max_context_bytes
                ))
            })
    }

    pub fn delete(&self, id: &str) {
        self.sessions.lock().pop(id);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evicts sessions idle beyond `max_idle`. Called by the background
    /// reaper; also callable directly from tests.
    pub fn reap_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let idle_ids: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.is_idle(now, self.max_idle))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &idle_ids {
            sessions.pop(id);
            TraceEvent::SessionEvicted { session_id: id.clone(), reason: "idle_timeout" }.emit();
        }
        idle_ids.len()
    }
}

/// Spawns the background idle-session reaper on the current tokio runtime,
/// mirroring the teacher's periodic `interval.tick().await` pruning loops
/// (`sa-gateway/src/bootstrap.rs::spawn_background_tasks`).
pub fn spawn_reaper(store: Arc<SessionStore>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let reaped = store.reap_idle();
            if reaped > 0 {
                tracing::debug!(reaped, "session reaper evicted idle sessions");
            }
        }
    })
}
