// src/mcp/session.rs
//! Session bookkeeping shared by both transports.
//!
//! One `SessionStore` instance per transport kind, each mapping an opaque
//! session id to a live handler. The streamable store carries an idle TTL and
//! is swept by the reaper; the SSE store has no TTL because its entries die
//! with the connection that created them.
//!
//! `last_accessed` is an atomic epoch-millis stamp so a touch never takes the
//! map lock. A sweep racing an in-flight touch resolves either way — the
//! entry survives freshly stamped or the next request gets a clean not-found.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Idle threshold for streamable sessions.
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Fixed reaper tick, independent of request traffic.
pub const REAPER_INTERVAL: Duration = Duration::from_secs(60);

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ── Session entry ───────────────────────────────────────────────────────────

pub struct Session<T> {
    pub id: String,
    pub inner: T,
    last_accessed: AtomicU64,
}

impl<T> Session<T> {
    fn new(id: String, inner: T) -> Self {
        Self {
            id,
            inner,
            last_accessed: AtomicU64::new(epoch_millis()),
        }
    }

    pub fn touch(&self) {
        self.last_accessed.store(epoch_millis(), Ordering::Relaxed);
    }

    fn is_expired(&self, ttl_ms: u64) -> bool {
        let last = self.last_accessed.load(Ordering::Relaxed);
        epoch_millis().saturating_sub(last) > ttl_ms
    }
}

// ── Store ───────────────────────────────────────────────────────────────────

/// Map from session id to a live handler entry. `ttl: None` disables idle
/// expiry entirely (SSE sessions are evicted on disconnect instead).
pub struct SessionStore<T> {
    sessions: RwLock<HashMap<String, Arc<Session<T>>>>,
    ttl_ms: Option<u64>,
}

impl<T> SessionStore<T> {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl_ms: ttl.map(|t| t.as_millis() as u64),
        }
    }

    pub async fn insert(&self, id: String, inner: T) -> Arc<Session<T>> {
        let session = Arc::new(Session::new(id.clone(), inner));
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session.clone());
        tracing::debug!(session_id = %session.id, total = sessions.len(), "session created");
        session
    }

    /// Look up a live session, refreshing its `last_accessed` stamp.
    /// An entry past its TTL reads as absent even before the reaper runs.
    pub async fn get(&self, id: &str) -> Option<Arc<Session<T>>> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(id)?;
        if let Some(ttl_ms) = self.ttl_ms
            && session.is_expired(ttl_ms)
        {
            return None;
        }
        session.touch();
        Some(session.clone())
    }

    pub async fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, total = sessions.len(), "session removed");
        }
        removed
    }

    /// Evict every entry past the idle threshold. No-op for TTL-less stores.
    pub async fn sweep_expired(&self) -> usize {
        let Some(ttl_ms) = self.ttl_ms else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let expired = session.is_expired(ttl_ms);
            if expired {
                tracing::debug!(session_id = %id, "evicting idle session");
            }
            !expired
        });
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, remaining = sessions.len(), "idle sessions evicted");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Background eviction loop for the streamable-transport store.
pub fn spawn_reaper<T: Send + Sync + 'static>(store: Arc<SessionStore<T>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(REAPER_INTERVAL);
        // First tick fires immediately; skip it so a fresh server doesn't
        // sweep an empty map at startup.
        interval.tick().await;
        loop {
            interval.tick().await;
            store.sweep_expired().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let store: SessionStore<u32> = SessionStore::new(Some(SESSION_TTL));
        assert!(store.get("nope").await.is_none());
    }

    #[tokio::test]
    async fn expired_session_reads_as_absent() {
        let store: SessionStore<u32> = SessionStore::new(Some(Duration::from_millis(40)));
        store.insert("s1".to_string(), 1).await;
        assert!(store.get("s1").await.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.get("s1").await.is_none());
    }

    #[tokio::test]
    async fn touch_extends_lifetime() {
        let store: SessionStore<u32> = SessionStore::new(Some(Duration::from_millis(100)));
        store.insert("s1".to_string(), 1).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.get("s1").await.is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        // Survives because the previous get() refreshed the stamp.
        assert!(store.get("s1").await.is_some());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let store: SessionStore<u32> = SessionStore::new(Some(Duration::from_millis(50)));
        store.insert("old1".to_string(), 1).await;
        store.insert("old2".to_string(), 2).await;
        let kept = store.insert("kept".to_string(), 3).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        kept.touch();

        let removed = store.sweep_expired().await;
        assert_eq!(removed, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.get("kept").await.is_some());
        assert!(store.get("old1").await.is_none());
    }

    #[tokio::test]
    async fn sweep_is_noop_without_ttl() {
        let store: SessionStore<u32> = SessionStore::new(None);
        store.insert("s1".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.sweep_expired().await, 0);
        assert!(store.get("s1").await.is_some());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store: SessionStore<u32> = SessionStore::new(Some(SESSION_TTL));
        store.insert("s1".to_string(), 1).await;
        assert!(store.remove("s1").await);
        assert!(!store.remove("s1").await);
    }
}
