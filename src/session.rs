use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::http::{header, HeaderMap};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::chat::Transcript;
use crate::constants;
use crate::tools::{Tool, ToolOutcome};

pub const SESSION_COOKIE: &str = "supportbot_session";

/// Last sidebar tool invocation, kept so the form can show its result.
#[derive(Debug, Clone, Serialize)]
pub struct ToolRun {
    pub tool: Tool,
    pub input: String,
    pub outcome: ToolOutcome,
}

#[derive(Debug, Default)]
pub struct Session {
    pub transcript: Transcript,
    /// One-shot message shown above the chat form.
    pub notice: Option<String>,
    pub tool_run: Option<ToolRun>,
}

struct Slot {
    session: Session,
    last_seen: Instant,
}

/// In-memory sessions keyed by the browser cookie. A session ends after
/// `idle_ttl` without requests; everything is lost on restart.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Slot>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(*constants::SESSION_IDLE_SECS))
    }
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// Runs `f` against the session, creating it on first use. Idle sessions
    /// are evicted on the way.
    pub async fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.inner.write().await;

        let before = sessions.len();
        let idle_ttl = self.idle_ttl;
        sessions.retain(|sid, slot| *sid == id || slot.last_seen.elapsed() < idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, active = sessions.len(), "Evicted idle sessions");
        }

        let slot = sessions.entry(id).or_insert_with(|| Slot {
            session: Session::default(),
            last_seen: Instant::now(),
        });
        slot.last_seen = Instant::now();
        f(&mut slot.session)
    }

    /// Runs `f` against an existing, live session without creating one.
    pub async fn peek_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.inner.write().await;
        match sessions.get_mut(&id) {
            Some(slot) if slot.last_seen.elapsed() < self.idle_ttl => {
                slot.last_seen = Instant::now();
                Some(f(&mut slot.session))
            }
            Some(_) => {
                sessions.remove(&id);
                None
            }
            None => None,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Existing session id, or a fresh one with the `Set-Cookie` value to send.
    pub fn resolve(&self, headers: &HeaderMap) -> (Uuid, Option<String>) {
        match session_id(headers) {
            Some(id) => (id, None),
            None => {
                let id = Uuid::new_v4();
                let cookie = format!(
                    "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
                    SESSION_COOKIE,
                    id,
                    self.idle_ttl.as_secs()
                );
                (id, Some(cookie))
            }
        }
    }
}

/// Session id from the request cookie, if present and well formed.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}
