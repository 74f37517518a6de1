//! Session ownership (§4.8): one [`Engine`] per `session_id`, created lazily
//! on first use and evicted after a period of inactivity.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::engine::Engine;

const DEFAULT_EVICTION: Duration = Duration::from_secs(30 * 60);

struct Slot {
    engine: Engine,
    last_touched: Instant,
}

/// Owns every live engine. `get_or_create` lazily creates a session on first
/// use; `open_session` at the `CommandAPI` boundary is this same call made
/// explicit for callers that want a session id up front without adding any
/// geometry yet. `close` tears a session down deterministically instead of
/// waiting out the idle-eviction window (§4.8).
pub struct SessionManager {
    sessions: HashMap<String, Slot>,
    eviction_after: Duration,
}

impl SessionManager {
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), eviction_after: DEFAULT_EVICTION }
    }

    pub fn with_eviction(eviction_after: Duration) -> Self {
        Self { sessions: HashMap::new(), eviction_after }
    }

    pub fn get_or_create(&mut self, session_id: &str) -> &mut Engine {
        self.evict_stale();
        let slot = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Slot { engine: Engine::new(), last_touched: Instant::now() });
        slot.last_touched = Instant::now();
        &mut slot.engine
    }

    pub fn get(&self, session_id: &str) -> Option<&Engine> {
        self.sessions.get(session_id).map(|s| &s.engine)
    }

    /// Deterministic teardown (§6.5 `close_session`), freeing the engine
    /// immediately instead of waiting out the idle-eviction window. Returns
    /// `true` if a session existed and was removed.
    pub fn close(&mut self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Removes every session untouched for longer than `eviction_after`.
    /// Soft eviction: there is no protocol-level session teardown, a session
    /// simply stops existing once it has been idle long enough.
    fn evict_stale(&mut self) {
        let cutoff = self.eviction_after;
        self.sessions.retain(|_, slot| slot.last_touched.elapsed() < cutoff);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
