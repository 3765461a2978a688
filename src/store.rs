//! Project persistence: markdown documents keyed by generated ids.
//!
//! The store holds source text only; timelines are always recompiled on load.
//! Entries expire after a fixed TTL so abandoned scratch projects do not
//! accumulate.

use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::error::{ScenemarkError, ScenemarkResult};

/// Default retention for saved projects.
pub const PROJECT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Persistence seam. Implementations store opaque source text; ids come from
/// an [`IdGenerator`].
pub trait ProjectStore {
    /// `Ok(None)` for unknown or expired ids.
    fn get(&self, id: &str) -> ScenemarkResult<Option<String>>;
    fn set(&self, id: &str, source: &str, ttl: Duration) -> ScenemarkResult<()>;
}

pub trait IdGenerator {
    fn next_id(&self) -> String;
}

/// Process-unique ids: an FNV-1a hash of pid, wall-clock nanos and a
/// monotonic counter, rendered as hex.
#[derive(Debug, Default)]
pub struct SystemIdGenerator {
    counter: AtomicU64,
}

impl SystemIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SystemIdGenerator {
    fn next_id(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);

        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for word in [u64::from(std::process::id()), nanos, n] {
            for byte in word.to_le_bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
        }
        format!("{hash:016x}")
    }
}

struct Entry {
    source: String,
    expires_at_ms: u64,
}

/// In-memory [`ProjectStore`] with lazy TTL expiry. The clock is injectable
/// so expiry is testable without sleeping.
pub struct MemoryProjectStore {
    entries: Mutex<BTreeMap<String, Entry>>,
    now_ms: fn() -> u64,
}

impl Default for MemoryProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::with_clock(system_now_ms)
    }

    pub fn with_clock(now_ms: fn() -> u64) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            now_ms,
        }
    }

    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn system_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl ProjectStore for MemoryProjectStore {
    fn get(&self, id: &str) -> ScenemarkResult<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ScenemarkError::store("project store lock poisoned"))?;

        let now = (self.now_ms)();
        let Some(entry) = entries.get(id) else {
            return Ok(None);
        };
        if entry.expires_at_ms <= now {
            entries.remove(id);
            return Ok(None);
        }
        Ok(Some(entry.source.clone()))
    }

    fn set(&self, id: &str, source: &str, ttl: Duration) -> ScenemarkResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ScenemarkError::store("project store lock poisoned"))?;

        let now = (self.now_ms)();
        let expires_at_ms = now.saturating_add(ttl.as_millis() as u64);
        entries.insert(
            id.to_owned(),
            Entry {
                source: source.to_owned(),
                expires_at_ms,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryProjectStore::new();
        store.set("p1", "# doc", PROJECT_TTL).unwrap();
        assert_eq!(store.get("p1").unwrap().as_deref(), Some("# doc"));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn overwrite_replaces_source() {
        let store = MemoryProjectStore::new();
        store.set("p1", "old", PROJECT_TTL).unwrap();
        store.set("p1", "new", PROJECT_TTL).unwrap();
        assert_eq!(store.get("p1").unwrap().as_deref(), Some("new"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn expired_entries_read_as_absent() {
        // Clock frozen at 0: any zero TTL entry is immediately expired.
        let store = MemoryProjectStore::with_clock(|| 0);
        store.set("p1", "doc", Duration::ZERO).unwrap();
        assert_eq!(store.get("p1").unwrap(), None);
        // Lazy expiry also removed the entry.
        assert!(store.is_empty());

        let store = MemoryProjectStore::with_clock(|| 1_000);
        store.set("p2", "doc", Duration::from_millis(500)).unwrap();
        assert_eq!(store.get("p2").unwrap().as_deref(), Some("doc"));
    }

    #[test]
    fn generated_ids_are_unique_hex() {
        let generator = SystemIdGenerator::new();
        let a = generator.next_id();
        let b = generator.next_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
