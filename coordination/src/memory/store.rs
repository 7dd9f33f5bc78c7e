//! sled-backed durable memory store with a write-through cache.
//!
//! Entry and workflow rows carry open-ended JSON payloads and are
//! JSON-encoded (bincode cannot decode `serde_json::Value`); agent
//! snapshots are fixed-shape and stay bincode. Reads filter expired rows,
//! so correctness never depends on the sweep timing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace, warn};

use super::schema::{self, glob_match, keys};
use super::types::{AgentSnapshot, CoordinationEvent, EventQuery, MemoryEntry, WorkflowMemory};
use crate::agent::Agent;

/// Default cap on event-log query results.
const DEFAULT_EVENT_LIMIT: usize = 100;

/// Error type for memory store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

/// Result type for memory store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Shared reference to a [`MemoryStore`].
pub type SharedMemoryStore = Arc<MemoryStore>;

/// Durable, TTL-aware, categorized memory store.
pub struct MemoryStore {
    _db: sled::Db,
    entries: sled::Tree,
    workflows: sled::Tree,
    agents: sled::Tree,
    events: sled::Tree,
    /// Write-through cache keyed by (category, key).
    cache: RwLock<HashMap<(String, String), MemoryEntry>>,
    path: PathBuf,
}

impl MemoryStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path)?;
        Ok(Self {
            entries: db.open_tree(schema::TREE_ENTRIES)?,
            workflows: db.open_tree(schema::TREE_WORKFLOWS)?,
            agents: db.open_tree(schema::TREE_AGENTS)?,
            events: db.open_tree(schema::TREE_EVENTS)?,
            cache: RwLock::new(HashMap::new()),
            _db: db,
            path,
        })
    }

    /// Create a shared reference to this store.
    pub fn shared(self) -> SharedMemoryStore {
        Arc::new(self)
    }

    /// The database path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    // Rows holding `serde_json::Value` must be self-describing on disk;
    // bincode is reserved for fixed-shape rows.
    fn encode_json<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    fn encode_bin<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
        bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode_bin<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Deserialization(e.to_string()))
    }

    // =========================================================================
    // Categorized entries
    // =========================================================================

    /// Insert-or-replace an entry for (key, category), writing cache and
    /// durable storage together.
    pub fn store(
        &self,
        key: &str,
        value: serde_json::Value,
        category: &str,
        ttl: Option<Duration>,
    ) -> StoreResult<MemoryEntry> {
        let entry = MemoryEntry::new(key, category, value, ttl);
        self.entries
            .insert(keys::entry(category, key).as_bytes(), Self::encode_json(&entry)?)?;

        let mut cache = self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
        cache.insert((category.to_string(), key.to_string()), entry.clone());

        trace!(key, category, ttl = ?ttl, "memory entry stored");
        Ok(entry)
    }

    /// Retrieve a value by key, checking the cache first. With no category
    /// the newest non-expired match across categories wins; either way the
    /// cache is hydrated with the row served.
    pub fn retrieve(&self, key: &str, category: Option<&str>) -> StoreResult<Option<serde_json::Value>> {
        let now = Utc::now();

        if let Some(cat) = category {
            let cache_key = (cat.to_string(), key.to_string());
            {
                let cache = self.cache.read().map_err(|_| StoreError::LockPoisoned)?;
                if let Some(entry) = cache.get(&cache_key) {
                    if !entry.is_expired_at(now) {
                        return Ok(Some(entry.value.clone()));
                    }
                }
            }

            match self.entries.get(keys::entry(cat, key).as_bytes())? {
                Some(bytes) => {
                    let entry: MemoryEntry = Self::decode_json(&bytes)?;
                    if entry.is_expired_at(now) {
                        let mut cache =
                            self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
                        cache.remove(&cache_key);
                        return Ok(None);
                    }
                    let value = entry.value.clone();
                    let mut cache = self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
                    cache.insert(cache_key, entry);
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        } else {
            // Cross-category lookup: newest non-expired row for this key.
            let mut newest: Option<MemoryEntry> = None;
            for item in self.entries.iter() {
                let (_, bytes) = item?;
                let entry: MemoryEntry = Self::decode_json(&bytes)?;
                if entry.key != key || entry.is_expired_at(now) {
                    continue;
                }
                if newest
                    .as_ref()
                    .map(|n| entry.created_at > n.created_at)
                    .unwrap_or(true)
                {
                    newest = Some(entry);
                }
            }
            match newest {
                Some(entry) => {
                    let value = entry.value.clone();
                    let mut cache = self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
                    cache.insert((entry.category.clone(), entry.key.clone()), entry);
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Delete an entry, returning whether a row existed.
    pub fn delete(&self, key: &str, category: &str) -> StoreResult<bool> {
        let removed = self.entries.remove(keys::entry(category, key).as_bytes())?;
        let mut cache = self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
        cache.remove(&(category.to_string(), key.to_string()));
        Ok(removed.is_some())
    }

    /// List non-expired entries, newest-first, optionally narrowed to a
    /// category and a glob-style key pattern (`*`, `?`).
    pub fn list(
        &self,
        category: Option<&str>,
        pattern: Option<&str>,
    ) -> StoreResult<Vec<MemoryEntry>> {
        let now = Utc::now();
        let prefix = match category {
            Some(cat) => keys::entry_prefix(cat),
            None => "ent:".to_string(),
        };

        let mut entries = Vec::new();
        for item in self.entries.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item?;
            let entry: MemoryEntry = Self::decode_json(&bytes)?;
            if entry.is_expired_at(now) {
                continue;
            }
            if let Some(pat) = pattern {
                if !glob_match(pat, &entry.key) {
                    continue;
                }
            }
            entries.push(entry);
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    // =========================================================================
    // Workflow memory
    // =========================================================================

    /// Persist one row per workflow id (insert-or-replace).
    pub fn store_workflow_memory(&self, memory: &WorkflowMemory) -> StoreResult<()> {
        self.workflows.insert(
            keys::workflow(&memory.workflow_id).as_bytes(),
            Self::encode_json(memory)?,
        )?;
        Ok(())
    }

    /// Fetch a workflow memory row.
    pub fn get_workflow_memory(&self, workflow_id: &str) -> StoreResult<Option<WorkflowMemory>> {
        match self.workflows.get(keys::workflow(workflow_id).as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode_json(&bytes)?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Agent snapshots
    // =========================================================================

    /// Persist one snapshot row per agent id (insert-or-replace).
    pub fn update_agent_state(&self, agent: &Agent) -> StoreResult<()> {
        let snapshot = AgentSnapshot::new(agent.clone());
        self.agents
            .insert(keys::agent(&agent.id).as_bytes(), Self::encode_bin(&snapshot)?)?;
        Ok(())
    }

    /// Fetch the latest snapshot for an agent.
    pub fn get_agent_state(&self, agent_id: &str) -> StoreResult<Option<AgentSnapshot>> {
        match self.agents.get(keys::agent(agent_id).as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode_bin(&bytes)?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Coordination event log
    // =========================================================================

    /// Append one audit event (JSON-encoded, never mutated).
    pub fn log_event(&self, event: &CoordinationEvent) -> StoreResult<()> {
        let nanos = event.timestamp.timestamp_nanos_opt().unwrap_or(0);
        let key = keys::event(nanos, &event.id);
        let bytes =
            serde_json::to_vec(event).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.events.insert(key.as_bytes(), bytes)?;
        debug!(event_type = %event.event_type, "coordination event logged");
        Ok(())
    }

    /// Query the event log, newest-first, applying the filter and limit.
    pub fn events(&self, query: &EventQuery) -> StoreResult<Vec<CoordinationEvent>> {
        let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
        let mut out = Vec::new();

        for item in self.events.iter().rev() {
            let (_, bytes) = item?;
            let event: CoordinationEvent = serde_json::from_slice(&bytes)
                .map_err(|e| StoreError::Deserialization(e.to_string()))?;
            if query.matches(&event) {
                out.push(event);
                if out.len() >= limit {
                    break;
                }
            }
        }

        Ok(out)
    }

    // =========================================================================
    // Expiry sweep
    // =========================================================================

    /// Delete expired durable rows and evict matching cache entries,
    /// returning how many rows were purged.
    pub fn sweep_expired(&self) -> StoreResult<usize> {
        let now = Utc::now();
        let mut purged = Vec::new();

        for item in self.entries.iter() {
            let (key, bytes) = item?;
            let entry: MemoryEntry = Self::decode_json(&bytes)?;
            if entry.is_expired_at(now) {
                purged.push((key.to_vec(), entry));
            }
        }

        let count = purged.len();
        if count > 0 {
            let mut cache = self.cache.write().map_err(|_| StoreError::LockPoisoned)?;
            for (key, entry) in purged {
                self.entries.remove(key)?;
                cache.remove(&(entry.category, entry.key));
            }
            debug!(count, "swept expired memory entries");
        }

        Ok(count)
    }

    /// Spawn the periodic expiry sweep (baseline: 60s interval).
    pub fn start_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = store.sweep_expired() {
                    warn!("memory sweep failed: {}", e);
                }
            }
        })
    }

    /// Number of cached entries (visible for tests and diagnostics).
    pub fn cache_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}
