//! Conversation → remote thread cache.
//!
//! Conversations are long-lived client identifiers; threads are the agent
//! service's server-side state. The cache bounds how many remote threads
//! the gateway keeps alive: least-recently-used entries are evicted at
//! capacity and entries older than the TTL expire lazily. Whenever an
//! entry leaves the cache through eviction or expiry, deletion of the
//! remote thread is scheduled exactly once on the runtime; an explicit
//! `remove` hands ownership of the thread id back to the caller and
//! schedules nothing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use tt_agents::AgentClient;
use tt_domain::config::ThreadCacheConfig;

pub struct ThreadCache {
    agent: Arc<dyn AgentClient>,
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Recency index: sequence number → conversation id. The smallest
    /// key is always the least recently used entry.
    recency: BTreeMap<u64, String>,
    next_seq: u64,
}

struct Entry {
    thread_id: String,
    inserted_at: Instant,
    seq: u64,
}

impl Inner {
    fn remove(&mut self, conversation_id: &str) -> Option<Entry> {
        let entry = self.entries.remove(conversation_id)?;
        self.recency.remove(&entry.seq);
        Some(entry)
    }

    fn touch(&mut self, conversation_id: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(entry) = self.entries.get_mut(conversation_id) {
            self.recency.remove(&entry.seq);
            entry.seq = seq;
            self.recency.insert(seq, conversation_id.to_owned());
        }
    }
}

impl ThreadCache {
    pub fn new(agent: Arc<dyn AgentClient>, cfg: &ThreadCacheConfig) -> Self {
        Self {
            agent,
            capacity: cfg.capacity,
            ttl: Duration::from_secs(cfg.ttl_secs),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Look up the remote thread for a conversation.
    ///
    /// A hit refreshes the entry's recency but not its TTL: lifetime is
    /// measured from insertion. An entry found past its TTL is removed,
    /// its remote cleanup is scheduled, and the lookup reports a miss.
    pub fn get(&self, conversation_id: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(conversation_id) {
            None => return None,
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
        };
        if expired {
            let stale = inner.remove(conversation_id);
            drop(inner);
            if let Some(entry) = stale {
                tracing::debug!(
                    conversation_id = %conversation_id,
                    thread_id = %entry.thread_id,
                    "thread cache entry expired"
                );
                self.schedule_cleanup(entry.thread_id);
            }
            return None;
        }
        inner.touch(conversation_id);
        inner
            .entries
            .get(conversation_id)
            .map(|e| e.thread_id.clone())
    }

    /// Insert or replace the mapping for a conversation.
    ///
    /// Expired entries are swept first so stale mappings never count
    /// against capacity. If the insert still exceeds capacity, the least
    /// recently used entries are evicted. Every swept, evicted, or
    /// replaced thread gets its remote cleanup scheduled once.
    pub fn put(&self, conversation_id: &str, thread_id: &str) {
        let mut cleanups: Vec<String> = Vec::new();
        {
            let mut inner = self.inner.lock();

            let stale: Vec<String> = inner
                .entries
                .iter()
                .filter(|(_, e)| e.inserted_at.elapsed() >= self.ttl)
                .map(|(k, _)| k.clone())
                .collect();
            for key in stale {
                if let Some(entry) = inner.remove(&key) {
                    cleanups.push(entry.thread_id);
                }
            }

            if let Some(old) = inner.remove(conversation_id) {
                if old.thread_id != thread_id {
                    cleanups.push(old.thread_id);
                }
            }

            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.recency.insert(seq, conversation_id.to_owned());
            inner.entries.insert(
                conversation_id.to_owned(),
                Entry {
                    thread_id: thread_id.to_owned(),
                    inserted_at: Instant::now(),
                    seq,
                },
            );

            while inner.entries.len() > self.capacity {
                let oldest = inner.recency.iter().next().map(|(_, k)| k.clone());
                let Some(key) = oldest else { break };
                if let Some(entry) = inner.remove(&key) {
                    tracing::debug!(
                        conversation_id = %key,
                        thread_id = %entry.thread_id,
                        "thread cache evicted least recently used entry"
                    );
                    cleanups.push(entry.thread_id);
                }
            }
        }
        for thread_id in cleanups {
            self.schedule_cleanup(thread_id);
        }
    }

    /// Remove a mapping and hand its thread id to the caller.
    ///
    /// No remote cleanup is scheduled; the caller owns what happens to
    /// the thread next.
    pub fn remove(&self, conversation_id: &str) -> Option<String> {
        self.inner
            .lock()
            .remove(conversation_id)
            .map(|e| e.thread_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete the remote thread on the runtime, off the caller's path.
    /// Without a runtime the deletion is logged and dropped; the remote
    /// service's own retention will reap the thread eventually.
    fn schedule_cleanup(&self, thread_id: String) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let agent = Arc::clone(&self.agent);
                handle.spawn(async move {
                    if let Err(e) = agent.delete_thread(&thread_id).await {
                        tracing::warn!(
                            thread_id = %thread_id,
                            error = %e,
                            "remote thread cleanup failed"
                        );
                    }
                });
            }
            Err(e) => {
                tracing::warn!(
                    thread_id = %thread_id,
                    error = %e,
                    "could not schedule remote thread cleanup"
                );
            }
        }
    }
}
