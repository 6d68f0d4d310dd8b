//! Short-lived in-memory storage for uploaded images
//!
//! Records are keyed by a random v4 UUID and expire `ttl` after insertion.
//! Expiry is enforced twice: `get` hides records past their TTL, and a
//! [`BlobSweeper`] task removes them from the map on a fixed interval.
//! A relay session that references a record holds a [`BlobLease`], which
//! deletes the record when the session ends, however it ends.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Clone)]
pub struct BlobRecord {
    pub id: String,
    /// Base64 of the uploaded bytes, ready to drop into a data URI
    pub payload: String,
    pub mime_type: String,
    pub created_at: Instant,
}

impl BlobRecord {
    /// Decoded size estimated from the encoded length
    pub fn approx_decoded_len(&self) -> usize {
        self.payload.len() * 3 / 4
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.payload)
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }
}

pub struct BlobStore {
    records: Mutex<HashMap<String, Arc<BlobRecord>>>,
    ttl: Duration,
}

impl BlobStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn put(&self, payload: &[u8], mime_type: Option<&str>) -> String {
        self.put_at(payload, mime_type, Instant::now())
    }

    pub fn put_at(&self, payload: &[u8], mime_type: Option<&str>, now: Instant) -> String {
        let id = Uuid::new_v4().to_string();
        let record = BlobRecord {
            id: id.clone(),
            payload: STANDARD.encode(payload),
            mime_type: normalize_mime(mime_type),
            created_at: now,
        };

        self.records.lock().insert(id.clone(), Arc::new(record));
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<BlobRecord>> {
        self.get_at(id, Instant::now())
    }

    /// Lookup only; never refreshes or removes the record
    pub fn get_at(&self, id: &str, now: Instant) -> Option<Arc<BlobRecord>> {
        let records = self.records.lock();
        records
            .get(id)
            .filter(|record| !record.is_expired(now, self.ttl))
            .cloned()
    }

    /// Removing an unknown id is a no-op
    pub fn delete(&self, id: &str) -> bool {
        self.records.lock().remove(id).is_some()
    }

    /// Drops every record older than the TTL, returns how many went
    pub fn sweep(&self, now: Instant) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now, self.ttl));
        before - records.len()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tie the lifetime of record `id` to the returned guard
    pub fn lease(self: &Arc<Self>, id: impl Into<String>) -> BlobLease {
        BlobLease {
            store: Arc::clone(self),
            id: id.into(),
        }
    }
}

/// Unknown or generic content types fall back to a safe image type
fn normalize_mime(mime_type: Option<&str>) -> String {
    match mime_type.map(str::trim) {
        Some(mime) if mime.starts_with("image/") => mime.to_string(),
        _ => DEFAULT_MIME_TYPE.to_string(),
    }
}

/// Deletes its record from the store when dropped
pub struct BlobLease {
    store: Arc<BlobStore>,
    id: String,
}

impl BlobLease {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for BlobLease {
    fn drop(&mut self) {
        if self.store.delete(&self.id) {
            tracing::debug!("Released upload {}", self.id);
        }
    }
}

/// Background task evicting expired uploads
pub struct BlobSweeper {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl BlobSweeper {
    pub fn start(store: Arc<BlobStore>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(interval = ?interval, "Starting upload sweeper");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = token.cancelled() => {
                        tracing::info!("Upload sweeper shutting down");
                        return;
                    }
                }

                let evicted = store.sweep(Instant::now());
                if evicted > 0 {
                    tracing::info!(evicted, remaining = store.len(), "Evicted expired uploads");
                }
            }
        });

        Self { shutdown, handle }
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!("Upload sweeper ended abnormally: {}", e);
        }
    }
}
