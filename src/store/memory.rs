use crate::error::Error;
use crate::record::{StoredRecord, WILDCARD_QTYPE};
use crate::store::RecordStore;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A volatile [`RecordStore`]. Records are kept in insertion order per domain.
#[derive(Default, Debug)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, Vec<StoredRecord>>>,
    hits: RwLock<HashMap<(String, String), u64>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records`.
    pub async fn with_records(records: impl IntoIterator<Item = StoredRecord>) -> Self {
        let store = Self::new();
        for record in records {
            // NB: the in-memory upsert never fails.
            let _ = store.upsert(&record).await;
        }
        store
    }
}

fn matches_qtype(record: &StoredRecord, qtype: &str) -> bool {
    qtype == WILDCARD_QTYPE || record.qtype == qtype
}

#[async_trait::async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn upsert(&self, record: &StoredRecord) -> Result<(), Error> {
        let record = record.clone().normalized();
        let mut records = self.records.write().await;
        let domain_records = records.entry(record.domain.clone()).or_default();
        match domain_records.iter_mut().find(|r| r.same_identity(&record)) {
            Some(existing) => existing.ttl = record.ttl,
            None => domain_records.push(record),
        }
        Ok(())
    }

    async fn lookup(&self, domain: &str, qtype: &str) -> Result<Vec<StoredRecord>, Error> {
        Ok(self
            .records
            .read()
            .await
            .get(domain)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches_qtype(r, qtype))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn scan_all(&self) -> Result<Vec<StoredRecord>, Error> {
        let records = self.records.read().await;
        let mut all: Vec<StoredRecord> = records.values().flatten().cloned().collect();
        all.sort_by(|a, b| (&a.domain, &a.qtype).cmp(&(&b.domain, &b.qtype)));
        Ok(all)
    }

    async fn delete(&self, domain: &str, qtype: &str) -> Result<u64, Error> {
        let mut records = self.records.write().await;
        let Some(domain_records) = records.get_mut(domain) else {
            return Ok(0);
        };
        let before = domain_records.len();
        domain_records.retain(|r| r.qtype != qtype);
        let removed = before - domain_records.len();
        if domain_records.is_empty() {
            records.remove(domain);
        }
        Ok(removed as u64)
    }

    async fn increment_hits(&self, domain: &str, qtype: &str) -> Result<(), Error> {
        *self
            .hits
            .write()
            .await
            .entry((domain.to_string(), qtype.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }

    async fn read_hits(&self, domain: &str, qtype: &str) -> Result<Option<u64>, Error> {
        Ok(self
            .hits
            .read()
            .await
            .get(&(domain.to_string(), qtype.to_string()))
            .copied())
    }
}
