use crate::record::{StoredRecord, DEFAULT_TTL};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone, Default, Eq, PartialEq)]
pub(super) struct CreateRecordRequest {
    pub domain: String,
    pub qtype: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    pub value: String,
}

impl CreateRecordRequest {
    /// The normalized record to store. A missing or zero TTL falls back to [`DEFAULT_TTL`].
    pub fn into_record(self) -> StoredRecord {
        let ttl = self.ttl.filter(|ttl| *ttl > 0).unwrap_or(DEFAULT_TTL);
        StoredRecord::new(self.domain, self.qtype, ttl, self.value)
    }
}

#[derive(Deserialize, Debug, Clone, Default, Eq, PartialEq)]
pub(super) struct UpdateTtlRequest {
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, Default, Eq, PartialEq)]
pub(super) struct DeleteRecordsResult {
    pub deleted: u64,
}

#[derive(Serialize, Debug, Clone, Default, Eq, PartialEq)]
pub(super) struct EvictResult {
    pub evicted: bool,
}
