//! A SQLite-backed implementation of the [`RecordStore`][super::RecordStore] trait.
//!
//! Records live in `dns_records`, unique on `(domain, qtype, value)`. Hit counters live in
//! `dns_metrics`, keyed by `(domain, qtype)`.
use crate::error::Error;
use crate::record::{StoredRecord, WILDCARD_QTYPE};
use crate::store::RecordStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{error, instrument};

type RecordRow = (String, String, i64, String);

const CREATE_RECORDS: &str = "CREATE TABLE IF NOT EXISTS dns_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    qtype TEXT NOT NULL,
    ttl INTEGER NOT NULL,
    value TEXT NOT NULL,
    UNIQUE(domain, qtype, value)
)";

const CREATE_METRICS: &str = "CREATE TABLE IF NOT EXISTS dns_metrics (
    domain TEXT NOT NULL,
    qtype TEXT NOT NULL,
    hits INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY(domain, qtype)
)";

#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Wrap an existing pool. The schema is not touched; see [`SqliteRecordStore::ensure_schema`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and ensure the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the database can't be opened or the schema can't be
    /// created.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create the record and metric tables if they don't exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if either statement fails.
    pub async fn ensure_schema(&self) -> Result<(), Error> {
        sqlx::query(CREATE_RECORDS).execute(&self.pool).await?;
        sqlx::query(CREATE_METRICS).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: RecordRow) -> Result<StoredRecord, Error> {
        let (domain, qtype, ttl, value) = row;
        let ttl = u32::try_from(ttl).map_err(|_| {
            Error::Database(sqlx::Error::Decode(
                format!("ttl {ttl} for {domain} {qtype} is out of range").into(),
            ))
        })?;
        Ok(StoredRecord {
            domain,
            qtype,
            ttl,
            value,
        })
    }

    fn rows_to_records(rows: Vec<RecordRow>) -> Result<Vec<StoredRecord>, Error> {
        rows.into_iter().map(Self::row_to_record).collect()
    }
}

#[async_trait::async_trait]
impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self))]
    async fn upsert(&self, record: &StoredRecord) -> Result<(), Error> {
        let record = record.clone().normalized();
        sqlx::query(
            "INSERT INTO dns_records (domain, qtype, ttl, value) VALUES (?, ?, ?, ?)
             ON CONFLICT (domain, qtype, value) DO UPDATE SET ttl = excluded.ttl",
        )
        .bind(&record.domain)
        .bind(&record.qtype)
        .bind(i64::from(record.ttl))
        .bind(&record.value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to upsert record");
            e
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn lookup(&self, domain: &str, qtype: &str) -> Result<Vec<StoredRecord>, Error> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT domain, qtype, ttl, value FROM dns_records
             WHERE domain = ? AND (qtype = ? OR ? = ?)
             ORDER BY id ASC",
        )
        .bind(domain)
        .bind(qtype)
        .bind(qtype)
        .bind(WILDCARD_QTYPE)
        .fetch_all(&self.pool)
        .await?;
        Self::rows_to_records(rows)
    }

    #[instrument(skip(self))]
    async fn scan_all(&self) -> Result<Vec<StoredRecord>, Error> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT domain, qtype, ttl, value FROM dns_records ORDER BY domain, qtype, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Self::rows_to_records(rows)
    }

    #[instrument(skip(self))]
    async fn delete(&self, domain: &str, qtype: &str) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM dns_records WHERE domain = ? AND qtype = ?")
            .bind(domain)
            .bind(qtype)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn increment_hits(&self, domain: &str, qtype: &str) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO dns_metrics (domain, qtype, hits) VALUES (?, ?, 1)
             ON CONFLICT (domain, qtype) DO UPDATE SET hits = dns_metrics.hits + 1",
        )
        .bind(domain)
        .bind(qtype)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_hits(&self, domain: &str, qtype: &str) -> Result<Option<u64>, Error> {
        let row = sqlx::query_as::<_, (i64,)>(
            "SELECT hits FROM dns_metrics WHERE domain = ? AND qtype = ?",
        )
        .bind(domain)
        .bind(qtype)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(hits,)| u64::try_from(hits).unwrap_or_default()))
    }
}
