//! Main store implementation.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use loctrack_types::{LocationSample, NewSample};

use crate::error::{Error, Result};
use crate::queries::SampleQuery;
use crate::schema;

/// SQLite-based, append-only store for location samples.
///
/// There is no update or delete operation: a sample is written once and
/// read many times. Retention is unbounded.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Append a sample and return its newly assigned id.
    pub fn append(&self, sample: &NewSample) -> Result<i64> {
        if sample.address.is_empty() {
            return Err(Error::EmptyAddress);
        }

        self.conn.execute(
            "INSERT INTO location_samples (latitude, longitude, address, timestamp, formatted_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                sample.latitude,
                sample.longitude,
                sample.address,
                sample.timestamp,
                sample.formatted_time,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Appended sample {} at {}", id, sample.timestamp);
        Ok(id)
    }

    /// The latest sample, or `None` when the store is empty.
    pub fn most_recent(&self) -> Result<Option<LocationSample>> {
        let sql = SampleQuery::new().limit(1).build_sql();
        let sample = self.conn.query_row(&sql, [], sample_from_row).optional()?;
        Ok(sample)
    }

    /// Every stored sample, newest first.
    pub fn list_all(&self) -> Result<Vec<LocationSample>> {
        self.query_samples(&SampleQuery::new())
    }

    /// Samples with `timestamp >= start_ms`, newest first.
    ///
    /// The caller picks the boundary (e.g. local midnight); the store does no
    /// calendar math.
    pub fn list_since(&self, start_ms: i64) -> Result<Vec<LocationSample>> {
        self.query_samples(&SampleQuery::new().since(start_ms))
    }

    /// Query samples with filters.
    pub fn query_samples(&self, query: &SampleQuery) -> Result<Vec<LocationSample>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let samples = stmt
            .query_map(rusqlite::params_from_iter(params), sample_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(samples)
    }

    /// Total number of stored samples.
    pub fn count_samples(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM location_samples", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<LocationSample> {
    Ok(LocationSample {
        id: row.get(0)?,
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        address: row.get(3)?,
        timestamp: row.get(4)?,
        formatted_time: row.get(5)?,
    })
}
