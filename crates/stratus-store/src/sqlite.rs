//! SQLite-based record storage implementation.
//!
//! This module provides `SqliteRecordStore`, the local SQLite
//! implementation of the `RecordStore` trait. Every mutation runs inside
//! a scoped `rusqlite` transaction; dropping the transaction on an early
//! return rolls the write back.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::record::{ListFilter, NewRecord, WeatherRecord};
use crate::store::{RecordStore, StoreError, StoreResult};
use stratus_weather::TemperatureData;

const RECORD_COLUMNS: &str = "id, location, latitude, longitude, start_date, end_date, \
     temperature_data, created_at, updated_at";

/// SQLite-based record storage.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Create a record store at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Fails when the file cannot be opened or the schema cannot be
    /// applied.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory record store (tests, ephemeral runs).
    ///
    /// # Errors
    /// Fails when the schema cannot be applied.
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                temperature_data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_weather_records_location
                ON weather_records(location);
            CREATE INDEX IF NOT EXISTS idx_weather_records_start_date
                ON weather_records(start_date);
            "#,
        )?;
        Ok(())
    }

    /// Convert a database row to a WeatherRecord.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<WeatherRecord> {
        let id: i64 = row.get(0)?;
        let location: String = row.get(1)?;
        let latitude: f64 = row.get(2)?;
        let longitude: f64 = row.get(3)?;
        let start_str: String = row.get(4)?;
        let end_str: String = row.get(5)?;
        let payload_str: String = row.get(6)?;
        let created_at_str: String = row.get(7)?;
        let updated_at_str: String = row.get(8)?;

        let start_date = parse_stored_date(&start_str, 4)?;
        let end_date = parse_stored_date(&end_str, 5)?;

        let temperature_data: TemperatureData =
            serde_json::from_str(&payload_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(WeatherRecord {
            id,
            location,
            latitude,
            longitude,
            start_date,
            end_date,
            temperature_data,
            created_at,
            updated_at,
        })
    }

    /// Check if a record exists by ID.
    pub fn exists(&self, id: i64) -> StoreResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM weather_records WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::storage(e.to_string()))?;
        Ok(count > 0)
    }
}

fn parse_stored_date(raw: &str, column: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn encode_payload(data: &TemperatureData) -> StoreResult<String> {
    serde_json::to_string(data)
        .map_err(|e| StoreError::storage(format!("failed to encode temperature data: {e}")))
}

impl RecordStore for SqliteRecordStore {
    fn create(&mut self, record: NewRecord) -> StoreResult<WeatherRecord> {
        let payload = encode_payload(&record.temperature_data)?;
        let now = Utc::now();
        let stamp = now.to_rfc3339();

        let tx =
            self.conn.transaction().map_err(|e| StoreError::storage(e.to_string()))?;
        tx.execute(
            r#"
            INSERT INTO weather_records
                (location, latitude, longitude, start_date, end_date,
                 temperature_data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.location,
                record.latitude,
                record.longitude,
                record.start_date.to_string(),
                record.end_date.to_string(),
                payload,
                stamp,
                stamp,
            ],
        )
        .map_err(|e| StoreError::storage(e.to_string()))?;

        let id = tx.last_insert_rowid();
        tx.commit().map_err(|e| StoreError::storage(e.to_string()))?;

        tracing::debug!(id, "created weather record");

        Ok(WeatherRecord {
            id,
            location: record.location,
            latitude: record.latitude,
            longitude: record.longitude,
            start_date: record.start_date,
            end_date: record.end_date,
            temperature_data: record.temperature_data,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: i64) -> StoreResult<Option<WeatherRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM weather_records WHERE id = ?1"
            ))
            .map_err(|e| StoreError::storage(e.to_string()))?;

        let mut rows =
            stmt.query(params![id]).map_err(|e| StoreError::storage(e.to_string()))?;

        match rows.next().map_err(|e| StoreError::storage(e.to_string()))? {
            Some(row) => Ok(Some(
                Self::row_to_record(row).map_err(|e| StoreError::storage(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    fn list(&self, filter: &ListFilter) -> StoreResult<Vec<WeatherRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                r#"
                SELECT {RECORD_COLUMNS} FROM weather_records
                WHERE (?1 IS NULL OR LOWER(location) LIKE '%' || LOWER(?1) || '%')
                  AND (?2 IS NULL OR start_date >= ?2)
                ORDER BY id ASC
                LIMIT ?3 OFFSET ?4
                "#
            ))
            .map_err(|e| StoreError::storage(e.to_string()))?;

        let start = filter.start_date.map(|d| d.to_string());
        let rows = stmt
            .query_map(
                params![
                    filter.location,
                    start,
                    i64::from(filter.effective_limit()),
                    i64::from(filter.effective_offset()),
                ],
                Self::row_to_record,
            )
            .map_err(|e| StoreError::storage(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>().map_err(|e| StoreError::storage(e.to_string()))
    }

    fn list_all(&self) -> StoreResult<Vec<WeatherRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM weather_records ORDER BY id ASC"
            ))
            .map_err(|e| StoreError::storage(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_record)
            .map_err(|e| StoreError::storage(e.to_string()))?;

        rows.collect::<Result<Vec<_>, _>>().map_err(|e| StoreError::storage(e.to_string()))
    }

    fn update(&mut self, id: i64, fields: NewRecord) -> StoreResult<WeatherRecord> {
        let payload = encode_payload(&fields.temperature_data)?;
        let now = Utc::now();

        let tx =
            self.conn.transaction().map_err(|e| StoreError::storage(e.to_string()))?;

        // created_at survives the replace; its absence means the id is gone.
        let created_at_str: String = match tx.query_row(
            "SELECT created_at FROM weather_records WHERE id = ?1",
            params![id],
            |row| row.get(0),
        ) {
            Ok(value) => value,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Err(StoreError::NotFound(id)),
            Err(e) => return Err(StoreError::storage(e.to_string())),
        };

        tx.execute(
            r#"
            UPDATE weather_records
            SET location = ?1, latitude = ?2, longitude = ?3,
                start_date = ?4, end_date = ?5, temperature_data = ?6,
                updated_at = ?7
            WHERE id = ?8
            "#,
            params![
                fields.location,
                fields.latitude,
                fields.longitude,
                fields.start_date.to_string(),
                fields.end_date.to_string(),
                payload,
                now.to_rfc3339(),
                id,
            ],
        )
        .map_err(|e| StoreError::storage(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::storage(e.to_string()))?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        tracing::debug!(id, "updated weather record");

        Ok(WeatherRecord {
            id,
            location: fields.location,
            latitude: fields.latitude,
            longitude: fields.longitude,
            start_date: fields.start_date,
            end_date: fields.end_date,
            temperature_data: fields.temperature_data,
            created_at,
            updated_at: now,
        })
    }

    fn delete(&mut self, id: i64) -> StoreResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM weather_records WHERE id = ?1", params![id])
            .map_err(|e| StoreError::storage(e.to_string()))?;

        if affected == 0 {
            return Err(StoreError::NotFound(id));
        }

        tracing::debug!(id, "deleted weather record");
        Ok(())
    }

    fn clear_all(&mut self) -> StoreResult<usize> {
        let tx =
            self.conn.transaction().map_err(|e| StoreError::storage(e.to_string()))?;

        let count: i64 = tx
            .query_row("SELECT COUNT(*) FROM weather_records", [], |row| row.get(0))
            .map_err(|e| StoreError::storage(e.to_string()))?;
        tx.execute("DELETE FROM weather_records", [])
            .map_err(|e| StoreError::storage(e.to_string()))?;

        tx.commit().map_err(|e| StoreError::storage(e.to_string()))?;

        tracing::debug!(count, "cleared weather records");
        Ok(count as usize)
    }

    fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM weather_records", [], |row| row.get(0))
            .map_err(|e| StoreError::storage(e.to_string()))?;
        Ok(count as usize)
    }
}
