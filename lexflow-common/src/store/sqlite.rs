//! SQLite record store
//!
//! One `intakes` table whose column names are the record's storage keys.
//! `key_facts` is kept as a JSON array in a TEXT column, timestamps as
//! RFC 3339 text, booleans as INTEGER 0/1.
//!
//! Full scans use keyset pagination on `id`. Token lookups go through a
//! unique index on `access_token` instead of a filtered scan.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{error, info, warn};

use super::{RecordStore, ScanPage, StoreError};
use crate::classification::{CaseType, Urgency};
use crate::record::{CaseStatus, IntakeRecord};

const SELECT_COLUMNS: &str = "id, created_at, client_name, client_email, client_phone, \
    incident_date, raw_description, prior_attorney, case_type, viability_score, urgency, \
    statute_of_limitations_flag, key_facts, recommended_specialty, recommended_action, \
    client_acknowledgment, model_identifier, status, note, updated_at, access_token";

#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
    page_size: usize,
}

impl SqliteRecordStore {
    /// Open (creating if needed) the database file and ensure the schema exists
    pub async fn open(db_path: &Path, page_size: usize) -> Result<Self, StoreError> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        // WAL lets dashboard scans run alongside intake writes
        sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
        sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

        Self::from_pool(pool, page_size).await
    }

    /// Private in-memory database (single connection so it is not dropped)
    pub async fn in_memory(page_size: usize) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool, page_size).await
    }

    /// Wrap an existing pool and ensure the schema exists
    pub async fn from_pool(pool: SqlitePool, page_size: usize) -> Result<Self, StoreError> {
        create_intakes_table(&pool).await?;
        Ok(Self {
            pool,
            page_size: page_size.max(1),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn create_intakes_table(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS intakes (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            client_name TEXT NOT NULL,
            client_email TEXT NOT NULL,
            client_phone TEXT NOT NULL,
            incident_date TEXT NOT NULL,
            raw_description TEXT NOT NULL,
            prior_attorney INTEGER NOT NULL DEFAULT 0,
            case_type TEXT NOT NULL,
            viability_score INTEGER NOT NULL CHECK (viability_score BETWEEN 0 AND 10),
            urgency TEXT NOT NULL,
            statute_of_limitations_flag INTEGER NOT NULL DEFAULT 0,
            key_facts TEXT NOT NULL,
            recommended_specialty TEXT NOT NULL,
            recommended_action TEXT NOT NULL,
            client_acknowledgment TEXT NOT NULL,
            model_identifier TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'new',
            note TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL,
            access_token TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_intakes_access_token ON intakes(access_token)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn corrupt(id: &str, reason: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_timestamp(id: &str, column: &str, text: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corrupt(id, format!("{}: {}", column, e)))
}

/// Decode a stored label, falling back when it is outside the closed set
///
/// Rows written out of band or by older deployments can carry labels the
/// current vocabulary does not know. They still count on the dashboard.
fn stored_label<T: FromStr>(id: &str, column: &str, text: &str, fallback: T) -> T {
    text.parse().unwrap_or_else(|_| {
        warn!(intake_id = %id, column, value = %text, "Unrecognized stored label");
        fallback
    })
}

fn decode_row(row: &SqliteRow) -> Result<IntakeRecord, StoreError> {
    let id: String = row.try_get("id")?;

    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let case_type: String = row.try_get("case_type")?;
    let urgency: String = row.try_get("urgency")?;
    let status: String = row.try_get("status")?;
    let key_facts: String = row.try_get("key_facts")?;
    let viability_score: i64 = row.try_get("viability_score")?;

    Ok(IntakeRecord {
        created_at: parse_timestamp(&id, "created_at", &created_at)?,
        updated_at: parse_timestamp(&id, "updated_at", &updated_at)?,
        client_name: row.try_get("client_name")?,
        client_email: row.try_get("client_email")?,
        client_phone: row.try_get("client_phone")?,
        incident_date: row.try_get("incident_date")?,
        raw_description: row.try_get("raw_description")?,
        prior_attorney: row.try_get("prior_attorney")?,
        case_type: stored_label(&id, "case_type", &case_type, CaseType::Unknown),
        viability_score: u8::try_from(viability_score)
            .map_err(|_| corrupt(&id, format!("viability_score {}", viability_score)))?,
        urgency: stored_label(&id, "urgency", &urgency, Urgency::Unknown),
        statute_of_limitations_flag: row.try_get("statute_of_limitations_flag")?,
        key_facts: serde_json::from_str(&key_facts)
            .map_err(|e| corrupt(&id, format!("key_facts: {}", e)))?,
        recommended_specialty: row.try_get("recommended_specialty")?,
        recommended_action: row.try_get("recommended_action")?,
        client_acknowledgment: row.try_get("client_acknowledgment")?,
        model_identifier: row.try_get("model_identifier")?,
        status: stored_label(&id, "status", &status, CaseStatus::Unknown),
        note: row.try_get("note")?,
        access_token: row.try_get("access_token")?,
        id,
    })
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn put(&self, record: &IntakeRecord) -> Result<(), StoreError> {
        let key_facts = serde_json::to_string(&record.key_facts)
            .map_err(|e| corrupt(&record.id, format!("key_facts: {}", e)))?;

        let result = sqlx::query(
            r#"
            INSERT INTO intakes (
                id, created_at, client_name, client_email, client_phone, incident_date,
                raw_description, prior_attorney, case_type, viability_score, urgency,
                statute_of_limitations_flag, key_facts, recommended_specialty,
                recommended_action, client_acknowledgment, model_identifier, status, note,
                updated_at, access_token
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                created_at = excluded.created_at,
                client_name = excluded.client_name,
                client_email = excluded.client_email,
                client_phone = excluded.client_phone,
                incident_date = excluded.incident_date,
                raw_description = excluded.raw_description,
                prior_attorney = excluded.prior_attorney,
                case_type = excluded.case_type,
                viability_score = excluded.viability_score,
                urgency = excluded.urgency,
                statute_of_limitations_flag = excluded.statute_of_limitations_flag,
                key_facts = excluded.key_facts,
                recommended_specialty = excluded.recommended_specialty,
                recommended_action = excluded.recommended_action,
                client_acknowledgment = excluded.client_acknowledgment,
                model_identifier = excluded.model_identifier,
                status = excluded.status,
                note = excluded.note,
                updated_at = excluded.updated_at,
                access_token = excluded.access_token
            "#,
        )
        .bind(&record.id)
        .bind(record.created_at.to_rfc3339())
        .bind(&record.client_name)
        .bind(&record.client_email)
        .bind(&record.client_phone)
        .bind(&record.incident_date)
        .bind(&record.raw_description)
        .bind(record.prior_attorney)
        .bind(record.case_type.label())
        .bind(i64::from(record.viability_score))
        .bind(record.urgency.as_str())
        .bind(record.statute_of_limitations_flag)
        .bind(key_facts)
        .bind(&record.recommended_specialty)
        .bind(&record.recommended_action)
        .bind(&record.client_acknowledgment)
        .bind(&record.model_identifier)
        .bind(record.status.as_str())
        .bind(&record.note)
        .bind(record.updated_at.to_rfc3339())
        .bind(&record.access_token)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                info!(intake_id = %record.id, "Store write success");
                Ok(())
            }
            Err(e) => {
                error!(intake_id = %record.id, error = %e, "Store write failed");
                Err(e.into())
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<IntakeRecord>, StoreError> {
        let sql = format!("SELECT {} FROM intakes WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!(intake_id = %id, error = %e, "Store get failed");
                StoreError::from(e)
            })?;

        match row {
            Some(row) => decode_row(&row).map(Some),
            None => {
                warn!(intake_id = %id, "Store get - record not found");
                Ok(None)
            }
        }
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<IntakeRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM intakes WHERE access_token = ? LIMIT 1",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn scan_page(&self, cursor: Option<&str>) -> Result<ScanPage, StoreError> {
        // One extra row tells us whether another page exists
        let limit = (self.page_size + 1) as i64;

        let rows = match cursor {
            Some(after) => {
                let sql = format!(
                    "SELECT {} FROM intakes WHERE id > ? ORDER BY id LIMIT ?",
                    SELECT_COLUMNS
                );
                sqlx::query(&sql)
                    .bind(after)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!("SELECT {} FROM intakes ORDER BY id LIMIT ?", SELECT_COLUMNS);
                sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await
            }
        }
        .map_err(|e| {
            error!(error = %e, "Store scan failed");
            StoreError::from(e)
        })?;

        let mut records = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if records.len() > self.page_size {
            records.truncate(self.page_size);
            records.last().map(|record| record.id.clone())
        } else {
            None
        };

        Ok(ScanPage {
            records,
            next_cursor,
        })
    }

    async fn update_status(
        &self,
        id: &str,
        status: CaseStatus,
        note: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        // The WHERE clause is the existence condition: a missing id matches
        // no row, so nothing is written and rows_affected is zero.
        let result = sqlx::query(
            "UPDATE intakes SET status = ?, note = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(note)
        .bind(updated_at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(intake_id = %id, error = %e, "Status update failed");
            StoreError::from(e)
        })?;

        if result.rows_affected() == 0 {
            warn!(intake_id = %id, "Status update failed - intake_id not found");
            return Err(StoreError::NotFound(id.to_string()));
        }

        info!(intake_id = %id, status = %status, "Status updated");
        Ok(())
    }
}
