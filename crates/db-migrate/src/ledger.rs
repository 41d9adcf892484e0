//! Migration ledger.
//!
//! The ledger is the `migration` table: one row per migration name that has
//! completed, ever. Name uniqueness is enforced by the table itself, which is
//! what makes concurrent runners fail loudly instead of applying twice.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::operations::CreateTable;
use crate::session::Session;
use crate::statement::{Row, Value};

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "migration";

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationRecord {
    /// Row id.
    pub id: i64,
    /// Migration name.
    pub name: String,
    /// When the migration was applied.
    pub created_at: DateTime<Utc>,
    /// Last update; equal to `created_at` as records are never rewritten.
    pub updated_at: DateTime<Utc>,
}

/// Declaration of the ledger table.
#[must_use]
pub fn ledger_table() -> CreateTable {
    let mut table = CreateTable::new(LEDGER_TABLE);
    table.if_not_exists();
    table.primary_key();
    table.column("name", "TEXT").not_null().unique().index();
    table.timestamps();
    table
}

/// Reads and appends ledger rows through a session.
#[derive(Debug)]
pub struct Ledger<'a, S> {
    session: &'a mut S,
}

impl<'a, S: Session> Ledger<'a, S> {
    /// Wraps a session.
    pub fn new(session: &'a mut S) -> Self {
        Self { session }
    }

    /// Creates the ledger table and its name index if they are missing.
    pub async fn ensure(&mut self) -> Result<()> {
        for statement in ledger_table().statements(&*self.session)? {
            self.session.call(&statement).await?;
        }
        Ok(())
    }

    /// Returns true if a migration with exactly this name was recorded.
    pub async fn contains(&mut self, name: &str) -> Result<bool> {
        let mut statement = self.session.clause("SELECT");
        statement
            .identifier("id")
            .clause("FROM")
            .identifier(LEDGER_TABLE)
            .clause("WHERE")
            .identifier("name")
            .clause("=")
            .literal(name);

        let rows = self.session.call(&statement).await?;
        Ok(!rows.is_empty())
    }

    /// Appends a record for `name`, stamped with the current time.
    ///
    /// A unique violation means another runner recorded the same name first
    /// and is reported as [`MigrateError::DuplicateName`].
    pub async fn record(&mut self, name: &str) -> Result<()> {
        let now = Utc::now();

        let mut statement = self.session.clause("INSERT INTO");
        statement
            .identifier(LEDGER_TABLE)
            .identifier_list(["name", "created_at", "updated_at"])
            .clause("VALUES")
            .clause("(")
            .literal(name)
            .clause(",")
            .literal(now)
            .clause(",")
            .literal(now)
            .clause(")");

        match self.session.call(&statement).await {
            Ok(_) => {
                debug!(migration = %name, "Recorded migration");
                Ok(())
            }
            Err(error) if error.is_unique_violation() => {
                Err(MigrateError::DuplicateName(name.to_string()))
            }
            Err(error) => Err(error),
        }
    }

    /// Returns every record, oldest first.
    pub async fn records(&mut self) -> Result<Vec<MigrationRecord>> {
        let mut statement = self.session.clause("SELECT");
        statement
            .identifier("id")
            .clause(",")
            .identifier("name")
            .clause(",")
            .identifier("created_at")
            .clause(",")
            .identifier("updated_at")
            .clause("FROM")
            .identifier(LEDGER_TABLE)
            .clause("ORDER BY")
            .identifier("id");

        self.session
            .call(&statement)
            .await?
            .into_iter()
            .map(decode_record)
            .collect()
    }

    /// Counts the records.
    pub async fn count(&mut self) -> Result<i64> {
        let mut statement = self.session.clause("SELECT COUNT(*) FROM");
        statement.identifier(LEDGER_TABLE);

        let rows = self.session.call(&statement).await?;
        rows.first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .ok_or_else(|| MigrateError::InvalidRecord("COUNT(*) returned no integer".into()))
    }
}

fn decode_record(row: Row) -> Result<MigrationRecord> {
    let [id, name, created_at, updated_at]: [Value; 4] = row.try_into().map_err(|row: Row| {
        MigrateError::InvalidRecord(format!("expected 4 columns, got {}", row.len()))
    })?;

    let id = id
        .as_i64()
        .ok_or_else(|| MigrateError::InvalidRecord(format!("id is not an integer: {id:?}")))?;
    let name = match name {
        Value::Text(name) => name,
        other => {
            return Err(MigrateError::InvalidRecord(format!(
                "name of record {id} is not text: {other:?}"
            )));
        }
    };

    Ok(MigrationRecord {
        id,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
        name,
    })
}

fn decode_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Timestamp(at) => Ok(*at),
        Value::Text(text) => parse_timestamp(text),
        other => Err(MigrateError::InvalidRecord(format!(
            "timestamp is not text: {other:?}"
        ))),
    }
}

/// Parses RFC 3339, falling back to SQLite's `datetime()` format.
fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").map(|at| at.and_utc())
        })
        .map_err(|_| MigrateError::InvalidRecord(format!("invalid timestamp: {text}")))
}
