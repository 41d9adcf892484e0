//! SQLite sessions backed by `sqlx`.
//!
//! SQLite has no `information_schema`, no column-level `IF EXISTS` and no way
//! to change a column's type in place; its [`DialectFeatures`] reflect that.
//! DDL is transactional, so a failed migration leaves no trace.
//!
//! Identifiers are quoted with backticks: SQLite reads a double-quoted name
//! that matches no column as a string literal, which would let statements
//! naming a dropped or misspelled column succeed.

use std::ops::DerefMut;
use std::str::FromStr;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row as _, Sqlite, Transaction};
use tracing::{debug, warn};

use super::{KeyColumn, QuoteStyle, Session, TableCatalog};
use crate::error::{MigrateError, Result};
use crate::executor::{Migration, MigrationOutcome};
use crate::features::DialectFeatures;
use crate::schema::Schema;
use crate::statement::{Identifier, Row, Statement, Value};

/// A session over a single SQLite connection or transaction.
#[derive(Debug)]
pub struct SqliteSession<C> {
    conn: C,
    features: DialectFeatures,
}

impl<C> SqliteSession<C>
where
    C: DerefMut<Target = SqliteConnection> + Send,
{
    /// Wraps a connection, pooled connection or transaction.
    pub const fn new(conn: C, features: DialectFeatures) -> Self {
        Self { conn, features }
    }

    /// Returns the underlying connection.
    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl SqliteSession<Transaction<'static, Sqlite>> {
    /// Commits the transaction.
    pub async fn commit(self) -> Result<()> {
        self.conn.commit().await?;
        Ok(())
    }

    /// Rolls the transaction back.
    pub async fn rollback(self) -> Result<()> {
        self.conn.rollback().await?;
        Ok(())
    }
}

impl<C> Session for SqliteSession<C>
where
    C: DerefMut<Target = SqliteConnection> + Send,
{
    fn features(&self) -> &DialectFeatures {
        &self.features
    }

    async fn call(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        let sql = self.render(statement);
        debug!(sql = %sql, "Executing SQL");

        let rows = match sqlx::query(&sql).fetch_all(&mut *self.conn).await {
            Ok(rows) => rows,
            Err(error) => return Err(statement_error(sql, error)),
        };

        rows.iter().map(decode_row).collect()
    }

    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::Backtick
    }

    fn key_column(&self, name: &str, key: &KeyColumn) -> String {
        // INTEGER PRIMARY KEY aliases the rowid, so ids are assigned on insert.
        let mut sql = format!("{} INTEGER", self.quote_identifier(name));
        if key.primary {
            sql.push_str(" PRIMARY KEY");
        } else if key.nullable == Some(false) {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    fn table_catalog(&self) -> TableCatalog {
        TableCatalog {
            relation: Identifier::new("sqlite_master"),
            name_column: Identifier::new("name"),
            kind: Some((Identifier::new("type"), Value::from("table"))),
        }
    }
}

fn statement_error(sql: String, error: sqlx::Error) -> MigrateError {
    let unique = matches!(&error, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique {
        MigrateError::UniqueViolation {
            sql,
            source: Box::new(error),
        }
    } else if matches!(error, sqlx::Error::Database(_)) {
        MigrateError::OperationFailure {
            sql,
            source: Box::new(error),
        }
    } else {
        MigrateError::Database(error)
    }
}

fn decode_row(row: &SqliteRow) -> Result<Row> {
    (0..row.len())
        .map(|index| decode_column(row, index).map_err(MigrateError::from))
        .collect()
}

/// Decodes by storage class, since SQLite columns are dynamically typed.
fn decode_column(row: &SqliteRow, index: usize) -> std::result::Result<Value, sqlx::Error> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map_or(Value::Null, Value::Integer));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.map_or(Value::Null, Value::Real));
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value.map_or(Value::Null, Value::Text));
    }
    let bytes = row.try_get::<Option<Vec<u8>>, _>(index)?;
    Ok(bytes.map_or(Value::Null, Value::Blob))
}

/// A SQLite connection pool that hands out sessions and owns the
/// transaction around each migration.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    pool: SqlitePool,
    features: DialectFeatures,
}

impl SqliteClient {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            features: DialectFeatures::sqlite(),
        }
    }

    /// Connects to a database URL, creating the file if it is missing.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Overrides the capability flags given to new sessions.
    #[must_use]
    pub const fn with_features(mut self, features: DialectFeatures) -> Self {
        self.features = features;
        self
    }

    /// Returns the pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the capability flags given to new sessions.
    #[must_use]
    pub const fn features(&self) -> &DialectFeatures {
        &self.features
    }

    /// Acquires a non-transactional session.
    pub async fn session(&self) -> Result<SqliteSession<PoolConnection<Sqlite>>> {
        let conn = self.pool.acquire().await?;
        Ok(SqliteSession::new(conn, self.features))
    }

    /// Begins a transaction and returns a session bound to it.
    pub async fn begin(&self) -> Result<SqliteSession<Transaction<'static, Sqlite>>> {
        let tx = self.pool.begin().await?;
        Ok(SqliteSession::new(tx, self.features))
    }

    /// Runs a named migration in its own transaction.
    ///
    /// The transaction commits only if the body and the ledger insert
    /// succeed. A ledger insert that loses a race with another runner is
    /// rolled back and reported as [`MigrationOutcome::AlreadyApplied`].
    pub async fn migrate<F>(&self, name: &str, body: F) -> Result<MigrationOutcome>
    where
        F: FnOnce(&mut Schema) -> Result<()>,
    {
        let mut session = self.begin().await?;

        match Migration::new(name).run(&mut session, body).await {
            Ok(outcome) => {
                session.commit().await?;
                Ok(outcome)
            }
            Err(MigrateError::DuplicateName(name)) => {
                warn!(migration = %name, "Migration recorded concurrently, rolling back");
                session.rollback().await?;
                Ok(MigrationOutcome::AlreadyApplied)
            }
            Err(error) => {
                if let Err(rollback) = session.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(error)
            }
        }
    }
}
