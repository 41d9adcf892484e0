//! Migration runner.
//!
//! A migration is a name plus a body. Running it checks the ledger; a name
//! already present is skipped without invoking the body. Otherwise the body
//! declares its operations, they are executed in order (guarded blocks are
//! checked as they are reached), and the name is recorded. The runner never
//! begins or commits a transaction: callers that want all-or-nothing
//! behaviour pass a transactional session (see
//! [`SqliteClient::migrate`](crate::session::SqliteClient::migrate)).

use tracing::{debug, info};

use crate::error::Result;
use crate::features::DialectFeatures;
use crate::ledger::Ledger;
use crate::schema::{Schema, Step};
use crate::session::{RecordingSession, Session};

/// What running a migration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The body ran and the name was recorded.
    Applied,
    /// The name was already recorded; nothing ran.
    AlreadyApplied,
}

impl MigrationOutcome {
    /// Returns true if the body ran.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// A named, run-once migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    name: String,
}

impl Migration {
    /// Creates a migration. The name is its sole identity.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Migration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the migration unless the ledger already holds its name.
    ///
    /// Errors from the body or from any statement are returned unchanged and
    /// no ledger record is written.
    pub async fn run<S, F>(&self, session: &mut S, body: F) -> Result<MigrationOutcome>
    where
        S: Session,
        F: FnOnce(&mut Schema) -> Result<()>,
    {
        let mut ledger = Ledger::new(session);
        ledger.ensure().await?;

        if ledger.contains(&self.name).await? {
            info!(migration = %self.name, "Migration already applied, skipping");
            return Ok(MigrationOutcome::AlreadyApplied);
        }

        info!(migration = %self.name, "Applying migration");

        let mut schema = Schema::new();
        body(&mut schema)?;
        execute(session, &schema).await?;

        Ledger::new(session).record(&self.name).await?;

        info!(
            migration = %self.name,
            steps = schema.steps().len(),
            "Migration applied successfully"
        );

        Ok(MigrationOutcome::Applied)
    }
}

/// Compiles and executes a schema's steps in order, stopping at the first
/// failure. Guarded blocks are checked when reached.
pub async fn execute<S: Session>(session: &mut S, schema: &Schema) -> Result<()> {
    let mut pending: Vec<&Step> = schema.steps().iter().rev().collect();

    while let Some(step) = pending.pop() {
        match step {
            Step::Operation(operation) => {
                debug!(operation = operation.kind(), "Executing operation");
                for statement in operation.statements(&*session)? {
                    session.call(&statement).await?;
                }
            }
            Step::Guarded(guard) => {
                if guard.holds(session).await? {
                    debug!(table = guard.table(), "Guard holds, executing block");
                    pending.extend(guard.schema().steps().iter().rev());
                } else {
                    debug!(table = guard.table(), "Guard does not hold, skipping block");
                }
            }
        }
    }
    Ok(())
}

/// Compiles a migration body for a dialect without touching a database.
///
/// Identifiers are double-quoted; see [`sql_for_session`] for other quoting.
pub fn sql_for<F>(features: DialectFeatures, body: F) -> Result<Vec<String>>
where
    F: FnOnce(&mut Schema) -> Result<()>,
{
    sql_for_session(&RecordingSession::new(features), body)
}

/// Compiles a migration body with `session`'s features and quoting, without
/// executing anything.
///
/// Returns the SQL the body's operations would issue, in order. Ledger
/// statements are not included. With no catalog to query, guarded blocks are
/// resolved as if no table exists.
pub fn sql_for_session<S, F>(session: &S, body: F) -> Result<Vec<String>>
where
    S: Session,
    F: FnOnce(&mut Schema) -> Result<()>,
{
    let mut schema = Schema::new();
    body(&mut schema)?;

    let mut sql = Vec::new();
    let mut pending: Vec<&Step> = schema.steps().iter().rev().collect();
    while let Some(step) = pending.pop() {
        match step {
            Step::Operation(operation) => {
                for statement in operation.statements(session)? {
                    sql.push(session.render(&statement));
                }
            }
            Step::Guarded(guard) => {
                if !guard.expects_table() {
                    pending.extend(guard.schema().steps().iter().rev());
                }
            }
        }
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::operations::{CreateIndex, column};
    use crate::session::{QuoteStyle, SqliteClient};
    use crate::statement::Value;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_client() -> SqliteClient {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        SqliteClient::new(pool)
    }

    fn create_users(schema: &mut Schema) -> Result<()> {
        schema.create_table("user", |t| {
            t.primary_key();
            t.column("name", "TEXT").not_null();
        });
        Ok(())
    }

    #[tokio::test]
    async fn test_run_statement_order() {
        let mut session = RecordingSession::new(DialectFeatures::postgres());

        let outcome = Migration::new("create_users")
            .run(&mut session, create_users)
            .await
            .unwrap();

        assert_eq!(outcome, MigrationOutcome::Applied);
        let sql = session.statements();
        assert_eq!(sql.len(), 5);
        assert!(sql[0].starts_with("CREATE TABLE IF NOT EXISTS \"migration\""));
        assert!(sql[1].starts_with("CREATE INDEX IF NOT EXISTS \"index_migration_name\""));
        assert_eq!(
            sql[2],
            "SELECT \"id\" FROM \"migration\" WHERE \"name\" = 'create_users'"
        );
        assert_eq!(
            sql[3],
            "CREATE TABLE \"user\" (\"id\" BIGINT PRIMARY KEY, \"name\" TEXT NOT NULL)"
        );
        assert!(sql[4].starts_with(
            "INSERT INTO \"migration\" (\"name\", \"created_at\", \"updated_at\") VALUES ('create_users', '"
        ));
    }

    #[tokio::test]
    async fn test_recorded_name_skips_body() {
        let mut session = RecordingSession::new(DialectFeatures::postgres())
            .respond("SELECT \"id\" FROM \"migration\"", vec![vec![Value::Integer(1)]]);
        let mut invoked = false;

        let outcome = Migration::new("create_users")
            .run(&mut session, |_| {
                invoked = true;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, MigrationOutcome::AlreadyApplied);
        assert!(!invoked);
        assert!(session.statements().iter().all(|sql| !sql.starts_with("INSERT")));
    }

    #[tokio::test]
    async fn test_body_error_is_not_recorded() {
        let mut session = RecordingSession::new(DialectFeatures::postgres());

        let result = Migration::new("broken")
            .run(&mut session, |_| {
                Err(MigrateError::InvalidOperation("refused".to_string()))
            })
            .await;

        assert!(matches!(
            result,
            Err(MigrateError::InvalidOperation(ref msg)) if msg == "refused"
        ));
        assert!(session.statements().iter().all(|sql| !sql.starts_with("INSERT")));
    }

    #[tokio::test]
    async fn test_run_twice_against_sqlite() {
        let client = create_test_client().await;
        let mut session = client.session().await.unwrap();
        let mut runs = 0;

        for _ in 0..2 {
            Migration::new("create_users")
                .run(&mut session, |schema| {
                    runs += 1;
                    create_users(schema)
                })
                .await
                .unwrap();
        }

        assert_eq!(runs, 1);
        assert_eq!(Ledger::new(&mut session).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_statement_stops_execution() {
        let client = create_test_client().await;
        let mut session = client.session().await.unwrap();

        let result = Migration::new("bad_alter")
            .run(&mut session, |schema| {
                schema.alter_table("missing", |t| {
                    t.add_column(column("email", "TEXT"));
                });
                schema.create_table("never", |t| {
                    t.primary_key();
                });
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(MigrateError::OperationFailure { .. })));
        let mut ledger = Ledger::new(&mut session);
        assert!(!ledger.contains("bad_alter").await.unwrap());
    }

    #[test]
    fn test_sql_for_change_column() {
        let body = |schema: &mut Schema| {
            schema.alter_table("user", |t| {
                t.change_column("age", "BIGINT");
            });
            Ok(())
        };

        assert_eq!(
            sql_for(DialectFeatures::mysql(), body).unwrap(),
            ["ALTER TABLE \"user\" MODIFY COLUMN \"age\" BIGINT"]
        );
        assert_eq!(
            sql_for(DialectFeatures::postgres(), body).unwrap(),
            ["ALTER TABLE \"user\" ALTER COLUMN \"age\" TYPE BIGINT USING \"age\"::BIGINT"]
        );
        assert_eq!(
            sql_for(DialectFeatures::sqlite(), body).unwrap(),
            ["ALTER TABLE \"user\" ALTER COLUMN \"age\" TYPE BIGINT"]
        );
    }

    #[tokio::test]
    async fn test_guarded_block_follows_catalog() {
        let mut session = RecordingSession::new(DialectFeatures::postgres()).respond(
            "SELECT * FROM \"information_schema\".\"tables\" WHERE \"table_name\" = 'user'",
            vec![vec![Value::from("user")]],
        );

        Migration::new("add_email")
            .run(&mut session, |schema| {
                schema.if_table_exists("user", |schema| {
                    schema.alter_table("user", |t| {
                        t.add_column(column("email", "TEXT"));
                    });
                });
                schema.unless_table_exists("user", |schema| {
                    create_users(schema).unwrap();
                });
                Ok(())
            })
            .await
            .unwrap();

        let sql = session.statements();
        assert!(sql.iter().any(|s| s == "ALTER TABLE \"user\" ADD COLUMN \"email\" TEXT"));
        assert!(sql.iter().all(|s| !s.starts_with("CREATE TABLE \"user\"")));
    }

    #[tokio::test]
    async fn test_guard_sees_earlier_operations() {
        let client = create_test_client().await;
        let mut session = client.session().await.unwrap();

        Migration::new("create_and_seed")
            .run(&mut session, |schema| {
                create_users(schema)?;
                schema.if_table_exists("user", |schema| {
                    schema.create_index(CreateIndex::new("idx_user_name", "user", ["name"]));
                });
                Ok(())
            })
            .await
            .unwrap();

        let mut statement = session.clause("SELECT");
        statement
            .identifier("name")
            .clause("FROM")
            .identifier("sqlite_master")
            .clause("WHERE")
            .identifier("type")
            .clause("=")
            .literal("index")
            .clause("AND")
            .identifier("name")
            .clause("=")
            .literal("idx_user_name");
        assert_eq!(session.call(&statement).await.unwrap().len(), 1);
    }

    #[test]
    fn test_sql_for_resolves_guards_as_missing() {
        let sql = sql_for(DialectFeatures::postgres(), |schema| {
            schema
                .if_table_exists("legacy", |schema| {
                    schema.drop_table("legacy", false);
                })
                .unless_table_exists("user", |schema| {
                    schema.rename_table("person", "user");
                });
            Ok(())
        })
        .unwrap();

        assert_eq!(sql, ["ALTER TABLE \"person\" RENAME TO \"user\""]);
    }

    #[test]
    fn test_sql_for_session_uses_its_quoting() {
        let session = RecordingSession::new(DialectFeatures::mysql())
            .with_quote_style(QuoteStyle::Backtick);
        let sql = sql_for_session(&session, |schema| {
            schema.alter_table("user", |t| {
                t.change_column("age", "BIGINT");
            });
            Ok(())
        })
        .unwrap();

        assert_eq!(sql, ["ALTER TABLE `user` MODIFY COLUMN `age` BIGINT"]);
    }

    #[test]
    fn test_sql_for_propagates_compile_errors() {
        let result = sql_for(DialectFeatures::generic(), |schema| {
            schema.create_table("empty", |_| {});
            Ok(())
        });
        assert!(matches!(result, Err(MigrateError::InvalidOperation(_))));
    }
}
