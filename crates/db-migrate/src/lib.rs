//! Named, run-once schema migrations.
//!
//! `db-migrate` applies migration bodies at most once per name and generates
//! dialect-correct DDL for them:
//! - A ledger table (`migration`) records every name that completed
//! - Bodies declare operations on a [`Schema`](schema::Schema); the runner
//!   executes them strictly in declaration order
//! - SQL generation branches on explicit [`DialectFeatures`](features::DialectFeatures)
//!   rather than on dialect names
//!
//! # Architecture
//!
//! - **Features** - Capability flags fixed per session
//! - **Statement** - Fragment builder rendered by a session
//! - **Session** - Connected execution context (SQLite via `sqlx`, or recording)
//! - **Operations** - `CreateTable`, `AlterTable`, `CreateIndex`, ... and their compilers
//! - **Ledger** - The `migration` table
//! - **Executor** - Ledger check, body, execution, record
//! - **Information schema** - Table existence check
//!
//! # Example
//!
//! ```rust,ignore
//! use db_migrate::prelude::*;
//!
//! let client = SqliteClient::connect("sqlite:app.db").await?;
//!
//! client
//!     .migrate("create_users", |schema| {
//!         schema.create_table("user", |t| {
//!             t.primary_key();
//!             t.column("name", "TEXT").not_null();
//!             t.column("email", "TEXT").unique();
//!             t.timestamps();
//!         });
//!         Ok(())
//!     })
//!     .await?;
//!
//! client
//!     .migrate("add_user_age", |schema| {
//!         schema.alter_table("user", |t| {
//!             t.add_column(column("age", "INTEGER").default(0));
//!         });
//!         Ok(())
//!     })
//!     .await?;
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the ledger table
//! db-migrate init
//!
//! # List applied migrations
//! db-migrate status --json
//!
//! # Check for a table
//! db-migrate table-exists user
//! ```

pub mod error;
pub mod executor;
pub mod features;
pub mod information_schema;
pub mod ledger;
pub mod operations;
pub mod schema;
pub mod session;
pub mod statement;

use crate::error::Result;
use crate::executor::{Migration, MigrationOutcome};
use crate::schema::Schema;
use crate::session::Session;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{MigrateError, Result};
    pub use crate::executor::{Migration, MigrationOutcome, execute, sql_for, sql_for_session};
    pub use crate::features::DialectFeatures;
    pub use crate::information_schema::InformationSchema;
    pub use crate::ledger::{LEDGER_TABLE, Ledger, MigrationRecord};
    pub use crate::migrate;
    pub use crate::operations::{
        AlterOperation, AlterTable, ColumnDeclaration, CreateIndex, CreateTable, DropIndex,
        DropTable, Operation, RenameTable, column,
    };
    pub use crate::schema::{Guard, Schema, Step};
    pub use crate::session::{
        KeyColumn, QuoteStyle, RecordingSession, Session, SqliteClient, SqliteSession,
        TableCatalog,
    };
    pub use crate::statement::{Identifier, Row, Statement, Value};
}

/// Runs the migration `name` within `session` unless it already ran.
///
/// Shorthand for [`Migration::run`]. The session's transaction, if any, is the
/// caller's to commit or roll back.
pub async fn migrate<S, F>(name: &str, session: &mut S, body: F) -> Result<MigrationOutcome>
where
    S: Session,
    F: FnOnce(&mut Schema) -> Result<()>,
{
    Migration::new(name).run(session, body).await
}
