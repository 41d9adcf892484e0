//! The surface migration bodies are written against.
//!
//! A body receives a `&mut Schema` and declares operations on it; nothing is
//! executed until the body returns. The runner then compiles and executes the
//! operations strictly in declaration order.
//!
//! Blocks declared with [`Schema::if_table_exists`] and
//! [`Schema::unless_table_exists`] are checked through
//! [`InformationSchema`] when the runner reaches them, so they see the
//! effects of every operation declared before them.
//!
//! ```rust,ignore
//! client.migrate("create_users", |schema| {
//!     schema.create_table("user", |t| {
//!         t.drop_if_exists();
//!         t.primary_key();
//!         t.column("name", "TEXT").not_null();
//!         t.timestamps();
//!     });
//!     schema.alter_table("user", |t| {
//!         t.add_column(column("email", "TEXT"));
//!     });
//!     schema.if_table_exists("legacy_user", |schema| {
//!         schema.drop_table("legacy_user", false);
//!     });
//!     Ok(())
//! }).await?;
//! ```

use crate::error::Result;
use crate::information_schema::InformationSchema;
use crate::operations::{
    AlterTable, CreateIndex, CreateTable, DropIndex, DropTable, Operation, RenameTable,
};
use crate::session::Session;

/// One entry of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// An operation executed unconditionally.
    Operation(Operation),
    /// A block executed only if its table lookup matches.
    Guarded(Guard),
}

/// A nested block guarded by a table existence check.
#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
    table: String,
    exists: bool,
    schema: Schema,
}

impl Guard {
    /// Table looked up before the block runs.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the block runs when the table exists (true) or is missing.
    #[must_use]
    pub const fn expects_table(&self) -> bool {
        self.exists
    }

    /// The guarded block.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Queries the catalog and returns true if the block should run.
    pub async fn holds<S: Session>(&self, session: &mut S) -> Result<bool> {
        let exists = InformationSchema::new(session)
            .table_exists(&self.table)
            .await?;
        Ok(exists == self.exists)
    }
}

/// Ordered list of operations declared by a migration body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    steps: Vec<Step>,
}

impl Schema {
    /// Creates an empty schema change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a table; `build` adds its columns and options.
    pub fn create_table(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut CreateTable),
    ) -> &mut Self {
        let mut table = CreateTable::new(name);
        build(&mut table);
        self.push(table)
    }

    /// Declares a table guarded by `IF NOT EXISTS`.
    pub fn create_table_if_not_exists(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut CreateTable),
    ) -> &mut Self {
        let mut table = CreateTable::new(name);
        table.if_not_exists();
        build(&mut table);
        self.push(table)
    }

    /// Declares column changes on an existing table.
    pub fn alter_table(
        &mut self,
        name: impl Into<String>,
        build: impl FnOnce(&mut AlterTable),
    ) -> &mut Self {
        let mut table = AlterTable::new(name);
        build(&mut table);
        self.push(table)
    }

    /// Drops a table.
    pub fn drop_table(&mut self, name: impl Into<String>, if_exists: bool) -> &mut Self {
        let drop = DropTable::new(name);
        self.push(if if_exists { drop.if_exists() } else { drop })
    }

    /// Renames a table.
    pub fn rename_table(
        &mut self,
        name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> &mut Self {
        self.push(RenameTable::new(name, new_name))
    }

    /// Creates an index.
    pub fn create_index(&mut self, index: CreateIndex) -> &mut Self {
        self.push(index)
    }

    /// Drops an index.
    pub fn drop_index(&mut self, name: impl Into<String>, if_exists: bool) -> &mut Self {
        let drop = DropIndex::new(name);
        self.push(if if_exists { drop.if_exists() } else { drop })
    }

    /// Declares a block that runs only if `table` exists when it is reached.
    pub fn if_table_exists(
        &mut self,
        table: impl Into<String>,
        build: impl FnOnce(&mut Schema),
    ) -> &mut Self {
        self.guard(table.into(), true, build)
    }

    /// Declares a block that runs only if `table` is missing when it is
    /// reached.
    pub fn unless_table_exists(
        &mut self,
        table: impl Into<String>,
        build: impl FnOnce(&mut Schema),
    ) -> &mut Self {
        self.guard(table.into(), false, build)
    }

    fn guard(
        &mut self,
        table: String,
        exists: bool,
        build: impl FnOnce(&mut Schema),
    ) -> &mut Self {
        let mut schema = Schema::new();
        build(&mut schema);
        self.steps.push(Step::Guarded(Guard {
            table,
            exists,
            schema,
        }));
        self
    }

    /// Appends any operation.
    pub fn push(&mut self, operation: impl Into<Operation>) -> &mut Self {
        self.steps.push(Step::Operation(operation.into()));
        self
    }

    /// Declared steps, in order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Consumes the schema, returning its steps.
    #[must_use]
    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Returns true if nothing was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::DialectFeatures;
    use crate::operations::column;
    use crate::session::RecordingSession;
    use crate::statement::Value;

    fn kind(step: &Step) -> &'static str {
        match step {
            Step::Operation(operation) => operation.kind(),
            Step::Guarded(_) => "guarded",
        }
    }

    #[test]
    fn test_declaration_order() {
        let mut schema = Schema::new();
        schema
            .drop_table("account", true)
            .create_table("user", |t| {
                t.primary_key();
            })
            .rename_table("user", "account")
            .alter_table("account", |t| {
                t.add_column(column("email", "TEXT"));
            })
            .create_index(CreateIndex::new("idx_email", "account", ["email"]))
            .drop_index("idx_email", false);

        let kinds: Vec<&str> = schema.steps().iter().map(kind).collect();
        assert_eq!(
            kinds,
            [
                "drop_table",
                "create_table",
                "rename_table",
                "alter_table",
                "create_index",
                "drop_index",
            ]
        );
    }

    #[test]
    fn test_create_table_if_not_exists() {
        let mut schema = Schema::new();
        schema.create_table_if_not_exists("migration", |t| {
            t.primary_key();
        });

        let Some(Step::Operation(Operation::CreateTable(table))) = schema.steps().first() else {
            panic!("expected a create_table operation");
        };
        assert_eq!(table.name(), "migration");
    }

    #[test]
    fn test_guard_flags() {
        let mut schema = Schema::new();
        schema.drop_table("a", true).drop_index("b", true);

        assert_eq!(
            schema.into_steps(),
            vec![
                Step::Operation(Operation::DropTable(DropTable::new("a").if_exists())),
                Step::Operation(Operation::DropIndex(DropIndex::new("b").if_exists())),
            ]
        );
    }

    #[test]
    fn test_guarded_blocks_keep_position() {
        let mut schema = Schema::new();
        schema
            .create_table("user", |t| {
                t.primary_key();
            })
            .if_table_exists("legacy_user", |schema| {
                schema.drop_table("legacy_user", false);
            })
            .rename_table("user", "account");

        let kinds: Vec<&str> = schema.steps().iter().map(kind).collect();
        assert_eq!(kinds, ["create_table", "guarded", "rename_table"]);

        let Some(Step::Guarded(guard)) = schema.steps().get(1) else {
            panic!("expected a guarded block");
        };
        assert_eq!(guard.table(), "legacy_user");
        assert!(guard.expects_table());
        assert_eq!(guard.schema().steps().len(), 1);
    }

    #[tokio::test]
    async fn test_guard_queries_catalog() {
        let mut session = RecordingSession::new(DialectFeatures::postgres()).respond(
            "SELECT * FROM \"information_schema\".\"tables\" WHERE \"table_name\" = 'user'",
            vec![vec![Value::from("user")]],
        );

        let mut schema = Schema::new();
        schema
            .if_table_exists("user", |_| {})
            .unless_table_exists("user", |_| {})
            .if_table_exists("post", |_| {});

        let mut held = Vec::new();
        for step in schema.steps() {
            if let Step::Guarded(guard) = step {
                held.push(guard.holds(&mut session).await.unwrap());
            }
        }
        assert_eq!(held, [true, false, false]);
    }
}
