//! `ALTER TABLE` column operations.
//!
//! Column type changes are where dialects diverge the most: MySQL and MariaDB
//! use `MODIFY COLUMN`, PostgreSQL uses `ALTER COLUMN ... TYPE` with an
//! optional `USING` conversion, and anything unrecognised gets the PostgreSQL
//! form without `USING`.

use super::column::ColumnDeclaration;
use crate::error::Result;
use crate::session::Session;
use crate::statement::Statement;

/// A single change within an [`AlterTable`].
#[derive(Debug, Clone, PartialEq)]
pub enum AlterOperation {
    /// `ADD COLUMN`.
    AddColumn(ColumnDeclaration),
    /// `DROP COLUMN [IF EXISTS]`.
    DropColumn {
        /// Column name.
        name: String,
        /// Request an `IF EXISTS` guard where the dialect supports one.
        if_exists: bool,
    },
    /// `RENAME COLUMN old TO new`.
    RenameColumn {
        /// Current name.
        old_name: String,
        /// New name.
        new_name: String,
    },
    /// Change a column's type.
    ChangeColumn {
        /// Column name.
        name: String,
        /// New type string.
        sql_type: String,
    },
}

/// A sequence of column changes applied to one table in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    name: String,
    operations: Vec<AlterOperation>,
}

impl AlterTable {
    /// Starts an empty alteration of `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn add_column(&mut self, column: ColumnDeclaration) -> &mut Self {
        self.operations.push(AlterOperation::AddColumn(column));
        self
    }

    /// Drops a column.
    pub fn drop_column(&mut self, name: impl Into<String>) -> &mut Self {
        self.operations.push(AlterOperation::DropColumn {
            name: name.into(),
            if_exists: false,
        });
        self
    }

    /// Drops a column, guarded by `IF EXISTS` when the dialect allows it.
    ///
    /// On dialects without conditional operations the guard is omitted and
    /// dropping a missing column fails.
    pub fn drop_column_if_exists(&mut self, name: impl Into<String>) -> &mut Self {
        self.operations.push(AlterOperation::DropColumn {
            name: name.into(),
            if_exists: true,
        });
        self
    }

    /// Renames a column.
    pub fn rename_column(
        &mut self,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> &mut Self {
        self.operations.push(AlterOperation::RenameColumn {
            old_name: old_name.into(),
            new_name: new_name.into(),
        });
        self
    }

    /// Changes a column's type.
    pub fn change_column(
        &mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
    ) -> &mut Self {
        self.operations.push(AlterOperation::ChangeColumn {
            name: name.into(),
            sql_type: sql_type.into(),
        });
        self
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operations in declaration order.
    #[must_use]
    pub fn operations(&self) -> &[AlterOperation] {
        &self.operations
    }

    /// Compiles to one statement per operation.
    pub fn statements<S: Session>(&self, session: &S) -> Result<Vec<Statement>> {
        self.operations
            .iter()
            .map(|operation| self.statement(session, operation))
            .collect()
    }

    fn statement<S: Session>(&self, session: &S, operation: &AlterOperation) -> Result<Statement> {
        let mut statement = session.clause("ALTER TABLE");
        statement.identifier(&self.name);

        match operation {
            AlterOperation::AddColumn(column) => {
                statement.clause("ADD COLUMN");
                column.append_definition(&mut statement)?;
            }
            AlterOperation::DropColumn { name, if_exists } => {
                statement.clause("DROP COLUMN");
                if *if_exists && session.features().conditional_operations() {
                    statement.clause("IF EXISTS");
                }
                statement.identifier(name);
            }
            AlterOperation::RenameColumn { old_name, new_name } => {
                statement
                    .clause("RENAME COLUMN")
                    .identifier(old_name)
                    .clause("TO")
                    .identifier(new_name);
            }
            AlterOperation::ChangeColumn { name, sql_type } => {
                let features = session.features();
                if features.modify_column_syntax() {
                    statement
                        .clause("MODIFY COLUMN")
                        .identifier(name)
                        .clause(sql_type);
                } else {
                    statement
                        .clause("ALTER COLUMN")
                        .identifier(name)
                        .clause("TYPE")
                        .clause(sql_type);

                    if features.alter_column_type_syntax() && features.using_clause_support() {
                        statement
                            .clause("USING")
                            .identifier(name)
                            .clause("::")
                            .clause(sql_type);
                    }
                }
            }
        }

        Ok(statement)
    }
}
