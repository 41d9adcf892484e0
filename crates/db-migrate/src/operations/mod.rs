//! DDL operations and their compilers.
//!
//! Each operation is a plain value describing a schema change. Compiling it
//! against a [`Session`] yields the ordered statements to execute; the only
//! inputs are the operation itself, the session's [`DialectFeatures`] and its
//! key-column renderer.
//!
//! [`DialectFeatures`]: crate::features::DialectFeatures

mod alter;
mod column;
mod index;
mod table;

pub use alter::{AlterOperation, AlterTable};
pub use column::{ColumnDeclaration, column};
pub use index::{CreateIndex, DropIndex};
pub use table::{ColumnBuilder, CreateTable, DropTable, KeyBuilder, RenameTable, TableColumn};

use crate::error::Result;
use crate::session::Session;
use crate::statement::Statement;

/// A single schema change declared by a migration body.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Create a table and its auxiliary indexes.
    CreateTable(CreateTable),
    /// Add, drop, rename or retype columns.
    AlterTable(AlterTable),
    /// Drop a table.
    DropTable(DropTable),
    /// Rename a table.
    RenameTable(RenameTable),
    /// Create an index.
    CreateIndex(CreateIndex),
    /// Drop an index.
    DropIndex(DropIndex),
}

impl Operation {
    /// Short description used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateTable(_) => "create_table",
            Self::AlterTable(_) => "alter_table",
            Self::DropTable(_) => "drop_table",
            Self::RenameTable(_) => "rename_table",
            Self::CreateIndex(_) => "create_index",
            Self::DropIndex(_) => "drop_index",
        }
    }

    /// Compiles the operation into statements, in execution order.
    pub fn statements<S: Session>(&self, session: &S) -> Result<Vec<Statement>> {
        match self {
            Self::CreateTable(op) => op.statements(session),
            Self::AlterTable(op) => op.statements(session),
            Self::DropTable(op) => Ok(op.statements(session)),
            Self::RenameTable(op) => Ok(op.statements(session)),
            Self::CreateIndex(op) => op.statements(session),
            Self::DropIndex(op) => Ok(op.statements(session)),
        }
    }
}

impl From<CreateTable> for Operation {
    fn from(op: CreateTable) -> Self {
        Self::CreateTable(op)
    }
}

impl From<AlterTable> for Operation {
    fn from(op: AlterTable) -> Self {
        Self::AlterTable(op)
    }
}

impl From<DropTable> for Operation {
    fn from(op: DropTable) -> Self {
        Self::DropTable(op)
    }
}

impl From<RenameTable> for Operation {
    fn from(op: RenameTable) -> Self {
        Self::RenameTable(op)
    }
}

impl From<CreateIndex> for Operation {
    fn from(op: CreateIndex) -> Self {
        Self::CreateIndex(op)
    }
}

impl From<DropIndex> for Operation {
    fn from(op: DropIndex) -> Self {
        Self::DropIndex(op)
    }
}
