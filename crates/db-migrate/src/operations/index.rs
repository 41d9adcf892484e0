//! Index operations.

use crate::error::{MigrateError, Result};
use crate::session::Session;
use crate::statement::Statement;

/// `CREATE [UNIQUE] INDEX [IF NOT EXISTS] name ON table [USING method] (cols)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    name: String,
    table: String,
    columns: Vec<String>,
    unique: bool,
    method: Option<String>,
    drop_if_exists: bool,
    if_not_exists: bool,
}

impl CreateIndex {
    /// Creates a plain index over `columns`, in the given order.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
            method: None,
            drop_if_exists: false,
            if_not_exists: false,
        }
    }

    /// Makes the index unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the access method, e.g. `gin` or `hash`.
    #[must_use]
    pub fn using(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Drops any existing index of the same name first.
    #[must_use]
    pub const fn drop_if_exists(mut self) -> Self {
        self.drop_if_exists = true;
        self
    }

    /// Adds `IF NOT EXISTS`.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Indexed table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Indexed columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Compiles to an optional guarded drop followed by the create.
    pub fn statements<S: Session>(&self, session: &S) -> Result<Vec<Statement>> {
        if self.columns.is_empty() {
            return Err(MigrateError::InvalidOperation(format!(
                "index '{}' on '{}' has no columns",
                self.name, self.table
            )));
        }

        let mut statements = Vec::new();

        if self.drop_if_exists {
            statements.extend(DropIndex::new(&self.name).if_exists().statements(session));
        }

        let mut statement = if self.unique {
            session.clause("CREATE UNIQUE INDEX")
        } else {
            session.clause("CREATE INDEX")
        };

        if self.if_not_exists {
            statement.clause("IF NOT EXISTS");
        }

        statement
            .identifier(&self.name)
            .clause("ON")
            .identifier(&self.table);

        if let Some(method) = &self.method {
            statement.clause("USING").identifier(method);
        }

        statement.identifier_list(&self.columns);
        statements.push(statement);

        Ok(statements)
    }
}

/// `DROP INDEX [IF EXISTS] name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndex {
    name: String,
    if_exists: bool,
}

impl DropIndex {
    /// Creates an unguarded drop.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            if_exists: false,
        }
    }

    /// Adds `IF EXISTS`. Emitted whatever the dialect's capabilities.
    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiles to a single statement.
    pub fn statements<S: Session>(&self, session: &S) -> Vec<Statement> {
        let mut statement = session.clause("DROP INDEX");
        if self.if_exists {
            statement.clause("IF EXISTS");
        }
        statement.identifier(&self.name);
        vec![statement]
    }
}
