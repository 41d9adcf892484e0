//! Dialect capability flags.
//!
//! A [`DialectFeatures`] value describes which DDL syntaxes a target database
//! accepts. It is attached to a session when the session is created and is
//! never changed afterwards; operation compilers branch only on these flags.

/// Capability flags for a SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialectFeatures {
    conditional_operations: bool,
    modify_column_syntax: bool,
    alter_column_type_syntax: bool,
    using_clause_support: bool,
}

impl DialectFeatures {
    /// Creates a feature set with every capability disabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditional_operations: false,
            modify_column_syntax: false,
            alter_column_type_syntax: false,
            using_clause_support: false,
        }
    }

    /// Features of a dialect nothing is known about.
    #[must_use]
    pub const fn generic() -> Self {
        Self::new()
    }

    /// SQLite: no column-level `IF EXISTS`, no column type changes.
    #[must_use]
    pub const fn sqlite() -> Self {
        Self::new()
    }

    /// PostgreSQL: `ALTER COLUMN ... TYPE ... USING ...`.
    #[must_use]
    pub const fn postgres() -> Self {
        Self::new()
            .with_conditional_operations(true)
            .with_alter_column_type_syntax(true)
            .with_using_clause_support(true)
    }

    /// MySQL: `MODIFY COLUMN`, no `DROP COLUMN IF EXISTS`.
    #[must_use]
    pub const fn mysql() -> Self {
        Self::new().with_modify_column_syntax(true)
    }

    /// MariaDB: `MODIFY COLUMN` and `IF EXISTS` guards.
    #[must_use]
    pub const fn mariadb() -> Self {
        Self::new()
            .with_conditional_operations(true)
            .with_modify_column_syntax(true)
    }

    /// Sets support for `IF EXISTS` / `IF NOT EXISTS` guards.
    #[must_use]
    pub const fn with_conditional_operations(mut self, enabled: bool) -> Self {
        self.conditional_operations = enabled;
        self
    }

    /// Sets support for `MODIFY COLUMN`.
    #[must_use]
    pub const fn with_modify_column_syntax(mut self, enabled: bool) -> Self {
        self.modify_column_syntax = enabled;
        self
    }

    /// Sets support for `ALTER COLUMN ... TYPE`.
    #[must_use]
    pub const fn with_alter_column_type_syntax(mut self, enabled: bool) -> Self {
        self.alter_column_type_syntax = enabled;
        self
    }

    /// Sets support for a `USING` conversion clause on type changes.
    #[must_use]
    pub const fn with_using_clause_support(mut self, enabled: bool) -> Self {
        self.using_clause_support = enabled;
        self
    }

    /// Whether `IF EXISTS` / `IF NOT EXISTS` guards are accepted.
    #[must_use]
    pub const fn conditional_operations(&self) -> bool {
        self.conditional_operations
    }

    /// Whether `ALTER TABLE t MODIFY COLUMN c <type>` is accepted.
    #[must_use]
    pub const fn modify_column_syntax(&self) -> bool {
        self.modify_column_syntax
    }

    /// Whether `ALTER TABLE t ALTER COLUMN c TYPE <type>` is accepted.
    #[must_use]
    pub const fn alter_column_type_syntax(&self) -> bool {
        self.alter_column_type_syntax
    }

    /// Whether a type change may carry `USING c::<type>`.
    #[must_use]
    pub const fn using_clause_support(&self) -> bool {
        self.using_clause_support
    }
}
