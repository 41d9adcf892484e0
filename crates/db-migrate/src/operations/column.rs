//! Ordinary column declarations.

use crate::error::{MigrateError, Result};
use crate::statement::{Statement, Value};

/// Creates a column declaration; shorthand for [`ColumnDeclaration::new`].
#[must_use]
pub fn column(name: impl Into<String>, sql_type: impl Into<String>) -> ColumnDeclaration {
    ColumnDeclaration::new(name, sql_type)
}

/// A column with an opaque, dialect-specific type string.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDeclaration {
    pub(crate) name: String,
    pub(crate) sql_type: String,
    pub(crate) nullable: Option<bool>,
    pub(crate) default: Option<Value>,
    pub(crate) unique: bool,
}

impl ColumnDeclaration {
    /// Creates a nullable column with no default.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: None,
            default: None,
            unique: false,
        }
    }

    /// Adds `NOT NULL`.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    /// Marks the column explicitly nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Adds `UNIQUE`.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type string, emitted verbatim.
    #[must_use]
    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    /// Explicit nullability, if any was declared.
    #[must_use]
    pub const fn nullability(&self) -> Option<bool> {
        self.nullable
    }

    /// Default value, if any.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the column is unique.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Appends `name type [NOT NULL] [DEFAULT lit] [UNIQUE]`.
    ///
    /// `NOT NULL` is emitted only when nullability was explicitly denied.
    /// Non-finite float defaults have no SQL literal and are rejected.
    pub(crate) fn append_definition(&self, statement: &mut Statement) -> Result<()> {
        if let Some(Value::Real(value)) = &self.default
            && !value.is_finite()
        {
            return Err(MigrateError::InvalidOperation(format!(
                "column '{}' has a non-finite default: {value}",
                self.name
            )));
        }

        statement.identifier(&self.name).clause(&self.sql_type);

        if self.nullable == Some(false) {
            statement.clause("NOT NULL");
        }

        if let Some(default) = &self.default {
            statement.clause("DEFAULT").literal(default.clone());
        }

        if self.unique {
            statement.clause("UNIQUE");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let column = column("age", "INTEGER").not_null().default(0).unique();
        assert_eq!(column.name(), "age");
        assert_eq!(column.sql_type(), "INTEGER");
        assert_eq!(column.nullability(), Some(false));
        assert_eq!(column.default_value(), Some(&Value::Integer(0)));
        assert!(column.is_unique());
    }

    #[test]
    fn test_nullable_by_default() {
        let column = ColumnDeclaration::new("email", "TEXT");
        assert_eq!(column.nullability(), None);

        let mut statement = Statement::new("ADD COLUMN");
        column.append_definition(&mut statement).unwrap();
        assert_eq!(statement.fragments().len(), 3);
    }

    #[test]
    fn test_non_finite_default_is_rejected() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut statement = Statement::new("ADD COLUMN");
            let result = column("ratio", "REAL").default(value).append_definition(&mut statement);
            assert!(matches!(result, Err(MigrateError::InvalidOperation(_))));
        }

        let mut statement = Statement::new("ADD COLUMN");
        column("ratio", "REAL")
            .default(0.5)
            .append_definition(&mut statement)
            .unwrap();
    }
}
