//! Table-level operations: create, drop, rename.

use super::column::ColumnDeclaration;
use super::index::CreateIndex;
use crate::error::{MigrateError, Result};
use crate::session::{KeyColumn, Session};
use crate::statement::{Statement, Value};

/// One entry in a table's column list.
#[derive(Debug, Clone, PartialEq)]
pub enum TableColumn {
    /// A primary or foreign key, rendered by the session.
    Key {
        /// Column name.
        name: String,
        /// Key options.
        key: KeyColumn,
    },
    /// An ordinary column.
    Column(ColumnDeclaration),
}

impl TableColumn {
    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Key { name, .. } => name,
            Self::Column(column) => column.name(),
        }
    }
}

/// `CREATE TABLE`, followed by one index per indexed column.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    name: String,
    columns: Vec<TableColumn>,
    indexes: Vec<String>,
    drop_if_exists: bool,
    if_not_exists: bool,
}

impl CreateTable {
    /// Starts an empty table declaration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            drop_if_exists: false,
            if_not_exists: false,
        }
    }

    /// Drops any existing table of the same name first.
    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.drop_if_exists = true;
        self
    }

    /// Adds `IF NOT EXISTS` to the table and its indexes.
    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    /// Adds the primary key column `id`.
    pub fn primary_key(&mut self) -> KeyBuilder<'_> {
        self.primary_key_named("id")
    }

    /// Adds a primary key column with the given name.
    pub fn primary_key_named(&mut self, name: impl Into<String>) -> KeyBuilder<'_> {
        self.push_key(name.into(), KeyColumn::primary(), false)
    }

    /// Adds a foreign key column. It is indexed unless
    /// [`KeyBuilder::without_index`] is called.
    pub fn foreign_key(&mut self, name: impl Into<String>) -> KeyBuilder<'_> {
        self.push_key(name.into(), KeyColumn::foreign(), true)
    }

    /// Adds an ordinary column.
    pub fn column(
        &mut self,
        name: impl Into<String>,
        sql_type: impl Into<String>,
    ) -> ColumnBuilder<'_> {
        self.add(ColumnDeclaration::new(name, sql_type))
    }

    /// Adds a prepared column declaration.
    pub fn add(&mut self, column: ColumnDeclaration) -> ColumnBuilder<'_> {
        self.columns.push(TableColumn::Column(column));
        let position = self.columns.len() - 1;
        ColumnBuilder {
            table: self,
            position,
        }
    }

    /// Adds `created_at` and `updated_at` timestamp columns.
    pub fn timestamps(&mut self) -> &mut Self {
        self.column("created_at", "TIMESTAMP");
        self.column("updated_at", "TIMESTAMP");
        self
    }

    fn push_key(&mut self, name: String, key: KeyColumn, index: bool) -> KeyBuilder<'_> {
        if index {
            self.add_index(&name);
        }
        self.columns.push(TableColumn::Key { name, key });
        let position = self.columns.len() - 1;
        KeyBuilder {
            table: self,
            position,
        }
    }

    fn add_index(&mut self, column: &str) {
        if !self.indexes.iter().any(|name| name == column) {
            self.indexes.push(column.to_string());
        }
    }

    fn remove_index(&mut self, column: &str) {
        self.indexes.retain(|name| name != column);
    }

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    /// Names of columns that receive an auxiliary index.
    #[must_use]
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    /// Name of the index created for `column`: `index_<table>_<column>`.
    #[must_use]
    pub fn index_name(&self, column: &str) -> String {
        format!("index_{}_{}", self.name, column)
    }

    /// Compiles to: optional guarded drop, the create statement, then one
    /// create-index per indexed column.
    pub fn statements<S: Session>(&self, session: &S) -> Result<Vec<Statement>> {
        if self.columns.is_empty() {
            return Err(MigrateError::InvalidOperation(format!(
                "table '{}' declares no columns",
                self.name
            )));
        }

        let mut statements = Vec::new();

        if self.drop_if_exists {
            statements.extend(DropTable::new(&self.name).if_exists().statements(session));
        }

        let mut statement = session.clause("CREATE TABLE");
        if self.if_not_exists {
            statement.clause("IF NOT EXISTS");
        }
        statement.identifier(&self.name).clause("(");

        for (position, column) in self.columns.iter().enumerate() {
            if position > 0 {
                statement.clause(",");
            }
            match column {
                TableColumn::Key { name, key } => {
                    statement.clause(session.key_column(name, key));
                }
                TableColumn::Column(column) => column.append_definition(&mut statement)?,
            }
        }

        statement.clause(")");
        statements.push(statement);

        for column in &self.indexes {
            let mut index = CreateIndex::new(self.index_name(column), &self.name, [column]);
            if self.if_not_exists {
                index = index.if_not_exists();
            }
            statements.extend(index.statements(session)?);
        }

        Ok(statements)
    }
}

/// Options for a column just added to a [`CreateTable`].
#[derive(Debug)]
pub struct ColumnBuilder<'a> {
    table: &'a mut CreateTable,
    position: usize,
}

impl ColumnBuilder<'_> {
    fn update(self, apply: impl FnOnce(&mut ColumnDeclaration)) -> Self {
        if let TableColumn::Column(column) = &mut self.table.columns[self.position] {
            apply(column);
        }
        self
    }

    fn column_name(&self) -> String {
        self.table.columns[self.position].name().to_string()
    }

    /// Adds `NOT NULL`.
    pub fn not_null(self) -> Self {
        self.update(|column| column.nullable = Some(false))
    }

    /// Marks the column explicitly nullable.
    pub fn nullable(self) -> Self {
        self.update(|column| column.nullable = Some(true))
    }

    /// Sets the default value.
    pub fn default(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.update(|column| column.default = Some(value))
    }

    /// Adds `UNIQUE`.
    pub fn unique(self) -> Self {
        self.update(|column| column.unique = true)
    }

    /// Creates an auxiliary index on this column.
    pub fn index(self) -> Self {
        let name = self.column_name();
        self.table.add_index(&name);
        self
    }
}

/// Options for a key column just added to a [`CreateTable`].
#[derive(Debug)]
pub struct KeyBuilder<'a> {
    table: &'a mut CreateTable,
    position: usize,
}

impl KeyBuilder<'_> {
    fn update(self, apply: impl FnOnce(&mut KeyColumn)) -> Self {
        if let TableColumn::Key { key, .. } = &mut self.table.columns[self.position] {
            apply(key);
        }
        self
    }

    fn column_name(&self) -> String {
        self.table.columns[self.position].name().to_string()
    }

    /// Adds `NOT NULL` to a foreign key.
    pub fn not_null(self) -> Self {
        self.update(|key| key.nullable = Some(false))
    }

    /// Marks the key explicitly nullable.
    pub fn nullable(self) -> Self {
        self.update(|key| key.nullable = Some(true))
    }

    /// Creates an auxiliary index on this key.
    pub fn index(self) -> Self {
        let name = self.column_name();
        self.table.add_index(&name);
        self
    }

    /// Skips the auxiliary index a foreign key gets by default.
    pub fn without_index(self) -> Self {
        let name = self.column_name();
        self.table.remove_index(&name);
        self
    }
}

/// `DROP TABLE [IF EXISTS] name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    name: String,
    if_exists: bool,
}

impl DropTable {
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

    /// Table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiles to a single statement.
    pub fn statements<S: Session>(&self, session: &S) -> Vec<Statement> {
        let mut statement = session.clause("DROP TABLE");
        if self.if_exists {
            statement.clause("IF EXISTS");
        }
        statement.identifier(&self.name);
        vec![statement]
    }
}

/// `ALTER TABLE old RENAME TO new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTable {
    name: String,
    new_name: String,
}

impl RenameTable {
    /// Renames `name` to `new_name`.
    #[must_use]
    pub fn new(name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            new_name: new_name.into(),
        }
    }

    /// Compiles to a single statement.
    pub fn statements<S: Session>(&self, session: &S) -> Vec<Statement> {
        let mut statement = session.clause("ALTER TABLE");
        statement
            .identifier(&self.name)
            .clause("RENAME TO")
            .identifier(&self.new_name);
        vec![statement]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::DialectFeatures;
    use crate::session::RecordingSession;

    fn render(table: &CreateTable) -> Vec<String> {
        let session = RecordingSession::new(DialectFeatures::postgres());
        table
            .statements(&session)
            .unwrap()
            .iter()
            .map(|statement| session.render(statement))
            .collect()
    }

    #[test]
    fn test_create_table_simple() {
        let mut table = CreateTable::new("user");
        table.primary_key();
        table.column("name", "TEXT").not_null();
        table.column("bio", "TEXT");

        assert_eq!(
            render(&table),
            ["CREATE TABLE \"user\" (\"id\" BIGINT PRIMARY KEY, \"name\" TEXT NOT NULL, \"bio\" TEXT)"]
        );
    }

    #[test]
    fn test_create_table_default_and_unique() {
        let mut table = CreateTable::new("account");
        table.column("email", "TEXT").unique();
        table.column("active", "BOOLEAN").not_null().default(true);

        assert_eq!(
            render(&table),
            ["CREATE TABLE \"account\" (\"email\" TEXT UNIQUE, \"active\" BOOLEAN NOT NULL DEFAULT TRUE)"]
        );
    }

    #[test]
    fn test_create_table_drop_if_exists() {
        let mut table = CreateTable::new("user");
        table.drop_if_exists().primary_key();

        let sql = render(&table);
        assert_eq!(sql.len(), 2);
        assert_eq!(sql[0], "DROP TABLE IF EXISTS \"user\"");
        assert!(sql[1].starts_with("CREATE TABLE \"user\""));
    }

    #[test]
    fn test_create_table_indexes() {
        let mut table = CreateTable::new("post");
        table.if_not_exists().primary_key();
        table.foreign_key("author_id").not_null();
        table.foreign_key("editor_id").without_index();
        table.column("slug", "TEXT").index();

        assert_eq!(table.indexes(), ["author_id", "slug"]);
        assert_eq!(
            render(&table),
            [
                "CREATE TABLE IF NOT EXISTS \"post\" (\"id\" BIGINT PRIMARY KEY, \
                 \"author_id\" BIGINT NOT NULL, \"editor_id\" BIGINT, \"slug\" TEXT)",
                "CREATE INDEX IF NOT EXISTS \"index_post_author_id\" ON \"post\" (\"author_id\")",
                "CREATE INDEX IF NOT EXISTS \"index_post_slug\" ON \"post\" (\"slug\")",
            ]
        );
    }

    #[test]
    fn test_timestamps() {
        let mut table = CreateTable::new("event");
        table.timestamps();

        let names: Vec<&str> = table.columns().iter().map(TableColumn::name).collect();
        assert_eq!(names, ["created_at", "updated_at"]);
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let session = RecordingSession::new(DialectFeatures::generic());
        let result = CreateTable::new("empty").statements(&session);
        assert!(matches!(result, Err(MigrateError::InvalidOperation(_))));
    }

    #[test]
    fn test_nan_default_is_rejected() {
        let session = RecordingSession::new(DialectFeatures::generic());
        let mut table = CreateTable::new("metric");
        table.column("ratio", "REAL").default(f64::NAN);

        let result = table.statements(&session);
        assert!(matches!(result, Err(MigrateError::InvalidOperation(ref msg)) if msg.contains("ratio")));
    }

    #[test]
    fn test_drop_table() {
        let session = RecordingSession::new(DialectFeatures::generic());
        let plain = DropTable::new("user").statements(&session);
        let guarded = DropTable::new("user").if_exists().statements(&session);

        assert_eq!(session.render(&plain[0]), "DROP TABLE \"user\"");
        assert_eq!(session.render(&guarded[0]), "DROP TABLE IF EXISTS \"user\"");
    }

    #[test]
    fn test_rename_table() {
        let session = RecordingSession::new(DialectFeatures::generic());
        let statements = RenameTable::new("user", "account").statements(&session);
        assert_eq!(
            session.render(&statements[0]),
            "ALTER TABLE \"user\" RENAME TO \"account\""
        );
    }
}
