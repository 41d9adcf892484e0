//! Database sessions.
//!
//! A session is a connected execution context. It owns everything dialect
//! specific that the operation compilers do not decide themselves: capability
//! flags, identifier and literal quoting, key-column rendering, the catalog
//! relation used for existence checks, and statement execution.

mod recording;
mod sqlite;

pub use recording::RecordingSession;
pub use sqlite::{SqliteClient, SqliteSession};

use std::future::Future;

use chrono::SecondsFormat;

use crate::error::Result;
use crate::features::DialectFeatures;
use crate::statement::{Fragment, Identifier, Row, Statement, Value};

/// Options for a primary or foreign key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyColumn {
    /// Whether this is the table's primary key.
    pub primary: bool,
    /// Explicit nullability; `None` leaves the column unconstrained.
    pub nullable: Option<bool>,
}

impl KeyColumn {
    /// A primary key column.
    #[must_use]
    pub const fn primary() -> Self {
        Self {
            primary: true,
            nullable: None,
        }
    }

    /// A foreign key column.
    #[must_use]
    pub const fn foreign() -> Self {
        Self {
            primary: false,
            nullable: None,
        }
    }
}

/// How a session quotes identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    /// `"name"`, the SQL standard form.
    #[default]
    DoubleQuote,
    /// `` `name` ``, as MySQL and MariaDB expect. SQLite accepts it too and,
    /// unlike `"name"`, never falls back to reading it as a string literal.
    Backtick,
}

impl QuoteStyle {
    /// Quotes one identifier part, doubling any embedded quote character.
    #[must_use]
    pub fn quote(self, name: &str) -> String {
        match self {
            Self::DoubleQuote => format!("\"{}\"", name.replace('"', "\"\"")),
            Self::Backtick => format!("`{}`", name.replace('`', "``")),
        }
    }
}

/// Where a session keeps its list of tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCatalog {
    /// Relation listing the tables.
    pub relation: Identifier,
    /// Column holding the table name.
    pub name_column: Identifier,
    /// Extra equality filter restricting the relation to tables.
    pub kind: Option<(Identifier, Value)>,
}

impl Default for TableCatalog {
    fn default() -> Self {
        Self {
            relation: Identifier::qualified(["information_schema", "tables"]),
            name_column: Identifier::new("table_name"),
            kind: None,
        }
    }
}

/// A connected, possibly transactional, execution context.
pub trait Session: Send {
    /// Capability flags fixed when the session was created.
    fn features(&self) -> &DialectFeatures;

    /// Executes a statement and returns every row it produced.
    fn call(&mut self, statement: &Statement) -> impl Future<Output = Result<Vec<Row>>> + Send;

    /// Starts a statement with a leading keyword clause.
    fn clause(&self, keyword: &str) -> Statement {
        Statement::new(keyword)
    }

    /// Renders the column definition of a primary or foreign key.
    fn key_column(&self, name: &str, key: &KeyColumn) -> String {
        let mut sql = format!("{} BIGINT", self.quote_identifier(name));
        if key.primary {
            sql.push_str(" PRIMARY KEY");
        } else if key.nullable == Some(false) {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    /// Describes the catalog relation queried by
    /// [`InformationSchema`](crate::information_schema::InformationSchema).
    fn table_catalog(&self) -> TableCatalog {
        TableCatalog::default()
    }

    /// Identifier quoting used by [`quote_identifier`](Self::quote_identifier).
    fn quote_style(&self) -> QuoteStyle {
        QuoteStyle::default()
    }

    /// Quotes a single identifier part.
    fn quote_identifier(&self, name: &str) -> String {
        self.quote_style().quote(name)
    }

    /// Renders a literal value.
    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Integer(value) => value.to_string(),
            Value::Real(value) => value.to_string(),
            Value::Text(text) => quote_text(text),
            Value::Blob(bytes) => quote_blob(bytes),
            Value::Timestamp(at) => quote_text(&at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }

    /// Renders a statement to SQL text.
    fn render(&self, statement: &Statement) -> String {
        statement.join(|fragment| match fragment {
            Fragment::Clause(text) => text.clone(),
            Fragment::Identifier(name) => name
                .parts()
                .iter()
                .map(|part| self.quote_identifier(part))
                .collect::<Vec<_>>()
                .join("."),
            Fragment::Literal(value) => self.quote_literal(value),
        })
    }
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn quote_blob(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|byte| format!("{byte:02X}")).collect();
    format!("X'{hex}'")
}
