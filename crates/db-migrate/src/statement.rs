//! Statement fragments.
//!
//! A [`Statement`] is a linear sequence of keyword clauses, identifiers and
//! literal values. It carries no dialect knowledge: quoting and escaping are
//! applied by the [`Session`](crate::session::Session) that renders it.

use std::fmt;

use chrono::{DateTime, Utc};

/// A literal value, either sent in a statement or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit integer.
    Integer(i64),
    /// Double-precision float.
    Real(f64),
    /// Text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the integer content, if this is an integer value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns true for SQL NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Blob(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A row returned by a statement: column values in select order.
pub type Row = Vec<Value>;

/// A possibly schema-qualified identifier, e.g. `information_schema.tables`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    parts: Vec<String>,
}

impl Identifier {
    /// Creates an unqualified identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }

    /// Creates a qualified identifier from its parts.
    #[must_use]
    pub fn qualified<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the name parts, outermost first.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Identifier {
    fn from(name: &String) -> Self {
        Self::new(name.clone())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

/// One piece of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Raw SQL text: keywords, type names, punctuation.
    Clause(String),
    /// A name to be quoted by the session.
    Identifier(Identifier),
    /// A value to be escaped by the session.
    Literal(Value),
}

/// An ordered list of fragments forming one SQL statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    fragments: Vec<Fragment>,
}

impl Statement {
    /// Starts a statement with a leading keyword clause.
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            fragments: vec![Fragment::Clause(keyword.into())],
        }
    }

    /// Appends raw SQL text.
    pub fn clause(&mut self, text: impl Into<String>) -> &mut Self {
        self.fragments.push(Fragment::Clause(text.into()));
        self
    }

    /// Appends an identifier.
    pub fn identifier(&mut self, name: impl Into<Identifier>) -> &mut Self {
        self.fragments.push(Fragment::Identifier(name.into()));
        self
    }

    /// Appends a literal value.
    pub fn literal(&mut self, value: impl Into<Value>) -> &mut Self {
        self.fragments.push(Fragment::Literal(value.into()));
        self
    }

    /// Appends `( a, b, ... )` with each name as an identifier.
    pub fn identifier_list<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Identifier>,
    {
        self.clause("(");
        for (position, name) in names.into_iter().enumerate() {
            if position > 0 {
                self.clause(",");
            }
            self.identifier(name);
        }
        self.clause(")")
    }

    /// Returns the fragments in order.
    #[must_use]
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Joins rendered fragments with single spaces, without a space before
    /// `,` `)` `::` or after `(` `::`.
    pub(crate) fn join<F>(&self, mut render: F) -> String
    where
        F: FnMut(&Fragment) -> String,
    {
        let mut sql = String::new();
        let mut glue_next = true;
        for fragment in &self.fragments {
            let text = render(fragment);
            let is_clause = matches!(fragment, Fragment::Clause(_));
            let glue_before = is_clause && matches!(text.as_str(), "," | ")" | "::");
            if !glue_next && !glue_before {
                sql.push(' ');
            }
            glue_next = is_clause && matches!(text.as_str(), "(" | "::");
            sql.push_str(&text);
        }
        sql
    }
}
