//! A session that records SQL instead of executing it.
//!
//! Useful for previewing the statements a migration would issue against a
//! dialect that is not connected, and for asserting generated SQL in tests.
//! Identifiers are double-quoted unless another [`QuoteStyle`] is chosen;
//! MySQL previews want [`QuoteStyle::Backtick`] unless `ANSI_QUOTES` is set.

use tracing::debug;

use super::{QuoteStyle, Session};
use crate::error::Result;
use crate::features::DialectFeatures;
use crate::statement::{Row, Statement};

/// Records every rendered statement; answers queries from canned rows.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    features: DialectFeatures,
    quote_style: QuoteStyle,
    statements: Vec<String>,
    responses: Vec<(String, Vec<Row>)>,
}

impl RecordingSession {
    /// Creates a recording session for the given dialect.
    #[must_use]
    pub const fn new(features: DialectFeatures) -> Self {
        Self {
            features,
            quote_style: QuoteStyle::DoubleQuote,
            statements: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Quotes identifiers with `style` instead of double quotes.
    #[must_use]
    pub const fn with_quote_style(mut self, style: QuoteStyle) -> Self {
        self.quote_style = style;
        self
    }

    /// Answers statements whose SQL starts with `prefix` with `rows`.
    ///
    /// Statements matching no prefix return no rows.
    #[must_use]
    pub fn respond(mut self, prefix: impl Into<String>, rows: Vec<Row>) -> Self {
        self.responses.push((prefix.into(), rows));
        self
    }

    /// Returns the rendered statements, in execution order.
    #[must_use]
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Consumes the session, returning the rendered statements.
    #[must_use]
    pub fn into_statements(self) -> Vec<String> {
        self.statements
    }
}

impl Session for RecordingSession {
    fn features(&self) -> &DialectFeatures {
        &self.features
    }

    fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }

    async fn call(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        let sql = self.render(statement);
        debug!(sql = %sql, "Recording SQL");

        let rows = self
            .responses
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();

        self.statements.push(sql);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::Value;

    #[tokio::test]
    async fn test_records_in_order() {
        let mut session = RecordingSession::new(DialectFeatures::postgres());
        session.call(&Statement::new("SELECT 1")).await.unwrap();
        session.call(&Statement::new("SELECT 2")).await.unwrap();

        assert_eq!(session.statements(), ["SELECT 1", "SELECT 2"]);
    }

    #[tokio::test]
    async fn test_canned_rows() {
        let mut session = RecordingSession::new(DialectFeatures::generic())
            .respond("SELECT", vec![vec![Value::Integer(1)]]);

        let rows = session.call(&Statement::new("SELECT 1")).await.unwrap();
        assert_eq!(rows, vec![vec![Value::Integer(1)]]);

        let rows = session.call(&Statement::new("DROP TABLE x")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_backtick_quote_style() {
        let mut session = RecordingSession::new(DialectFeatures::mysql())
            .with_quote_style(QuoteStyle::Backtick);

        let mut statement = session.clause("DROP TABLE");
        statement.identifier("user");
        session.call(&statement).await.unwrap();

        assert_eq!(session.statements(), ["DROP TABLE `user`"]);
    }
}
