//! Read-only catalog queries.

use crate::error::Result;
use crate::session::Session;

/// Queries catalog metadata through a session.
#[derive(Debug)]
pub struct InformationSchema<'a, S> {
    session: &'a mut S,
}

impl<'a, S: Session> InformationSchema<'a, S> {
    /// Wraps a session.
    pub fn new(session: &'a mut S) -> Self {
        Self { session }
    }

    /// Returns true if a table named exactly `name` exists.
    ///
    /// The comparison is an exact equality; case folding is whatever the
    /// catalog does.
    pub async fn table_exists(&mut self, name: &str) -> Result<bool> {
        let catalog = self.session.table_catalog();

        let mut statement = self.session.clause("SELECT * FROM");
        statement
            .identifier(catalog.relation)
            .clause("WHERE")
            .identifier(catalog.name_column)
            .clause("=")
            .literal(name);

        if let Some((column, value)) = catalog.kind {
            statement
                .clause("AND")
                .identifier(column)
                .clause("=")
                .literal(value);
        }

        let rows = self.session.call(&statement).await?;
        Ok(!rows.is_empty())
    }
}
