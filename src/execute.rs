//! Execution of compiled query text against a store, realigning positional
//! result values to the variable names the compiler projected.
//!
//! A failing store call is returned as an error; an empty [`ResultSet`]
//! means zero matches and nothing else.

use serde::Serialize;

use crate::compile::CompiledQuery;
use crate::error::{BibliographError, Result};
use crate::ontology::Ontology;
use crate::sparql;

/// A store that can answer query text with ordered positional rows of
/// display-safe strings. Injected per call; nothing here owns it.
pub trait GraphStore {
    fn select(&self, query: &str) -> Result<Vec<Vec<String>>>;
}

impl GraphStore for Ontology {
    fn select(&self, query: &str) -> Result<Vec<Vec<String>>> {
        sparql::evaluate(self, query)
    }
}

/// Named columns plus ordered rows, at most `intent.limit` of them, in
/// store order. Single-use; rebuilt fresh per request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
    /// The value bound to `column` in row `row`, if both exist.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index)).map(String::as_str)
    }
}

/// Run the compiled text and bind each positional value back to its
/// declared variable name from `select_vars`.
pub fn execute(query: &CompiledQuery, store: &impl GraphStore) -> Result<ResultSet> {
    let rows = store.select(&query.text)?;
    for row in &rows {
        if row.len() != query.select_vars.len() {
            return Err(BibliographError::Execution(format!(
                "store returned {} values for {} projected variables",
                row.len(),
                query.select_vars.len()
            )));
        }
    }
    Ok(ResultSet { columns: query.select_vars.clone(), rows })
}
