//! Deterministic compilation of a validated [`QueryIntent`] into query text.
//!
//! The compiler is a pure function: the same intent and base namespace
//! always produce byte-identical text, which the test suite relies on.
//! Alongside the text it returns the projected variable names in order, so
//! the executor never has to re-parse the SELECT clause.

use crate::error::{BibliographError, Result};
use crate::intent::{FilterType, QueryIntent, QueryType, SortBy};

/// A compiled query: the text handed to the store and the variables it
/// projects, in SELECT order. Built once, consumed once, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub text: String,
    pub select_vars: Vec<String>,
}

/// Structural join fragments, keyed so each is contributed at most once no
/// matter how many filters touch the same concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatternKey {
    Type,
    Title,
    Author,
    Year,
    Pages,
    Review,
    Genre,
    Publisher,
    Isbn,
}

fn pattern_text(key: PatternKey) -> &'static str {
    match key {
        PatternKey::Type => "?book a ns:Book .",
        PatternKey::Title => "?book ns:book_title ?title .",
        PatternKey::Author => "?book ns:has_author ?author . ?author ns:author_name ?author_name .",
        PatternKey::Year => "?book ns:publication_year ?year .",
        PatternKey::Pages => "?book ns:page_count ?pages .",
        PatternKey::Review => "?book ns:has_review ?review . ?review ns:rating ?rating .",
        PatternKey::Genre => "?book ns:has_genre ?genre . ?genre ns:genre_name ?g_name .",
        PatternKey::Publisher => {
            "?book ns:has_publisher ?publisher . ?publisher ns:publisher_name ?p_name ."
        }
        PatternKey::Isbn => "?book ns:isbn ?isbn .",
    }
}

struct QueryParts {
    patterns: Vec<PatternKey>,
    filters: Vec<String>,
    select_vars: Vec<String>,
}
impl QueryParts {
    fn ensure_pattern(&mut self, key: PatternKey) {
        if !self.patterns.contains(&key) {
            self.patterns.push(key);
        }
    }
    fn ensure_var(&mut self, var: &str) {
        if !self.select_vars.iter().any(|v| v == var) {
            self.select_vars.push(var.to_owned());
        }
    }
}

/// Escape a string literal before interpolation into query text. Filter
/// values come straight from model output, so this is not optional.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn sort_target(sort_by: SortBy) -> Option<(&'static str, PatternKey)> {
    match sort_by {
        SortBy::Title => Some(("title", PatternKey::Title)),
        SortBy::PublicationYear => Some(("year", PatternKey::Year)),
        SortBy::PageCount => Some(("pages", PatternKey::Pages)),
        SortBy::Rating => Some(("rating", PatternKey::Review)),
        SortBy::AuthorName => Some(("author_name", PatternKey::Author)),
        SortBy::None => None,
    }
}

/// Compile an intent against a base namespace. Pure; no side effects.
pub fn compile(intent: &QueryIntent, base_namespace: &str) -> Result<CompiledQuery> {
    let mut parts = QueryParts {
        // The structural joins for the default projection are always present,
        // filters or not.
        patterns: vec![PatternKey::Type, PatternKey::Title, PatternKey::Author],
        filters: Vec::new(),
        select_vars: Vec::new(),
    };

    // The projection head follows the query type.
    match intent.query_type {
        QueryType::SearchBooks => {
            for v in ["book", "title", "author_name"] {
                parts.ensure_var(v);
            }
        }
        QueryType::FindAuthors => {
            for v in ["author", "author_name"] {
                parts.ensure_var(v);
            }
        }
        QueryType::GetReviews => {
            parts.ensure_pattern(PatternKey::Review);
            for v in ["review", "rating", "title"] {
                parts.ensure_var(v);
            }
        }
        QueryType::SearchPublishers => {
            parts.ensure_pattern(PatternKey::Publisher);
            for v in ["publisher", "p_name"] {
                parts.ensure_var(v);
            }
        }
        QueryType::FindGenres => {
            parts.ensure_pattern(PatternKey::Genre);
            for v in ["genre", "g_name"] {
                parts.ensure_var(v);
            }
        }
    }

    for filter in &intent.filters {
        let op = filter.operator.symbol();
        let value = &filter.value;
        match filter.filter_type {
            FilterType::PublicationYear => {
                parts.ensure_pattern(PatternKey::Year);
                parts.filters.push(format!("FILTER(?year {} {})", op, value));
            }
            FilterType::PageCount => {
                parts.ensure_pattern(PatternKey::Pages);
                parts.filters.push(format!("FILTER(?pages {} {})", op, value));
            }
            FilterType::Rating => {
                parts.ensure_pattern(PatternKey::Review);
                parts.filters.push(format!("FILTER(?rating {} {})", op, value));
            }
            FilterType::Author => {
                let needle = escape_literal(&value.to_string().to_lowercase());
                parts.filters.push(format!(
                    "FILTER(CONTAINS(LCASE(?author_name), \"{}\"))",
                    needle
                ));
            }
            FilterType::Genre => {
                parts.ensure_pattern(PatternKey::Genre);
                let needle = escape_literal(&value.to_string().to_lowercase());
                parts
                    .filters
                    .push(format!("FILTER(LCASE(?g_name) = \"{}\")", needle));
            }
            FilterType::Publisher => {
                parts.ensure_pattern(PatternKey::Publisher);
                let needle = escape_literal(&value.to_string().to_lowercase());
                parts
                    .filters
                    .push(format!("FILTER(LCASE(?p_name) = \"{}\")", needle));
            }
            FilterType::Isbn => {
                parts.ensure_pattern(PatternKey::Isbn);
                let needle = escape_literal(&value.to_string());
                parts.filters.push(format!("FILTER(?isbn = \"{}\")", needle));
            }
            FilterType::Theme | FilterType::Setting | FilterType::Language => {
                // No graph pattern exists for these; dropping a constraint
                // silently would return wrong results, so refuse instead.
                return Err(BibliographError::Compile(format!(
                    "no graph pattern exists for filter type '{}'",
                    filter.filter_type.name()
                )));
            }
        }
    }

    // Sorting: resolve through the fixed field table, materialize the
    // field's pattern, and make sure the variable is projected.
    let mut order_by = None;
    if let Some((var, key)) = sort_target(intent.sort_by) {
        parts.ensure_pattern(key);
        parts.ensure_var(var);
        order_by = Some(format!(
            "ORDER BY {}(?{})",
            intent.sort_order.keyword(),
            var
        ));
    }

    let mut text = String::new();
    text.push_str(&format!("PREFIX ns: <{}>\n", base_namespace));
    let projected: Vec<String> = parts.select_vars.iter().map(|v| format!("?{}", v)).collect();
    text.push_str(&format!("SELECT DISTINCT {} WHERE {{\n", projected.join(" ")));
    for key in &parts.patterns {
        text.push_str("  ");
        text.push_str(pattern_text(*key));
        text.push('\n');
    }
    for filter in &parts.filters {
        text.push_str("  ");
        text.push_str(filter);
        text.push('\n');
    }
    text.push_str("}\n");
    if let Some(order) = order_by {
        text.push_str(&order);
        text.push('\n');
    }
    text.push_str(&format!("LIMIT {}\n", intent.limit));

    Ok(CompiledQuery { text, select_vars: parts.select_vars })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_escaping() {
        assert_eq!(escape_literal(r#"O"Brien\"#), r#"O\"Brien\\"#);
    }
}
