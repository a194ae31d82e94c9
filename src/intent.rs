//! The structured query request an external model produces, and its
//! validation into a form the compiler accepts.
//!
//! `RawIntent` mirrors the JSON schema the model is constrained to;
//! [`RawIntent::validate`] is the only way to obtain a [`QueryIntent`], so
//! downstream code never sees an empty filter list, an out-of-range limit,
//! an uncoerced value, or an incompatible sort.

use serde::{Deserialize, Serialize};

use crate::datatype::Literal;
use crate::error::{BibliographError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    SearchBooks,
    FindAuthors,
    GetReviews,
    SearchPublishers,
    FindGenres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorType {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterThanEqual,
    #[serde(rename = "<=")]
    LessThanEqual,
    #[serde(rename = "!=")]
    NotEquals,
}
impl OperatorType {
    pub fn symbol(&self) -> &'static str {
        match self {
            OperatorType::Equals => "=",
            OperatorType::Contains => "contains",
            OperatorType::GreaterThan => ">",
            OperatorType::LessThan => "<",
            OperatorType::GreaterThanEqual => ">=",
            OperatorType::LessThanEqual => "<=",
            OperatorType::NotEquals => "!=",
        }
    }
}
impl Default for OperatorType {
    fn default() -> Self { OperatorType::Equals }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Theme,
    Author,
    Genre,
    Publisher,
    PublicationYear,
    PageCount,
    Rating,
    Setting,
    Language,
    Isbn,
}
impl FilterType {
    pub fn name(&self) -> &'static str {
        match self {
            FilterType::Theme => "theme",
            FilterType::Author => "author",
            FilterType::Genre => "genre",
            FilterType::Publisher => "publisher",
            FilterType::PublicationYear => "publication_year",
            FilterType::PageCount => "page_count",
            FilterType::Rating => "rating",
            FilterType::Setting => "setting",
            FilterType::Language => "language",
            FilterType::Isbn => "isbn",
        }
    }
    /// Filter types whose values live in a numeric domain.
    pub fn expects_number(&self) -> bool {
        matches!(
            self,
            FilterType::PublicationYear | FilterType::PageCount | FilterType::Rating
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Title,
    PublicationYear,
    PageCount,
    Rating,
    AuthorName,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}
impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A filter value as the model may emit it, before coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Str(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFilter {
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    pub value: RawValue,
    #[serde(default)]
    pub operator: OperatorType,
}

/// The unvalidated intent, straight from the model's JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIntent {
    pub query_type: QueryType,
    #[serde(default)]
    pub filters: Vec<RawFilter>,
    #[serde(default = "default_sort_by")]
    pub sort_by: SortBy,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    #[serde(default = "default_limit")]
    pub limit: i64,
}
fn default_sort_by() -> SortBy { SortBy::None }
fn default_sort_order() -> SortOrder { SortOrder::Desc }
fn default_limit() -> i64 { 20 }

#[derive(Debug, Clone, PartialEq)]
pub struct QueryFilter {
    pub filter_type: FilterType,
    pub value: Literal,
    pub operator: OperatorType,
}

/// A validated intent; only [`RawIntent::validate`] constructs one.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub query_type: QueryType,
    pub filters: Vec<QueryFilter>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub limit: u32,
}

impl RawIntent {
    /// Pure transform of the raw intent into its validated form.
    pub fn validate(self) -> Result<QueryIntent> {
        if self.filters.is_empty() {
            return Err(BibliographError::Validation(
                "at least one filter is required for a meaningful query".into(),
            ));
        }
        if !(1..=100).contains(&self.limit) {
            return Err(BibliographError::Validation(format!(
                "limit must be between 1 and 100, got {}",
                self.limit
            )));
        }
        let mut filters = Vec::with_capacity(self.filters.len());
        for raw in self.filters {
            filters.push(coerce_filter(raw)?);
        }
        check_sort_compatibility(self.query_type, self.sort_by)?;
        Ok(QueryIntent {
            query_type: self.query_type,
            filters,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            limit: self.limit as u32,
        })
    }
}

fn coerce_filter(raw: RawFilter) -> Result<QueryFilter> {
    let value = if raw.filter_type.expects_number() {
        if raw.operator == OperatorType::Contains {
            return Err(BibliographError::Validation(format!(
                "operator 'contains' is not valid for {}",
                raw.filter_type.name()
            )));
        }
        match raw.value {
            RawValue::Int(i) => Literal::Int(i),
            RawValue::Float(f) => Literal::Float(f),
            RawValue::Str(s) => match s.trim().parse::<i64>() {
                Ok(i) => Literal::Int(i),
                Err(_) => {
                    return Err(BibliographError::Validation(format!(
                        "{} must be a number",
                        raw.filter_type.name()
                    )))
                }
            },
        }
    } else if raw.filter_type == FilterType::Isbn {
        // ISBNs arrive as strings or bare numbers; both render the same
        match raw.value {
            RawValue::Str(s) => Literal::Str(s),
            RawValue::Int(i) => Literal::Str(i.to_string()),
            RawValue::Float(f) => Literal::Str(f.to_string()),
        }
    } else {
        match raw.value {
            RawValue::Str(s) => Literal::Str(s),
            _ => {
                return Err(BibliographError::Validation(format!(
                    "{} must be a string",
                    raw.filter_type.name()
                )))
            }
        }
    };
    Ok(QueryFilter { filter_type: raw.filter_type, value, operator: raw.operator })
}

fn check_sort_compatibility(query_type: QueryType, sort_by: SortBy) -> Result<()> {
    let allowed = match query_type {
        QueryType::SearchBooks => true,
        QueryType::FindAuthors => matches!(sort_by, SortBy::AuthorName | SortBy::None),
        QueryType::GetReviews => {
            matches!(sort_by, SortBy::Rating | SortBy::Title | SortBy::None)
        }
        QueryType::SearchPublishers | QueryType::FindGenres => sort_by == SortBy::None,
    };
    if allowed {
        Ok(())
    } else {
        Err(BibliographError::Validation(format!(
            "cannot sort {:?} results by {:?}",
            query_type, sort_by
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(filters: Vec<RawFilter>) -> RawIntent {
        RawIntent {
            query_type: QueryType::SearchBooks,
            filters,
            sort_by: SortBy::None,
            sort_order: SortOrder::Desc,
            limit: 20,
        }
    }

    #[test]
    fn deserializes_operator_symbols() {
        let json = r#"{"type": "publication_year", "value": "1999", "operator": ">="}"#;
        let f: RawFilter = serde_json::from_str(json).unwrap();
        assert_eq!(f.operator, OperatorType::GreaterThanEqual);
    }

    #[test]
    fn operator_defaults_to_equals() {
        let json = r#"{"type": "author", "value": "Tolkien"}"#;
        let f: RawFilter = serde_json::from_str(json).unwrap();
        assert_eq!(f.operator, OperatorType::Equals);
    }

    #[test]
    fn numeric_string_is_coerced() {
        let intent = raw(vec![RawFilter {
            filter_type: FilterType::PublicationYear,
            value: RawValue::Str(" 2001 ".into()),
            operator: OperatorType::Equals,
        }])
        .validate()
        .unwrap();
        assert_eq!(intent.filters[0].value, Literal::Int(2001));
    }

    #[test]
    fn failed_coercion_names_the_filter() {
        let err = raw(vec![RawFilter {
            filter_type: FilterType::PageCount,
            value: RawValue::Str("many".into()),
            operator: OperatorType::Equals,
        }])
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("page_count"));
    }
}
