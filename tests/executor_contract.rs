use bibliograph::compile::{compile, CompiledQuery};
use bibliograph::error::{BibliographError, Result};
use bibliograph::execute::{execute, GraphStore};
use bibliograph::intent::{
    FilterType, OperatorType, QueryType, RawFilter, RawIntent, RawValue, SortBy, SortOrder,
};
use bibliograph::ontology::book_schema;

const NS: &str = "http://example.org/onto#";

fn any_intent() -> CompiledQuery {
    let raw = RawIntent {
        query_type: QueryType::SearchBooks,
        filters: vec![RawFilter {
            filter_type: FilterType::Author,
            value: RawValue::Str("tolkien".into()),
            operator: OperatorType::Equals,
        }],
        sort_by: SortBy::None,
        sort_order: SortOrder::Desc,
        limit: 20,
    };
    compile(&raw.validate().unwrap(), NS).unwrap()
}

struct FailingStore;
impl GraphStore for FailingStore {
    fn select(&self, _query: &str) -> Result<Vec<Vec<String>>> {
        Err(BibliographError::Execution("store offline".into()))
    }
}

struct MisalignedStore;
impl GraphStore for MisalignedStore {
    fn select(&self, _query: &str) -> Result<Vec<Vec<String>>> {
        Ok(vec![vec!["only-one-value".into()]])
    }
}

#[test]
fn store_failure_is_an_error_not_an_empty_set() {
    let err = execute(&any_intent(), &FailingStore).unwrap_err();
    assert!(matches!(err, BibliographError::Execution(_)));
    assert!(err.to_string().contains("store offline"));
}

#[test]
fn zero_matches_is_an_empty_set_not_an_error() {
    // a schema with no individuals matches nothing
    let onto = book_schema(NS);
    let results = execute(&any_intent(), &onto).unwrap();
    assert!(results.is_empty());
    assert_eq!(results.columns, vec!["book", "title", "author_name"]);
}

#[test]
fn malformed_query_text_is_a_parse_error() {
    let onto = book_schema(NS);
    let compiled = CompiledQuery {
        text: "SELECT gibberish {".into(),
        select_vars: vec!["x".into()],
    };
    let err = execute(&compiled, &onto).unwrap_err();
    assert!(matches!(err, BibliographError::Parse { .. }));
}

#[test]
fn misaligned_rows_are_detected() {
    let err = execute(&any_intent(), &MisalignedStore).unwrap_err();
    assert!(matches!(err, BibliographError::Execution(_)));
    assert!(err.to_string().contains("projected"));
}

#[test]
fn columns_come_from_select_vars_not_text() {
    struct EchoStore;
    impl GraphStore for EchoStore {
        fn select(&self, _query: &str) -> Result<Vec<Vec<String>>> {
            Ok(vec![vec!["b1".into(), "Dune".into(), "Frank Herbert".into()]])
        }
    }
    let results = execute(&any_intent(), &EchoStore).unwrap();
    assert_eq!(results.value(0, "title"), Some("Dune"));
    assert_eq!(results.value(0, "author_name"), Some("Frank Herbert"));
    assert_eq!(results.value(0, "nope"), None);
}
