use bibliograph::compile::compile;
use bibliograph::datatype::Literal;
use bibliograph::execute::execute;
use bibliograph::ingest::{load_books_from, load_ratings_from};
use bibliograph::intent::{
    FilterType, OperatorType, QueryType, RawFilter, RawIntent, RawValue, SortBy, SortOrder,
};
use bibliograph::ontology::book_schema;
use bibliograph::persist::{PersistenceMode, Persistor};

const NS: &str = "http://example.org/onto#";

const BOOKS: &str = "\
ISBN;Book-Title;Book-Author;Year-Of-Publication;Publisher\n\
0618260307;The Hobbit;J.R.R. Tolkien;1937;Houghton Mifflin\n\
0441172717;Dune;Frank Herbert;1965;Ace\n";

const RATINGS: &str = "\
User-ID;ISBN;Book-Rating\n\
11;0618260307;10\n";

#[test]
fn fresh_database_restores_nothing() {
    let connection = PersistenceMode::InMemory.open().unwrap();
    let mut persistor = Persistor::new(&connection).unwrap();
    assert!(persistor.restore_ontology().unwrap().is_none());
}

#[test]
fn save_then_restore_preserves_the_graph() {
    let mut onto = book_schema(NS);
    load_books_from(&mut onto, BOOKS).unwrap();
    load_ratings_from(&mut onto, RATINGS).unwrap();

    let connection = PersistenceMode::InMemory.open().unwrap();
    let mut persistor = Persistor::new(&connection).unwrap();
    persistor.save_ontology(&onto).unwrap();
    let restored = persistor.restore_ontology().unwrap().expect("a saved graph");

    assert_eq!(restored.base_iri(), onto.base_iri());
    assert_eq!(restored.statement_count(), onto.statement_count());
    assert_eq!(restored.classes().len(), onto.classes().len());
    assert_eq!(
        restored.instances_of("Book").unwrap().len(),
        onto.instances_of("Book").unwrap().len()
    );

    let hobbit = restored.lookup("book_0618260307").unwrap();
    assert_eq!(
        restored.literal_of(hobbit, "book_title"),
        Some(&Literal::Str("The Hobbit".into()))
    );
    assert_eq!(
        restored.literal_of(hobbit, "publication_year"),
        Some(&Literal::Int(1937))
    );
}

#[test]
fn restored_graph_answers_queries() {
    let mut onto = book_schema(NS);
    load_books_from(&mut onto, BOOKS).unwrap();

    let connection = PersistenceMode::InMemory.open().unwrap();
    let mut persistor = Persistor::new(&connection).unwrap();
    persistor.save_ontology(&onto).unwrap();
    let restored = persistor.restore_ontology().unwrap().unwrap();

    let raw = RawIntent {
        query_type: QueryType::SearchBooks,
        filters: vec![RawFilter {
            filter_type: FilterType::PublicationYear,
            value: RawValue::Int(1950),
            operator: OperatorType::LessThan,
        }],
        sort_by: SortBy::None,
        sort_order: SortOrder::Desc,
        limit: 20,
    };
    let compiled = compile(&raw.validate().unwrap(), restored.base_iri()).unwrap();
    let results = execute(&compiled, &restored).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results.value(0, "title"), Some("The Hobbit"));
}

#[test]
fn saving_twice_does_not_duplicate_statements() {
    let mut onto = book_schema(NS);
    load_books_from(&mut onto, BOOKS).unwrap();

    let connection = PersistenceMode::InMemory.open().unwrap();
    let mut persistor = Persistor::new(&connection).unwrap();
    persistor.save_ontology(&onto).unwrap();
    persistor.save_ontology(&onto).unwrap();
    let restored = persistor.restore_ontology().unwrap().unwrap();
    assert_eq!(restored.statement_count(), onto.statement_count());
}
