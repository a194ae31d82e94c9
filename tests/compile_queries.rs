use bibliograph::compile::compile;
use bibliograph::error::BibliographError;
use bibliograph::intent::{
    FilterType, OperatorType, QueryIntent, QueryType, RawFilter, RawIntent, RawValue, SortBy,
    SortOrder,
};

const NS: &str = "http://example.org/onto#";

fn intent(filters: Vec<(FilterType, RawValue, OperatorType)>) -> QueryIntent {
    RawIntent {
        query_type: QueryType::SearchBooks,
        filters: filters
            .into_iter()
            .map(|(filter_type, value, operator)| RawFilter { filter_type, value, operator })
            .collect(),
        sort_by: SortBy::None,
        sort_order: SortOrder::Desc,
        limit: 20,
    }
    .validate()
    .unwrap()
}

#[test]
fn compilation_is_deterministic() {
    let intent = intent(vec![
        (FilterType::Author, RawValue::Str("Le Guin".into()), OperatorType::Equals),
        (FilterType::PublicationYear, RawValue::Int(1970), OperatorType::GreaterThan),
    ]);
    let first = compile(&intent, NS).unwrap();
    let second = compile(&intent, NS).unwrap();
    assert_eq!(first.text, second.text, "same intent must compile identically");
    assert_eq!(first.select_vars, second.select_vars);
}

#[test]
fn year_range_shares_one_pattern() {
    let intent = intent(vec![
        (FilterType::PublicationYear, RawValue::Int(2000), OperatorType::GreaterThanEqual),
        (FilterType::PublicationYear, RawValue::Int(2015), OperatorType::LessThanEqual),
    ]);
    let compiled = compile(&intent, NS).unwrap();
    let pattern_count = compiled.text.matches("ns:publication_year ?year").count();
    assert_eq!(pattern_count, 1, "the year join must appear exactly once");
    assert!(compiled.text.contains("FILTER(?year >= 2000)"));
    assert!(compiled.text.contains("FILTER(?year <= 2015)"));
}

#[test]
fn author_filter_is_lowercased_substring() {
    let intent = intent(vec![(
        FilterType::Author,
        RawValue::Str("Tolkien".into()),
        OperatorType::Equals,
    )]);
    let compiled = compile(&intent, NS).unwrap();
    assert!(compiled.text.contains(r#"FILTER(CONTAINS(LCASE(?author_name), "tolkien"))"#));
    assert!(!compiled.text.contains("Tolkien"), "the literal is folded at compile time");
}

#[test]
fn genre_filter_adds_the_join_once() {
    let intent = intent(vec![
        (FilterType::Genre, RawValue::Str("Fantasy".into()), OperatorType::Equals),
        (FilterType::Genre, RawValue::Str("Horror".into()), OperatorType::Equals),
    ]);
    let compiled = compile(&intent, NS).unwrap();
    assert_eq!(compiled.text.matches("ns:has_genre").count(), 1);
    assert!(compiled.text.contains(r#"FILTER(LCASE(?g_name) = "fantasy")"#));
    assert!(compiled.text.contains(r#"FILTER(LCASE(?g_name) = "horror")"#));
}

#[test]
fn base_joins_are_always_present() {
    let intent = intent(vec![(
        FilterType::PublicationYear,
        RawValue::Int(1990),
        OperatorType::Equals,
    )]);
    let compiled = compile(&intent, NS).unwrap();
    assert!(compiled.text.contains("?book a ns:Book ."));
    assert!(compiled.text.contains("?book ns:book_title ?title ."));
    assert!(compiled.text.contains("?book ns:has_author ?author ."));
    assert_eq!(compiled.select_vars, vec!["book", "title", "author_name"]);
}

#[test]
fn sorting_projects_and_joins_the_field() {
    let mut raw = RawIntent {
        query_type: QueryType::SearchBooks,
        filters: vec![RawFilter {
            filter_type: FilterType::Author,
            value: RawValue::Str("king".into()),
            operator: OperatorType::Equals,
        }],
        sort_by: SortBy::PublicationYear,
        sort_order: SortOrder::Desc,
        limit: 10,
    };
    let compiled = compile(&raw.clone().validate().unwrap(), NS).unwrap();
    assert!(compiled.text.contains("?book ns:publication_year ?year ."));
    assert!(compiled.text.contains("ORDER BY DESC(?year)"));
    assert!(compiled.select_vars.contains(&"year".to_owned()));

    raw.sort_order = SortOrder::Asc;
    let compiled = compile(&raw.validate().unwrap(), NS).unwrap();
    assert!(compiled.text.contains("ORDER BY ASC(?year)"));
}

#[test]
fn limit_is_always_appended() {
    let mut intent = intent(vec![(
        FilterType::Author,
        RawValue::Str("x".into()),
        OperatorType::Equals,
    )]);
    intent.limit = 37;
    let compiled = compile(&intent, NS).unwrap();
    assert!(compiled.text.trim_end().ends_with("LIMIT 37"));
}

#[test]
fn unmapped_filter_types_are_rejected() {
    for filter_type in [FilterType::Theme, FilterType::Setting, FilterType::Language] {
        let intent = intent(vec![(
            filter_type,
            RawValue::Str("whatever".into()),
            OperatorType::Equals,
        )]);
        let err = compile(&intent, NS).unwrap_err();
        assert!(
            matches!(err, BibliographError::Compile(_)),
            "{:?} must be refused, not dropped",
            filter_type
        );
    }
}

#[test]
fn string_literals_are_escaped() {
    let intent = intent(vec![(
        FilterType::Genre,
        RawValue::Str(r#"fantasy" ) FILTER(?x = ?x"#.into()),
        OperatorType::Equals,
    )]);
    let compiled = compile(&intent, NS).unwrap();
    assert!(compiled.text.contains(r#"\""#), "quotes in values must be escaped");
    assert_eq!(compiled.text.matches("FILTER(").count(), 1);
}

#[test]
fn projection_follows_query_type() {
    let cases = [
        (QueryType::FindAuthors, vec!["author", "author_name"]),
        (QueryType::GetReviews, vec!["review", "rating", "title"]),
        (QueryType::SearchPublishers, vec!["publisher", "p_name"]),
        (QueryType::FindGenres, vec!["genre", "g_name"]),
    ];
    for (query_type, expected) in cases {
        let raw = RawIntent {
            query_type,
            filters: vec![RawFilter {
                filter_type: FilterType::Author,
                value: RawValue::Str("a".into()),
                operator: OperatorType::Equals,
            }],
            sort_by: SortBy::None,
            sort_order: SortOrder::Desc,
            limit: 20,
        };
        let compiled = compile(&raw.validate().unwrap(), NS).unwrap();
        assert_eq!(compiled.select_vars, expected, "{:?}", query_type);
    }
}

#[test]
fn prefix_carries_the_namespace() {
    let intent = intent(vec![(
        FilterType::Isbn,
        RawValue::Str("0618260307".into()),
        OperatorType::Equals,
    )]);
    let compiled = compile(&intent, NS).unwrap();
    assert!(compiled.text.starts_with(&format!("PREFIX ns: <{}>", NS)));
    assert!(compiled.text.contains(r#"FILTER(?isbn = "0618260307")"#));
}
