use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bibliograph::compile::compile;
use bibliograph::datatype::Literal;
use bibliograph::execute::execute;
use bibliograph::intent::{
    FilterType, OperatorType, QueryType, RawFilter, RawIntent, RawValue, SortBy, SortOrder,
};
use bibliograph::ontology::{book_schema, Ontology};

const NS: &str = "http://example.org/onto#";

fn seeded(books: usize) -> Ontology {
    let mut onto = book_schema(NS);
    let authors: Vec<_> = (0..books / 10 + 1)
        .map(|i| {
            let author = onto.add_individual(&format!("author_{}", i), "Author");
            onto.assert_literal(author, "author_name", Literal::Str(format!("Author {}", i)));
            author
        })
        .collect();
    for i in 0..books {
        let book = onto.add_individual(&format!("book_{}", i), "Book");
        onto.assert_literal(book, "book_title", Literal::Str(format!("Title {}", i)));
        onto.assert_literal(book, "publication_year", Literal::Int(1900 + (i % 120) as i64));
        onto.assert_relation(book, "has_author", authors[i % authors.len()]);
    }
    onto
}

fn search_intent() -> RawIntent {
    RawIntent {
        query_type: QueryType::SearchBooks,
        filters: vec![
            RawFilter {
                filter_type: FilterType::PublicationYear,
                value: RawValue::Int(1980),
                operator: OperatorType::GreaterThanEqual,
            },
            RawFilter {
                filter_type: FilterType::Author,
                value: RawValue::Str("author 3".into()),
                operator: OperatorType::Equals,
            },
        ],
        sort_by: SortBy::PublicationYear,
        sort_order: SortOrder::Desc,
        limit: 50,
    }
}

fn bench_compile(c: &mut Criterion) {
    let intent = search_intent().validate().unwrap();
    c.bench_function("compile book search", |b| {
        b.iter(|| compile(black_box(&intent), black_box(NS)).unwrap())
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let onto = seeded(2_000);
    let intent = search_intent().validate().unwrap();
    let compiled = compile(&intent, NS).unwrap();
    c.bench_function("evaluate over 2k books", |b| {
        b.iter(|| execute(black_box(&compiled), &onto).unwrap())
    });
}

criterion_group!(benches, bench_compile, bench_evaluate);
criterion_main!(benches);
