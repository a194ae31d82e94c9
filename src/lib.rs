//! Bibliograph – natural-language questions over a book/author/publisher/
//! review graph.
//!
//! A question is answered in one pass: the live ontology is rendered into
//! grounding text, an external language model turns question plus grounding
//! into a structured [`intent::QueryIntent`], the intent is compiled into a
//! small SPARQL subset, and the compiled text is evaluated against the
//! in-memory statement store.
//!
//! ## Modules
//! * [`ontology`] – Node interner, statement store and schema registry.
//! * [`datatype`] – The [`datatype::Literal`] value type carried by
//!   statements, with display-safe rendering and SQLite conversion.
//! * [`intent`] – The structured query request and its validator.
//! * [`schema`] – Grounding-text rendering of the live ontology.
//! * [`compile`] – Deterministic intent → query-text compilation.
//! * [`sparql`] – Parser and evaluator for the emitted query subset.
//! * [`execute`] – The store trait and positional→named row realignment.
//! * [`llm`] – External-model accessor with enforced JSON output schema.
//! * [`service`] – The orchestrator: one question in, one result set out.
//! * [`ingest`] – Spreadsheet population of the graph.
//! * [`persist`] – SQLite persistence and restoration.
//! * [`viz`] – Bounded DOT export of the instance graph.
//! * [`server`] – HTTP front end.
//!
//! ## Quick Start
//! ```
//! use bibliograph::ontology::book_schema;
//! use bibliograph::intent::{RawIntent, RawFilter, RawValue, FilterType,
//!     OperatorType, QueryType, SortBy, SortOrder};
//! use bibliograph::{compile::compile, execute::execute};
//!
//! let onto = book_schema("http://example.org/onto#");
//! let intent = RawIntent {
//!     query_type: QueryType::SearchBooks,
//!     filters: vec![RawFilter {
//!         filter_type: FilterType::PublicationYear,
//!         value: RawValue::Str("1990".into()),
//!         operator: OperatorType::GreaterThanEqual,
//!     }],
//!     sort_by: SortBy::None,
//!     sort_order: SortOrder::Desc,
//!     limit: 10,
//! }
//! .validate()
//! .unwrap();
//! let compiled = compile(&intent, onto.base_iri()).unwrap();
//! let results = execute(&compiled, &onto).unwrap();
//! assert!(results.is_empty());
//! ```
//!
//! ## Error handling
//! One taxonomy in [`error`]: validation aborts a request, execution
//! failures are distinguished from empty results, model transport and
//! response problems propagate to the caller. Nothing is swallowed into
//! empty defaults.

pub mod compile;
pub mod datatype;
pub mod error;
pub mod execute;
pub mod ingest;
pub mod intent;
pub mod llm;
pub mod ontology;
pub mod persist;
pub mod schema;
pub mod server;
pub mod service;
pub mod settings;
pub mod sparql;
pub mod viz;
