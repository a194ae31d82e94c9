//! The orchestrator: one natural-language question in, one result set out.
//!
//! Sequence: describe the schema, build the grounding prompt, obtain a
//! candidate intent from the external model (under an explicit timeout),
//! validate, compile, execute. No retries and no caching at this layer; a
//! failing model or store call aborts the whole request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::compile::compile;
use crate::datatype::Literal;
use crate::error::{BibliographError, Result};
use crate::execute::{execute, ResultSet};
use crate::llm::{intent_response_schema, IntentRequest, IntentSource, PromptMessage, Role};
use crate::ontology::Ontology;
use crate::schema::describe;

const SYSTEM_RULES: &str = "\
You are a query planner for a book knowledge graph. Translate the user's \
question into a structured query intent, as JSON matching the response \
schema. Rules:\n\
- Reference only classes, relationships and attributes from the schema.\n\
- Provide at least one filter; questions without a constraint cannot be \
answered.\n\
- Filter values are strings; pick the comparison operator that matches the \
question.\n\
- limit must be between 1 and 100.";

/// Knobs for the model call; everything else is fixed per request.
#[derive(Debug, Clone)]
pub struct AnswerOptions {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
}
impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_owned(),
            temperature: 0.1,
            max_output_tokens: 1024,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct Answerer<M: IntentSource> {
    onto: Arc<Ontology>,
    model: M,
    options: AnswerOptions,
}

impl<M: IntentSource> Answerer<M> {
    pub fn new(onto: Arc<Ontology>, model: M, options: AnswerOptions) -> Self {
        Self { onto, model, options }
    }

    pub fn ontology(&self) -> &Ontology {
        &self.onto
    }

    pub async fn answer(&self, question: &str) -> Result<ResultSet> {
        let started = Instant::now();

        // schema text is rebuilt every call; grounding must reflect the live graph
        let schema_text = describe(&self.onto);
        let request = IntentRequest {
            model: self.options.model.clone(),
            messages: vec![
                PromptMessage { role: Role::System, content: SYSTEM_RULES.to_owned() },
                PromptMessage {
                    role: Role::User,
                    content: format!("Schema:\n{}\n\nQuestion: {}", schema_text, question),
                },
            ],
            response_schema: intent_response_schema(),
            temperature: self.options.temperature,
            max_output_tokens: self.options.max_output_tokens,
        };

        let response = tokio::time::timeout(self.options.timeout, self.model.generate_intent(request))
            .await
            .map_err(|_| {
                BibliographError::ModelTransport(format!(
                    "model call exceeded {:?}",
                    self.options.timeout
                ))
            })??;

        let intent = response.intent.validate()?;
        let compiled = compile(&intent, self.onto.base_iri())?;
        let results = execute(&compiled, self.onto.as_ref())?;

        info!(
            ms = started.elapsed().as_secs_f64() * 1000.0,
            rows = results.len(),
            "question answered"
        );
        Ok(results)
    }
}

/// A titled summary of one Book individual. Absent properties are typed
/// optionals; nothing probes for attribute existence.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BookSummary {
    pub id: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i64>,
    pub isbn: Option<String>,
}

/// Enumerate up to `limit` Book individuals with their headline properties.
pub fn sample_books(onto: &Ontology, limit: usize) -> Vec<BookSummary> {
    let Some(books) = onto.instances_of("Book") else {
        return Vec::new();
    };
    let mut summaries = Vec::new();
    for book in books.iter().take(limit) {
        let string_of = |property: &str| {
            onto.literal_of(book, property).map(|l| l.to_string())
        };
        let year = match onto.literal_of(book, "publication_year") {
            Some(Literal::Int(y)) => Some(*y),
            _ => None,
        };
        let author = onto
            .related_of(book, "has_author")
            .and_then(|a| onto.literal_of(a, "author_name"))
            .map(|l| l.to_string());
        let publisher = onto
            .related_of(book, "has_publisher")
            .and_then(|p| onto.literal_of(p, "publisher_name"))
            .map(|l| l.to_string());
        summaries.push(BookSummary {
            id: onto.name_of(book).unwrap_or_default().to_owned(),
            title: string_of("book_title"),
            author,
            publisher,
            year,
            isbn: string_of("isbn"),
        });
    }
    summaries
}
