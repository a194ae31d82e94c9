//! Binary entry point: load settings, restore or ingest the graph, then
//! answer one question, export a DOT rendering, or serve HTTP.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bibliograph::error::{BibliographError, Result};
use bibliograph::ingest;
use bibliograph::llm::GeminiClient;
use bibliograph::ontology::{book_schema, Ontology};
use bibliograph::persist::Persistor;
use bibliograph::server;
use bibliograph::service::{sample_books, Answerer};
use bibliograph::settings::Settings;
use bibliograph::viz;

fn load_graph(settings: &Settings) -> Result<Ontology> {
    let connection = settings.persistence_mode().open()?;
    let mut persistor = Persistor::new(&connection)?;
    if let Some(onto) = persistor.restore_ontology()? {
        return Ok(onto);
    }

    let mut onto = book_schema(&settings.base_iri);
    let data_dir = Path::new(&settings.data_dir);
    let books = data_dir.join("books.csv");
    if books.exists() {
        ingest::load_books(&mut onto, &books)?;
        let ratings = data_dir.join("ratings.csv");
        if ratings.exists() {
            ingest::load_ratings(&mut onto, &ratings)?;
        }
        let users = data_dir.join("users.csv");
        if users.exists() {
            ingest::load_users(&mut onto, &users)?;
        }
        persistor.save_ontology(&onto)?;
    } else {
        info!(dir = %data_dir.display(), "no spreadsheets found, starting with an empty graph");
    }
    Ok(onto)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::load()?;
    let onto = load_graph(&settings)?;
    info!(statements = onto.statement_count(), "graph ready");
    for book in sample_books(&onto, 5) {
        info!(
            id = %book.id,
            title = book.title.as_deref().unwrap_or("?"),
            author = book.author.as_deref().unwrap_or("?"),
            "sample book"
        );
    }

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("--ask") => {
            let question = args
                .get(1)
                .ok_or_else(|| BibliographError::Config("--ask needs a question".into()))?;
            let client = GeminiClient::new(settings.api_key()?);
            let answerer = Answerer::new(Arc::new(onto), client, settings.answer_options());
            let results = answerer.answer(question).await?;
            println!("{}", results.columns.join("\t"));
            for row in &results.rows {
                println!("{}", row.join("\t"));
            }
            Ok(())
        }
        Some("--dot") => {
            let path = args.get(1).map(String::as_str).unwrap_or("ontology.dot");
            fs::write(path, viz::to_dot(&onto, 50))
                .map_err(|e| BibliographError::Config(format!("cannot write {}: {}", path, e)))?;
            info!(%path, "graph exported");
            Ok(())
        }
        Some("--serve") | None => {
            let client = GeminiClient::new(settings.api_key()?);
            let answerer = Arc::new(Answerer::new(
                Arc::new(onto),
                client,
                settings.answer_options(),
            ));
            let listener = tokio::net::TcpListener::bind(&settings.server.bind)
                .await
                .map_err(|e| {
                    BibliographError::Config(format!("cannot bind {}: {}", settings.server.bind, e))
                })?;
            info!(bind = %settings.server.bind, "serving");
            axum::serve(listener, server::router(answerer))
                .await
                .map_err(|e| BibliographError::Execution(e.to_string()))
        }
        Some(other) => Err(BibliographError::Config(format!(
            "unknown argument '{}'; expected --ask, --dot or --serve",
            other
        ))),
    }
}
