use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::error::BibliographError;
use crate::llm::IntentSource;
use crate::service::Answerer;

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub status: String,
    pub elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn status_for(error: &BibliographError) -> StatusCode {
    match error {
        BibliographError::Validation(_)
        | BibliographError::Compile(_)
        | BibliographError::Parse { .. } => StatusCode::BAD_REQUEST,
        BibliographError::ModelTransport(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router<M: IntentSource + 'static>(service: Arc<Answerer<M>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::POST])
        .allow_headers(Any);
    Router::new()
        .route(
            "/v1/ask",
            post(move |Json(req): Json<AskRequest>| {
                let service = Arc::clone(&service);
                async move {
                    let started = Instant::now();
                    let outcome = service.answer(&req.question).await;
                    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                    match outcome {
                        Ok(results) => {
                            info!(ms = elapsed_ms, rows = results.len(), "ask complete");
                            let body = AskResponse {
                                status: "ok".into(),
                                elapsed_ms,
                                row_count: Some(results.len()),
                                columns: Some(results.columns),
                                rows: Some(results.rows),
                                error: None,
                            };
                            (StatusCode::OK, Json(body))
                        }
                        Err(e) => {
                            let status = status_for(&e);
                            let msg = format!("{e}");
                            warn!(%msg, code = %status.as_u16(), "ask error");
                            let body = AskResponse {
                                status: "error".into(),
                                elapsed_ms,
                                columns: None,
                                rows: None,
                                row_count: None,
                                error: Some(msg),
                            };
                            (status, Json(body))
                        }
                    }
                }
            }),
        )
        .layer(cors)
}
