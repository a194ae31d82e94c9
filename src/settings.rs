//! Runtime configuration, layered from an optional `bibliograph.toml` and
//! `BIBLIOGRAPH_`-prefixed environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BibliographError, Result};
use crate::persist::PersistenceMode;
use crate::service::AnswerOptions;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    /// Falls back to the GEMINI_API_KEY environment variable.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}
impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gemini-2.0-flash".to_owned(),
            api_key: None,
            temperature: 0.1,
            max_output_tokens: 1024,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}
impl Default for ServerSettings {
    fn default() -> Self {
        Self { bind: "127.0.0.1:8080".to_owned() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file, or ":memory:" for a throwaway store.
    pub database: String,
    pub base_iri: String,
    /// Directory holding books.csv / ratings.csv / users.csv.
    pub data_dir: String,
    pub model: ModelSettings,
    pub server: ServerSettings,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            database: "bibliograph.db".to_owned(),
            base_iri: "http://bibliograph.dev/onto#".to_owned(),
            data_dir: "data".to_owned(),
            model: ModelSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings> {
        let source = config::Config::builder()
            .add_source(config::File::with_name("bibliograph").required(false))
            .add_source(config::Environment::with_prefix("BIBLIOGRAPH").separator("__"))
            .build()
            .map_err(|e| BibliographError::Config(e.to_string()))?;
        source
            .try_deserialize()
            .map_err(|e| BibliographError::Config(e.to_string()))
    }

    pub fn persistence_mode(&self) -> PersistenceMode {
        if self.database == ":memory:" {
            PersistenceMode::InMemory
        } else {
            PersistenceMode::File(PathBuf::from(&self.database))
        }
    }

    pub fn answer_options(&self) -> AnswerOptions {
        AnswerOptions {
            model: self.model.name.clone(),
            temperature: self.model.temperature,
            max_output_tokens: self.model.max_output_tokens,
            timeout: Duration::from_secs(self.model.timeout_secs),
        }
    }

    pub fn api_key(&self) -> Result<String> {
        self.model
            .api_key
            .clone()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .ok_or_else(|| {
                BibliographError::Config(
                    "no model API key: set model.api_key or GEMINI_API_KEY".into(),
                )
            })
    }
}
