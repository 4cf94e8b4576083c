use chrono::NaiveDateTime;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::errors::ExtractError;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub extraction: ExtractionConfig,
    pub conversion: ConversionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub step_months: u32,
    pub preview_rows: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConversionConfig {
    pub enabled: bool,
    pub host: HostKind,
    pub program: String,
    pub extension: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    Soffice,
    Docx,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Rejects settings that would make the run loop or the converter misbehave.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.extraction.step_months == 0 {
            return Err(ExtractError::Config(
                "extraction.step_months must be greater than zero".into(),
            ));
        }
        if self.conversion.extension.trim_start_matches('.').is_empty() {
            return Err(ExtractError::Config(
                "conversion.extension must not be empty".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ExtractError::Config(
                "database.max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
