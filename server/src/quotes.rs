//! Read-only quote list loaded once at startup

use log::{info, warn};
use rand::seq::SliceRandom;
use serde_json::Value;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Used when the configured quote file cannot be loaded
pub const FALLBACK_QUOTES: [&str; 3] = [
    "Progress, not perfection.",
    "Every expert was once a beginner.",
    "Small steps lead to big change.",
];

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("cannot read quote file: {0}")]
    Io(#[from] io::Error),
    #[error("quote file is not a JSON list: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct QuoteBank {
    quotes: Vec<String>,
}

impl QuoteBank {
    pub fn new(quotes: Vec<String>) -> Self {
        Self { quotes }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_QUOTES.iter().map(|q| q.to_string()).collect())
    }

    /// Parses a JSON array; non-string entries are kept as their JSON text
    pub fn from_json(text: &str) -> Result<Self, QuoteError> {
        let entries: Vec<Value> = serde_json::from_str(text)?;
        let quotes = entries
            .into_iter()
            .map(|entry| match entry {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        Ok(Self::new(quotes))
    }

    pub async fn from_file(path: &Path) -> Result<Self, QuoteError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    /// Loads `path`, or logs why it could not and falls back to the built-in quotes
    pub async fn load_or_fallback(path: &Path) -> Self {
        match Self::from_file(path).await {
            Ok(bank) => {
                info!("Loaded {} quotes from {}", bank.len(), path.display());
                bank
            }
            Err(e) => {
                warn!("Could not load quotes from {}: {}", path.display(), e);
                warn!("Falling back to {} built-in quotes", FALLBACK_QUOTES.len());
                Self::fallback()
            }
        }
    }

    /// Uniformly random quote, `None` when the bank is empty
    pub fn random_pick(&self) -> Option<&str> {
        self.quotes
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    pub fn contains(&self, quote: &str) -> bool {
        self.quotes.iter().any(|q| q == quote)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}
