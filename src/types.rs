//! Shared configuration types.

use std::path::PathBuf;
use std::time::Duration;

use validator::Validate;

use crate::errors::{Result, SearchError};

fn validate_match_error(v: f32) -> std::result::Result<(), validator::ValidationError> {
    if !(v > 0.0) {
        return Err(validator::ValidationError::new("match_error must be > 0"));
    }
    Ok(())
}

fn validate_nonzero(v: usize) -> std::result::Result<(), validator::ValidationError> {
    if v == 0 {
        return Err(validator::ValidationError::new("must be > 0"));
    }
    Ok(())
}

/// Tunable knobs of the search loop itself.
///
/// Passed to [`crate::search::SearchLoop::new`] at construction; nothing here
/// is read from globals.
#[derive(Debug, Clone, Validate)]
pub struct SearchConfig {
    /// The hidden text whose embedding the loop tries to approach.
    #[validate(length(min = 1))]
    pub target_text: String,

    /// Seed guess for the first iteration.
    #[validate(length(min = 1))]
    pub initial_guess: String,

    /// Stop once a guess's distance falls to this value or below.
    ///
    /// Embedding space is modeled as unit-variance Gaussian noise, so the
    /// distance between two embeddings of the *same* point maps to a
    /// two-point-identity confidence:
    ///
    /// | distance | same-point confidence |
    /// |----------|----------------------|
    /// | 3.0      | 0.3%                 |
    /// | 1.0      | 31.7%                |
    /// | 0.6      | 55.0%                |
    /// | 0.333    | 73.9%                |
    /// | 0.1      | 92%                  |
    ///
    /// The default of 0.6 stops at 55% confidence or better.
    #[validate(custom(function = "validate_match_error"))]
    pub match_error: f32,

    /// Stop before an iteration once cumulative cost reaches this value.
    pub cost_limit: f64,

    /// Fixed delay between embedding retries.
    pub embed_retry_delay: Duration,

    /// Fixed delay between guidance retries.
    pub chat_retry_delay: Duration,

    /// Cap on the recent-guesses window fed back to the guidance model.
    #[validate(custom(function = "validate_nonzero"))]
    pub history_window: usize,

    /// Cap on the best-guesses set.
    #[validate(custom(function = "validate_nonzero"))]
    pub best_set_size: usize,

    /// Cost charged per candidate evaluation.
    pub embed_call_cost: f64,

    /// Cost charged per guidance step.
    pub chat_call_cost: f64,

    /// Cap on total tries per external call. `None` retries forever.
    pub retry_attempt_limit: Option<u32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target_text: String::new(),
            initial_guess: String::new(),
            match_error: 0.6,
            cost_limit: 60.0,
            embed_retry_delay: Duration::from_secs(7),
            chat_retry_delay: Duration::from_secs(5),
            history_window: 8,
            best_set_size: 3,
            embed_call_cost: 0.0,
            chat_call_cost: 0.0,
            retry_attempt_limit: None,
        }
    }
}

/// Full process configuration loaded from environment variables.
#[derive(Debug, Clone, Validate)]
pub struct RunConfig {
    /// API key for the OpenAI-compatible backend.
    #[validate(length(min = 1))]
    pub api_key: String,

    /// Optional API base URL override (e.g. a local Ollama's
    /// OpenAI-compatible endpoint, `http://127.0.0.1:11434/v1`).
    pub api_base: Option<String>,

    /// Chat model used for the guidance step.
    pub chat_model: String,

    /// Embedding model; both vectors in a run must come from the same model.
    pub embedding_model: String,

    /// Append-only log file written alongside stdout output.
    pub log_path: PathBuf,

    pub search: SearchConfig,
}

impl RunConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` first (non-fatal if `.env` is absent),
    /// then reads each variable from the process environment. Required
    /// variables (`OPENAI_API_KEY`, `TARGET_TEXT`) return a
    /// [`SearchError::Validation`] when absent or empty. `INITIAL_GUESS`
    /// defaults to the first word of the target text.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            SearchError::Validation("OPENAI_API_KEY is required".to_string())
        })?;

        let api_base = std::env::var("OPENAI_API_BASE").ok();

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let embedding_model = std::env::var("EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());

        let log_path = std::env::var("LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("reverse_vector.log"));

        let target_text = std::env::var("TARGET_TEXT").map_err(|_| {
            SearchError::Validation("TARGET_TEXT is required".to_string())
        })?;

        let initial_guess = match std::env::var("INITIAL_GUESS") {
            Ok(val) => val,
            Err(_) => target_text
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        let search = SearchConfig {
            target_text,
            initial_guess,
            match_error: parse_env_f32("MATCH_ERROR", 0.6)?,
            cost_limit: parse_env_f64("COST_LIMIT", 60.0)?,
            embed_retry_delay: Duration::from_secs(parse_env_u64(
                "EMBED_RETRY_DELAY_SECS",
                7,
            )?),
            chat_retry_delay: Duration::from_secs(parse_env_u64(
                "CHAT_RETRY_DELAY_SECS",
                5,
            )?),
            history_window: parse_env_usize("HISTORY_WINDOW", 8)?,
            best_set_size: parse_env_usize("BEST_SET_SIZE", 3)?,
            embed_call_cost: parse_env_f64("EMBED_CALL_COST", 0.0)?,
            chat_call_cost: parse_env_f64("CHAT_CALL_COST", 0.0)?,
            retry_attempt_limit: match std::env::var("RETRY_ATTEMPT_LIMIT") {
                Ok(val) => Some(val.parse::<u32>().map_err(|e| {
                    SearchError::Validation(format!("Invalid RETRY_ATTEMPT_LIMIT: {e}"))
                })?),
                Err(_) => None,
            },
        };

        let config = Self {
            api_key,
            api_base,
            chat_model,
            embedding_model,
            log_path,
            search,
        };

        config
            .validate()
            .map_err(|e| SearchError::Validation(e.to_string()))?;
        config
            .search
            .validate()
            .map_err(|e| SearchError::Validation(e.to_string()))?;

        Ok(config)
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize> {
    match std::env::var(name) {
        Ok(val) => val
            .parse::<usize>()
            .map_err(|e| SearchError::Validation(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(val) => val
            .parse::<u64>()
            .map_err(|e| SearchError::Validation(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_f32(name: &str, default: f32) -> Result<f32> {
    match std::env::var(name) {
        Ok(val) => val
            .parse::<f32>()
            .map_err(|e| SearchError::Validation(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn parse_env_f64(name: &str, default: f64) -> Result<f64> {
    match std::env::var(name) {
        Ok(val) => val
            .parse::<f64>()
            .map_err(|e| SearchError::Validation(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
