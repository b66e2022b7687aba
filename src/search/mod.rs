//! The search loop: budget check → evaluate → track best → match check →
//! guidance step, repeated until a stop condition fires.
//!
//! Target acquisition happens once, up front, and its failure is fatal (the
//! loop never starts). Both in-loop external calls run under the fixed-delay
//! retry-forever policy from [`crate::retry`].

pub mod history;

use std::fmt;

use tracing::info;

use crate::embedder::EmbedderClient;
use crate::errors::{LlmError, Result, SearchError};
use crate::llm_client::{LlmClient, Message, Role};
use crate::prompts;
use crate::retry::RetryPolicy;
use crate::types::SearchConfig;
use crate::utils::similarity::euclidean_distance;

use history::{BestGuesses, GuessRecord, RecentGuesses};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A guess came within the match-error threshold of the target.
    Matched,
    /// Cumulative cost reached the limit before a match.
    BudgetExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Matched => write!(f, "matched"),
            StopReason::BudgetExhausted => write!(f, "budget exhausted"),
        }
    }
}

/// Final state handed back when the loop stops.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub reason: StopReason,
    pub best_text: String,
    pub best_distance: f32,
    pub guesses_made: u64,
    pub total_cost: f64,
    pub best_guesses: Vec<GuessRecord>,
}

/// The reverse embedding search loop.
pub struct SearchLoop<E, L> {
    embedder: E,
    llm: L,
    config: SearchConfig,
}

impl<E: EmbedderClient, L: LlmClient> SearchLoop<E, L> {
    pub fn new(embedder: E, llm: L, config: SearchConfig) -> Self {
        Self {
            embedder,
            llm,
            config,
        }
    }

    /// Run to completion.
    ///
    /// Per iteration: check the cost budget (stopping before any work),
    /// embed the current guess and compute its distance to the target,
    /// update the best-guess bookkeeping, stop on a match, otherwise ask the
    /// guidance model for the next guess and slide the history window.
    pub async fn run(self) -> Result<SearchReport> {
        // Target acquisition: a one-shot single-element batch. No retry;
        // if the backend is down before the run even starts, fail fast.
        let target = self
            .embedder
            .embed_batch(&[self.config.target_text.as_str()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                SearchError::Embedder("no vector returned for the target text".to_string())
            })?;

        let embed_retry = RetryPolicy::fixed(self.config.embed_retry_delay)
            .with_attempt_limit(self.config.retry_attempt_limit);
        let chat_retry = RetryPolicy::fixed(self.config.chat_retry_delay)
            .with_attempt_limit(self.config.retry_attempt_limit);

        let clue = self.config.initial_guess.clone();
        let mut guess = self.config.initial_guess.clone();
        let mut best_text = guess.clone();
        let mut best_distance = f32::INFINITY;
        let mut best_guesses = BestGuesses::new(self.config.best_set_size);
        let mut recent = RecentGuesses::new(self.config.history_window);
        let mut guesses_made: u64 = 0;
        let mut total_cost: f64 = 0.0;

        let reason = loop {
            if total_cost >= self.config.cost_limit {
                break StopReason::BudgetExhausted;
            }

            guesses_made += 1;
            info!(iteration = guesses_made, guess = %guess, "evaluating guess");

            let vector = embed_retry
                .run("embedding", || self.embedder.embed(&guess))
                .await?;
            total_cost += self.config.embed_call_cost;

            let distance = euclidean_distance(&vector, &target);
            let record = GuessRecord::new(distance, guess.clone());

            if distance < best_distance {
                best_text = guess.clone();
                best_distance = distance;
                info!(text = %best_text, error = f64::from(best_distance), "new best guess");
                best_guesses.insert(record.clone());
            }

            if distance <= self.config.match_error {
                break StopReason::Matched;
            }

            let composed = prompts::guidance_message(&clue, &best_guesses, &recent, &record);
            info!(iteration = guesses_made, "guidance request:\n{composed}");

            let messages = [Message {
                role: Role::User,
                content: composed,
            }];
            let reply = chat_retry
                .run("guidance", || {
                    let fut = self.llm.generate(&messages);
                    async move {
                        let reply = fut.await?;
                        // A blank reply is an anomaly, not a guess: treat it
                        // like any other transient failure.
                        if reply.trim().is_empty() {
                            return Err(SearchError::Llm(LlmError::EmptyResponse));
                        }
                        Ok(reply)
                    }
                })
                .await?;
            total_cost += self.config.chat_call_cost;

            info!(iteration = guesses_made, next = %reply, prior = %record, "guess revised");
            recent.push(record);
            guess = reply;
        };

        info!(
            reason = %reason,
            guesses = guesses_made,
            cost = total_cost,
            best = %best_guesses,
            "search stopped"
        );

        Ok(SearchReport {
            reason,
            best_text,
            best_distance,
            guesses_made,
            total_cost,
            best_guesses: best_guesses.to_vec(),
        })
    }
}
