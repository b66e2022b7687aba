//! Prompt template for the guidance step.
//!
//! The prompt is a Rust string literal (not an external file) for
//! compile-time inclusion. Instructions, clue, history context, and the
//! current guess record are all sent as one `user` message.

use crate::search::history::{BestGuesses, GuessRecord, RecentGuesses};

/// Fixed task instructions for the guidance model.
///
/// The two-word limit and the no-repeat rule are enforced by instruction
/// only; the loop takes whatever text comes back.
pub const GUIDANCE_TASK: &str = "\
User input is the last iterative guess of an unknown text string and its vector ERROR from the unknown text.
Determine a better text string having a lower vector ERROR and write only that string in English as your entire output.
The goal is to accurately guess the mystery text. This is a game of guess-and-check.

RESPONSE CRITERIA:
- Respond with the complete guess and nothing else. 2 words max.
- Do not repeat any entry of BEST_GUESSES or RECENT_PRIOR_GUESSES below.";

/// Compose the single user message for one guidance call.
///
/// `clue` is the known first word of the mystery text; `current` is the
/// guess record just evaluated.
pub fn guidance_message(
    clue: &str,
    best: &BestGuesses,
    recent: &RecentGuesses,
    current: &GuessRecord,
) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str(GUIDANCE_TASK);
    out.push_str("\n\nCLUE: two words; the first word is `");
    out.push_str(clue);
    out.push_str("`; the second word you have to guess.\n");

    out.push_str("\nBEST_GUESSES:\n");
    for record in best.iter() {
        out.push_str(&record.to_string());
        out.push('\n');
    }

    out.push_str("\nRECENT_PRIOR_GUESSES:\n");
    for record in recent.iter() {
        out.push_str(&record.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&current.to_string());

    out
}
