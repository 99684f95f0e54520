//! Content guardrails applied before scripts leave the pipeline.
//!
//! These are advisory checks with structured results; callers decide whether
//! a failed check warns or blocks.

/// Outcome of a word-count check.
#[derive(Debug, Clone, PartialEq)]
pub struct LengthCheck {
    pub ok: bool,
    pub reason: String,
    pub word_count: usize,
    pub script: String,
    pub trimmed: bool,
}

/// What to do when a script exceeds the word budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    /// Report the violation and keep the script unchanged.
    Fail,
    /// Cut the script down to the budget and report success.
    Trim,
}

/// Enforce a word budget on a script.
///
/// Words are whitespace-separated tokens, so numbers and emoji count.
pub fn enforce_length(script: &str, max_words: usize, mode: LengthMode) -> LengthCheck {
    let tokens: Vec<&str> = script.split_whitespace().collect();
    let count = tokens.len();
    if count <= max_words {
        return LengthCheck {
            ok: true,
            reason: "within_limit".to_string(),
            word_count: count,
            script: script.to_string(),
            trimmed: false,
        };
    }
    match mode {
        LengthMode::Fail => LengthCheck {
            ok: false,
            reason: format!("too_long: {count} words (max {max_words})"),
            word_count: count,
            script: script.to_string(),
            trimmed: false,
        },
        LengthMode::Trim => LengthCheck {
            ok: true,
            reason: format!("trimmed_to_{max_words}"),
            word_count: max_words,
            script: tokens[..max_words].join(" "),
            trimmed: true,
        },
    }
}

/// Outcome of a player-status check.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCheck {
    pub ok: bool,
    pub reason: String,
}

/// Flag players who should not be featured because they are out of play.
pub fn assert_not_out(status: Option<&str>) -> StatusCheck {
    let Some(status) = status else {
        return StatusCheck {
            ok: true,
            reason: "status unknown".to_string(),
        };
    };
    let normalized = status.trim().to_lowercase();
    if matches!(normalized.as_str(), "out" | "ir" | "injured reserve") {
        return StatusCheck {
            ok: false,
            reason: format!("Player status = {status}"),
        };
    }
    StatusCheck {
        ok: true,
        reason: format!("Player status = {status}"),
    }
}
