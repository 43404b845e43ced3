//! Generation retry loop as a pure state machine
//!
//! A [`RetrySession`] holds everything the loop carries between attempts. The
//! shell calls the completion endpoint with [`RetrySession::prompt`], feeds the
//! outcome to [`RetrySession::step`] and acts on the returned [`Step`]:
//!
//! - [`Step::Persist`]: every required file is present, write them out.
//! - [`Step::Retry`]: call the endpoint again with the next session.
//! - [`Step::Fail`]: stop and report the error.
//!
//! Completion failures and incomplete answers share one attempt budget. A
//! response without any fenced block fails immediately, whatever budget is
//! left.

use crate::blocks::{parse_fenced_blocks, GeneratedFileSet};
use crate::completion::CompletionError;
use crate::manifest::{missing_files, RequiredFileManifest};
use crate::prompt::augment_prompt;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Why a generation request failed for good.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("No code files found in the response")]
    NoCodeBlocks,

    #[error("Generation failed after {attempts} attempts. Missing files: {}", .missing.join(", "))]
    Exhausted {
        attempts: usize,
        missing: Vec<String>,
        last_failure: Option<String>,
    },
}

/// Result of a single completion call, as seen by the retry loop.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Completed(String),
    Failed(CompletionError),
}

/// What the shell should do next.
#[derive(Debug)]
pub enum Step {
    Persist(GeneratedFileSet),
    Retry(RetrySession),
    Fail(GenerationError),
}

/// State threaded through the generation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySession {
    prompt: String,
    attempt: usize,
    max_retries: usize,
    missing: Vec<String>,
    last_failure: Option<String>,
}

impl RetrySession {
    pub fn new(prompt: impl Into<String>, max_retries: usize) -> Self {
        Self {
            prompt: prompt.into(),
            attempt: 0,
            max_retries,
            missing: Vec::new(),
            last_failure: None,
        }
    }

    /// User prompt to send on the current attempt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Zero-based index of the current attempt.
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    /// Upper bound on completion calls: the first attempt plus every retry.
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Missing files reported by the most recent complete-but-short answer.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    fn has_retries_left(&self) -> bool {
        self.attempt < self.max_retries
    }

    fn exhausted(self) -> Step {
        Step::Fail(GenerationError::Exhausted {
            attempts: self.max_attempts(),
            missing: self.missing,
            last_failure: self.last_failure,
        })
    }

    /// Advance the session with the outcome of the current attempt.
    pub fn step(self, outcome: AttemptOutcome, manifest: &RequiredFileManifest) -> Step {
        let text = match outcome {
            AttemptOutcome::Completed(text) => text,
            AttemptOutcome::Failed(err) => {
                let session = RetrySession {
                    last_failure: Some(err.to_string()),
                    ..self
                };
                if !session.has_retries_left() {
                    return session.exhausted();
                }
                return Step::Retry(RetrySession {
                    attempt: session.attempt + 1,
                    ..session
                });
            }
        };

        let files = parse_fenced_blocks(&text);
        if files.is_empty() {
            return Step::Fail(GenerationError::NoCodeBlocks);
        }

        let missing = missing_files(&files, manifest);
        if missing.is_empty() {
            return Step::Persist(files);
        }

        let session = RetrySession {
            last_failure: None,
            missing,
            ..self
        };
        if !session.has_retries_left() {
            return session.exhausted();
        }

        Step::Retry(RetrySession {
            prompt: augment_prompt(&session.prompt, &session.missing),
            attempt: session.attempt + 1,
            ..session
        })
    }
}
