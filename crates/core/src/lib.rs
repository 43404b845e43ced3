//! Core library for promptforge
//!
//! This crate implements the **Functional Core** of promptforge, following the
//! Functional Core - Imperative Shell architectural pattern.
//!
//! - **`promptforge_core`** (this crate): pure transformations with no I/O
//! - **`promptforge`**: the HTTP server, the completion client, and the
//!   on-disk project store (the Imperative Shell)
//!
//! Everything that decides *what* happens during a generation request lives
//! here: how a model answer is split into files, which required files are
//! missing, how the prompt grows between attempts and when to give up. The
//! shell only performs the calls and writes the files.
//!
//! # Module Organization
//!
//! - [`blocks`]: fenced-block extraction from model responses
//! - [`manifest`]: required files, path normalization, completeness checks
//! - [`session`]: the retry loop as a pure state machine
//! - [`prompt`]: system prompts and the corrective retry instruction
//! - [`completion`]: chat-completion wire types and response parsing
//! - [`paths`]: routing logical paths to the `public` and `src` subtrees
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use promptforge_core::manifest::RequiredFileManifest;
//! use promptforge_core::session::{AttemptOutcome, RetrySession, Step};
//!
//! let manifest = RequiredFileManifest::default();
//! let session = RetrySession::new("A weather dashboard", 2);
//!
//! // No HTTP required: feed a canned model answer.
//! match session.step(AttemptOutcome::Completed(answer), &manifest) {
//!     Step::Persist(files) => { /* write files */ }
//!     Step::Retry(next) => { /* call the model with next.prompt() */ }
//!     Step::Fail(err) => { /* report err */ }
//! }
//! ```

pub mod blocks;
pub mod completion;
pub mod manifest;
pub mod paths;
pub mod prompt;
pub mod session;
