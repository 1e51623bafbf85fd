//! # medchat-llm — Prompt-to-Reply Pipeline for MEDCHAT
//!
//! The three pure-ish contracts every chat endpoint is built from:
//!
//! ```text
//! category + user text ──► Prompt Composer ──► Model Client ──► Response Sanitizer ──► reply
//!                          (prompt.rs)          (client.rs)       (sanitize.rs)
//! ```
//!
//! - **Composer** — persona tables keyed by category; unknown categories add
//!   nothing. Fixed `{message}` templates for the single-persona endpoints.
//! - **Client** — one `user` message to an OpenAI-compatible
//!   `/chat/completions` endpoint with a bearer credential and an explicit
//!   timeout. Behind the [`ChatModel`] trait so handlers can be tested
//!   without a network.
//! - **Sanitizer** — strips `#` and `*` markup and surrounding whitespace.
//!
//! Audio transcription lives here too ([`transcribe`]) since it talks to the
//! same upstream with the same credential.

pub mod client;
pub mod error;
pub mod prompt;
pub mod sanitize;
pub mod transcribe;
pub mod types;

pub use client::{ChatModel, LlmClient, LlmProvider};
pub use error::LlmError;
pub use prompt::{compose, FixedPersona, PersonaTable};
pub use sanitize::sanitize;
pub use transcribe::{AudioInput, OpenAiTranscriber, Transcriber};
pub use types::{LlmRequest, LlmResponse};
