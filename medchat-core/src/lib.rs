//! # MEDCHAT Core Library
//!
//! Everything the chat services share that is not an LLM call:
//!
//! - **Configuration** — one [`MedchatConfig`] read at process start and
//!   passed explicitly to every component (no credentials in source).
//! - **Errors** — the [`MedchatError`] taxonomy (validation, auth, storage).
//! - **Health evaluation** — blood-pressure classification and the plain-text
//!   report that is handed to the model for analysis.
//! - **Accounts** — an SQLite-backed [`AccountStore`] with argon2 password
//!   hashes and free-form JSON health fields.
//! - **Tokens** — HS256 bearer tokens issued on login and checked by the
//!   account routes.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod persistence;
pub mod types;

pub use auth::{Claims, TokenSigner};
pub use config::MedchatConfig;
pub use error::MedchatError;
pub use health::{BloodPressureStatus, HealthReading, HealthReport};
pub use persistence::{Account, AccountStore};
pub use types::*;
