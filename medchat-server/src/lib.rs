//! # medchat-server — HTTP Services for MEDCHAT
//!
//! One binary, four service families. Each family is its own process with
//! its own router, port and upstream-failure policy:
//!
//! ```text
//! advisor  :5001  POST /chat            persona table (medication/condition/camera)   propagate
//! health   :5002  POST /chat            blood-pressure report → model analysis        propagate
//! dosage   :5003  POST /chat            persona table (usage/frequency)               propagate
//! clinic   :5004  POST /condition_chat, /medicine_chat, /psychology_chat              fallback
//!                 POST /audio_transcribe, /register, /login
//!                 GET /account, PUT|POST /account/{field}
//! ```
//!
//! Every family also answers `GET /health`.
//!
//! Handlers are thin: parse the body, compose a prompt with `medchat-llm`,
//! call the shared [`medchat_llm::ChatModel`], sanitize, reply. The model and
//! transcriber sit behind traits in [`AppState`] so tests drive the routers
//! with canned implementations.

pub mod error;
pub mod news;
pub mod routes;
pub mod server;
pub mod service;
pub mod state;

pub use error::{ApiError, Result};
pub use server::{build_router, serve};
pub use service::{ServiceKind, ServiceSettings};
pub use state::AppState;
