//! External providers for Vyral jobs.
//!
//! Each operation is served by an ordered list of candidates implementing
//! [`Provider`] (single request/response) or [`AsyncProvider`] (submit, then
//! poll). This crate holds the HTTP clients behind those candidates, the
//! prompts sent to chat models and the shaping of raw provider output into
//! result payloads.

pub mod assemblyai;
pub mod candidate;
pub mod chat;
pub mod config;
pub mod error;
mod http;
pub mod openrouter;
pub mod prompts;
pub mod shaping;
pub mod shotstack;

pub use assemblyai::AssemblyAiTranscriber;
pub use candidate::{AsyncProvider, Candidate, Provider};
pub use chat::ChatCandidate;
pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use openrouter::{ChatMessage, ChatOptions, OpenRouterClient};
pub use shotstack::ShotstackRenderer;
