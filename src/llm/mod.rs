//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the text-generation capability
//! the orchestrator depends on. Provider SDK details stay behind the
//! [`LLMClient`] trait so the workflow code can run against any backend, or a
//! scripted stub in tests.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection, builds boxed clients
//! - [`reply`] - Tolerant extraction of JSON from generated text
//!
//! # Example
//!
//! ```ignore
//! use docintel::llm::Provider;
//! use std::time::Duration;
//!
//! let client = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! }
//! .create_client(Duration::from_secs(120))?;
//!
//! let text = client.generate("What is 2+2?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Ollama chat client built on `ollama-rs`.
pub mod ollama;
/// OpenAI-compatible chat client built on `async-openai`.
pub mod openai;
/// Structured reply parser for JSON-bearing model output.
pub mod reply;

pub use client::{LLMClient, Provider};
pub use reply::{parse_reply, parse_structured, MalformedReply};
