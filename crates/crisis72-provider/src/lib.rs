//! Scenario content for Crisis72 from an LLM, with an offline fallback.
//!
//! # Modules
//!
//! - [`config`] -- Backend selection and credentials from the environment.
//! - [`error`] -- [`ProviderError`] and its mapping onto content errors.
//! - [`schema`] -- Response schemas for steps, reports and advice.
//! - [`prompt`] -- `minijinja` prompt templates.
//! - [`llm`] -- Gemini, `OpenAI`-compatible and Anthropic HTTP backends.
//! - [`parse`] -- Tolerant JSON recovery and validation of responses.
//! - [`provider`] -- [`LlmContentProvider`], the live provider.
//! - [`backend`] -- [`ContentBackend`], live or offline.
//!
//! [`LlmContentProvider`]: provider::LlmContentProvider
//! [`ContentBackend`]: backend::ContentBackend
//! [`ProviderError`]: error::ProviderError

pub mod backend;
pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod schema;
