//! Turn rules, decision timer and session orchestration for Crisis72.
//!
//! # Modules
//!
//! - [`rules`] -- Turn reducer, end-condition evaluation, timeout penalty.
//! - [`timer`] -- Per-step decision countdown state machine.
//! - [`config`] -- Configuration loading from `crisis72-config.yaml`.
//! - [`content`] -- [`ContentProvider`] trait and step validation.
//! - [`stub`] -- [`StubContentProvider`] for offline play.
//! - [`report`] -- Final report retries and the fallback report.
//! - [`session`] -- [`GameSession`] and its timer driver.
//!
//! [`ContentProvider`]: content::ContentProvider
//! [`StubContentProvider`]: stub::StubContentProvider
//! [`GameSession`]: session::GameSession

pub mod config;
pub mod content;
pub mod report;
pub mod rules;
pub mod session;
pub mod stub;
pub mod timer;
