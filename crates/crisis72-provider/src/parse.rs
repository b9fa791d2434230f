//! LLM response parsing into typed content.
//!
//! The LLM returns raw text (ideally JSON matching the request schema).
//! This module extracts and validates it into the types from
//! `crisis72-types`. Unlike a best-effort agent decision, scenario content
//! has no safe default, so anything unrecoverable is a [`ProviderError::Parse`].

use crisis72_core::content::{ContentError, validate_step};
use crisis72_types::{AdvisorAdvice, SimulationResult, SimulationStep};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Parse a generated scenario step and check its structure.
///
/// `expected_step` is the number the session is waiting for; a mismatch is
/// corrected rather than rejected.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] if the text is not a valid step.
pub fn parse_step(raw: &str, expected_step: u32) -> Result<SimulationStep, ProviderError> {
    let mut step: SimulationStep = parse_response(raw)?;
    if step.step != expected_step {
        debug!(
            generated = step.step,
            expected = expected_step,
            "renumbering generated step"
        );
        step.step = expected_step;
    }
    validate_step(&step).map_err(|e| match e {
        ContentError::Malformed { reason } => ProviderError::Parse(reason),
        other => ProviderError::Parse(other.to_string()),
    })?;
    Ok(step)
}

/// Parse a generated audit report.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] if the text is not a valid report.
pub fn parse_report(raw: &str) -> Result<SimulationResult, ProviderError> {
    parse_response(raw)
}

/// Parse advisor output into plain advice text.
///
/// An empty body yields an empty string; the caller substitutes the fixed
/// "no connection" message.
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] if non-empty text is not valid advice.
pub fn parse_advice(raw: &str) -> Result<String, ProviderError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }
    let advice: AdvisorAdvice = parse_response(raw)?;
    Ok(advice.advice.trim().to_owned())
}

/// Deserialize a response through multiple recovery strategies.
///
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from markdown code blocks
/// 3. Strip trailing commas and retry
/// 4. Code block, then strip trailing commas
///
/// # Errors
///
/// Returns [`ProviderError::Parse`] if every strategy fails.
pub fn parse_response<T: DeserializeOwned>(raw: &str) -> Result<T, ProviderError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Parse("empty response".to_owned()));
    }

    let first_error = match serde_json::from_str::<T>(trimmed) {
        Ok(parsed) => return Ok(parsed),
        Err(e) => e,
    };

    if let Some(json_str) = extract_json_from_codeblock(trimmed)
        && let Ok(parsed) = serde_json::from_str::<T>(json_str)
    {
        return Ok(parsed);
    }

    let cleaned = strip_trailing_commas(trimmed);
    if let Ok(parsed) = serde_json::from_str::<T>(&cleaned) {
        return Ok(parsed);
    }

    if let Some(json_str) = extract_json_from_codeblock(trimmed) {
        let cleaned_inner = strip_trailing_commas(json_str);
        if let Ok(parsed) = serde_json::from_str::<T>(&cleaned_inner) {
            return Ok(parsed);
        }
    }

    warn!(error = %first_error, raw_response = trimmed, "failed to parse LLM response");
    Err(ProviderError::Parse(format!(
        "all parse strategies failed: {first_error}"
    )))
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let body_start = |fence: usize, tag_len: usize| {
        let after_tag = fence.checked_add(tag_len).unwrap_or(fence);
        text.get(after_tag..)
            .and_then(|s| s.find('\n'))
            .and_then(|nl| after_tag.checked_add(nl))
            .and_then(|pos| pos.checked_add(1))
            .unwrap_or(after_tag)
    };

    let start = text
        .find("```json")
        .map(|i| body_start(i, 7))
        .or_else(|| text.find("```").map(|i| body_start(i, 3)))?;
    let remaining = text.get(start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets.
///
/// Commas inside string literals are left alone so narrative text such as
/// `"Evacuar, ]"` survives.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    let mut i = 0;
    while i < len {
        let c = chars.get(i).copied().unwrap_or(' ');
        i = i.checked_add(1).unwrap_or(len);

        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars
                .get(i..)
                .and_then(|rest| rest.iter().copied().find(|ch| !ch.is_whitespace()));
            if matches!(next, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }

    result
}
