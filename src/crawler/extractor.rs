//! Embedded state extraction
//!
//! Recipe pages ship their whole client-side state as a percent-encoded JSON
//! string assigned to `window.__INITIAL_STATE__` in an inline script. This
//! module finds that script, decodes the blob and decides whether the page
//! carries a recipe at all.

use crate::state::AbsenceReason;
use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;

/// Marker of the script that carries the embedded state
const STATE_MARKER: &str = "window.__INITIAL_STATE__";

/// How many decoded characters to keep when reporting an undecodable payload
const SNIPPET_LEN: usize = 200;

/// Result of extracting a page that was fetched successfully
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// The decoded state tree, guaranteed to hold a `recipe` node
    Tree(Value),

    /// The page has no recipe to extract
    Absent(AbsenceReason),
}

/// Errors raised while extracting a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// The page is an access challenge instead of site content; fatal to the run
    #[error("access challenge page (title {title:?})")]
    AccessChallenge { title: String },

    /// The embedded state exists but cannot be decoded
    #[error("{0}")]
    Malformed(String),
}

lazy_static! {
    /// Captures the quoted, percent-encoded payload of the state assignment
    static ref STATE_PATTERN: Regex =
        Regex::new(r#"window\.__INITIAL_STATE__\s*=\s*"\s*(.+)""#).expect("Invalid state regex");
}

/// Extracts the page title (trimmed, `None` when missing or blank)
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    title_of(&document)
}

fn title_of(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Extracts the decoded state tree from a fetched page
///
/// # Arguments
///
/// * `html` - Body of a page that was fetched with a success status
/// * `site_marker` - Case-insensitive substring every genuine page title contains
///
/// # Returns
///
/// * `Ok(Extracted::Tree)` - The page's state, holding a recipe
/// * `Ok(Extracted::Absent)` - An error page, or a page without a recipe
/// * `Err(ExtractError::AccessChallenge)` - The session no longer gets past the challenge
/// * `Err(ExtractError::Malformed)` - The embedded state is there but undecodable
pub fn extract_state(html: &str, site_marker: &str) -> Result<Extracted, ExtractError> {
    let document = Html::parse_document(html);

    let title = title_of(&document)
        .ok_or_else(|| ExtractError::Malformed("page has no title".to_string()))?;
    let lowered = title.to_lowercase();
    if !lowered.contains(&site_marker.to_lowercase()) {
        return Err(ExtractError::AccessChallenge { title });
    }
    if lowered.contains("error") {
        return Ok(Extracted::Absent(AbsenceReason::ErrorPage));
    }

    let Some(script) = state_script(&document) else {
        return Ok(Extracted::Absent(AbsenceReason::NoEmbeddedState));
    };

    let encoded = STATE_PATTERN
        .captures(&script)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| {
            ExtractError::Malformed(format!("{} is not assigned a quoted string", STATE_MARKER))
        })?
        .as_str();

    let decoded = percent_decode_str(encoded)
        .decode_utf8()
        .map_err(|e| ExtractError::Malformed(format!("embedded state is not UTF-8: {}", e)))?;

    let state: Value = serde_json::from_str(&decoded).map_err(|e| {
        ExtractError::Malformed(format!(
            "embedded state is not JSON ({}); starts with: {}",
            e,
            snippet(&decoded)
        ))
    })?;

    if !state.is_object() {
        return Err(ExtractError::Malformed(
            "embedded state is not a JSON object".to_string(),
        ));
    }

    let recipe = match state.get("recipe") {
        None | Some(Value::Null) => return Ok(Extracted::Absent(AbsenceReason::NoRecipe)),
        Some(recipe) => recipe,
    };

    let not_found = recipe
        .get("message")
        .and_then(Value::as_str)
        .is_some_and(|message| message.starts_with("recipe not found"));
    if not_found {
        return Ok(Extracted::Absent(AbsenceReason::RecipeNotFound));
    }

    Ok(Extracted::Tree(state))
}

/// Text of the first script whose content contains the state marker
fn state_script(document: &Html) -> Option<String> {
    let selector = Selector::parse("script").ok()?;
    document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .map(|text| text.trim().to_string())
        .find(|text| text.contains(STATE_MARKER))
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LEN).collect()
}
