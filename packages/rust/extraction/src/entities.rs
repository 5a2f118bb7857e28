//! Per-field entity extractors.
//!
//! Each extractor accepts a list whose entries may be plain strings or
//! objects with aliased keys, and drops entries that yield no usable label.

use serde_json::Value;

use guidecraft_shared::{ApiReference, CommonIssue, PracticalExample, ResourceLink};

use crate::alias::{first_text, text_of};

// ---------------------------------------------------------------------------
// Key aliases, in priority order
// ---------------------------------------------------------------------------

const CONCEPT_LABEL_KEYS: &[&str] = &["name", "concept", "term", "title", "label"];
const CONCEPT_DETAIL_KEYS: &[&str] = &["description", "explanation", "definition", "detail"];

const PRACTICE_KEYS: &[&str] = &[
    "practice",
    "tip",
    "recommendation",
    "title",
    "name",
    "description",
];

const API_NAME_KEYS: &[&str] = &["name", "method", "api", "function", "endpoint"];
const API_DESCRIPTION_KEYS: &[&str] = &[
    "description",
    "explanation",
    "purpose",
    "detail",
    "summary",
];
const API_SIGNATURE_KEYS: &[&str] = &["signature", "syntax", "usage", "example"];

const EXAMPLE_TITLE_KEYS: &[&str] = &["title", "name", "heading", "task"];
const EXAMPLE_CODE_KEYS: &[&str] = &["code", "snippet", "example", "source", "command"];
const EXAMPLE_LANGUAGE_KEYS: &[&str] = &["language", "lang", "syntax"];
const EXAMPLE_EXPLANATION_KEYS: &[&str] = &["explanation", "description", "notes", "why"];

const ISSUE_KEYS: &[&str] = &["issue", "problem", "title", "error", "symptom", "question"];
const FIX_KEYS: &[&str] = &["fix", "solution", "resolution", "workaround", "answer"];

const RESOURCE_URL_KEYS: &[&str] = &["url", "href", "link"];
const RESOURCE_TITLE_KEYS: &[&str] = &["title", "name", "label", "text"];
const RESOURCE_NOTE_KEYS: &[&str] = &["note", "reason", "description", "why"];

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// A concept label: a string, or `name: description` from an object.
pub(crate) fn concept(entry: &Value) -> Option<String> {
    match entry {
        Value::Object(obj) => {
            let label = first_text(obj, CONCEPT_LABEL_KEYS)?;
            match first_text(obj, CONCEPT_DETAIL_KEYS) {
                Some(detail) => Some(format!("{label}: {detail}")),
                None => Some(label),
            }
        }
        other => text_of(other),
    }
}

pub(crate) fn practice(entry: &Value) -> Option<String> {
    match entry {
        Value::Object(obj) => first_text(obj, PRACTICE_KEYS),
        other => text_of(other),
    }
}

pub(crate) fn api(entry: &Value) -> Option<ApiReference> {
    match entry {
        Value::Object(obj) => Some(ApiReference {
            name: first_text(obj, API_NAME_KEYS)?,
            description: first_text(obj, API_DESCRIPTION_KEYS).unwrap_or_default(),
            signature: first_text(obj, API_SIGNATURE_KEYS),
        }),
        other => text_of(other).map(|name| ApiReference {
            name,
            description: String::new(),
            signature: None,
        }),
    }
}

/// An example needs at least code or a title.
pub(crate) fn example(entry: &Value) -> Option<PracticalExample> {
    match entry {
        Value::Object(obj) => {
            let title = first_text(obj, EXAMPLE_TITLE_KEYS);
            let code = first_text(obj, EXAMPLE_CODE_KEYS);
            if title.is_none() && code.is_none() {
                return None;
            }
            Some(PracticalExample {
                title: title.unwrap_or_else(|| "Example".to_string()),
                language: first_text(obj, EXAMPLE_LANGUAGE_KEYS).map(|l| l.to_lowercase()),
                code: code.unwrap_or_default(),
                explanation: first_text(obj, EXAMPLE_EXPLANATION_KEYS),
            })
        }
        other => text_of(other).map(|code| PracticalExample {
            title: "Example".to_string(),
            language: None,
            code,
            explanation: None,
        }),
    }
}

pub(crate) fn issue(entry: &Value) -> Option<CommonIssue> {
    match entry {
        Value::Object(obj) => Some(CommonIssue {
            issue: first_text(obj, ISSUE_KEYS)?,
            fix: first_text(obj, FIX_KEYS),
        }),
        other => text_of(other).map(|issue| CommonIssue { issue, fix: None }),
    }
}

/// A resource needs an absolute http(s) URL.
pub(crate) fn resource(entry: &Value) -> Option<ResourceLink> {
    match entry {
        Value::Object(obj) => {
            let url = first_text(obj, RESOURCE_URL_KEYS).filter(|u| is_http_url(u))?;
            Some(ResourceLink {
                title: first_text(obj, RESOURCE_TITLE_KEYS).unwrap_or_else(|| url.clone()),
                note: first_text(obj, RESOURCE_NOTE_KEYS),
                url,
            })
        }
        other => text_of(other)
            .filter(|u| is_http_url(u))
            .map(|url| ResourceLink {
                title: url.clone(),
                url,
                note: None,
            }),
    }
}

fn is_http_url(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    (lower.starts_with("https://") || lower.starts_with("http://"))
        && !s.contains(char::is_whitespace)
}
