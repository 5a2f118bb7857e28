//! Core domain types shared by discovery, scraping, and synthesis.

use serde::{Deserialize, Serialize};

use crate::config::clamp_per_type;

// ---------------------------------------------------------------------------
// SourceCategory
// ---------------------------------------------------------------------------

/// The kind of site a source comes from. Drives query templates,
/// classification rules, and extraction-goal wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCategory {
    Documentation,
    CodeHost,
    #[serde(rename = "qa")]
    QAndA,
    Blog,
}

impl SourceCategory {
    /// All categories, in discovery order.
    pub const ALL: [SourceCategory; 4] = [
        Self::Documentation,
        Self::CodeHost,
        Self::QAndA,
        Self::Blog,
    ];

    /// Stable slug used in source ids and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Documentation => "documentation",
            Self::CodeHost => "code-host",
            Self::QAndA => "qa",
            Self::Blog => "blog",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Documentation => "Documentation",
            Self::CodeHost => "GitHub",
            Self::QAndA => "Stack Overflow",
            Self::Blog => "Blog",
        }
    }
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DiscoveredSource
// ---------------------------------------------------------------------------

/// A candidate web source found during discovery. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredSource {
    /// Run-unique identifier (`<category>-<url hash>-<index>`).
    pub id: String,
    /// Category the source was discovered for.
    pub category: SourceCategory,
    /// Display title.
    pub title: String,
    /// Normalized URL (no fragment, no trailing slash).
    pub url: String,
    /// Why this source was picked (usually the search snippet).
    pub reason: String,
    /// The search query that produced it.
    pub query: String,
}

// ---------------------------------------------------------------------------
// StructuredExtraction
// ---------------------------------------------------------------------------

/// A single API entry extracted from a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReference {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// A runnable or illustrative code example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticalExample {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A problem users run into, with its fix when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonIssue {
    pub issue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

/// A link worth following, with an optional note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ResourceLink {
    /// The link pointing back at a discovered source.
    pub fn for_source(source: &DiscoveredSource) -> Self {
        let note = source.reason.trim();
        Self {
            title: source.title.clone(),
            url: source.url.clone(),
            note: (!note.is_empty()).then(|| note.to_string()),
        }
    }
}

/// Fixed-schema knowledge record derived from one source's scraped content.
///
/// Always present, even for degraded input: worst case every list is empty
/// and `overview`/`raw_text` hold best-effort text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredExtraction {
    pub overview: String,
    pub core_concepts: Vec<String>,
    pub apis: Vec<ApiReference>,
    pub examples: Vec<PracticalExample>,
    pub common_issues: Vec<CommonIssue>,
    pub best_practices: Vec<String>,
    pub resources: Vec<ResourceLink>,
    pub raw_text: String,
}

// ---------------------------------------------------------------------------
// ScrapeOutcome
// ---------------------------------------------------------------------------

/// A source that was scraped and normalized successfully.
#[derive(Debug, Clone)]
pub struct ScrapeSuccess {
    pub source: DiscoveredSource,
    pub extracted: StructuredExtraction,
    pub word_count: usize,
}

/// A source whose scrape ended without usable content.
#[derive(Debug, Clone)]
pub struct ScrapeFailure {
    pub source: DiscoveredSource,
    pub error: String,
}

/// Terminal result of scraping one source. Exactly one per source.
#[derive(Debug, Clone)]
pub enum ScrapeOutcome {
    Success(ScrapeSuccess),
    Failure(ScrapeFailure),
}

impl ScrapeOutcome {
    /// The source this outcome belongs to.
    pub fn source(&self) -> &DiscoveredSource {
        match self {
            Self::Success(s) => &s.source,
            Self::Failure(f) => &f.source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Borrow the success payload, if any.
    pub fn as_success(&self) -> Option<&ScrapeSuccess> {
        match self {
            Self::Success(s) => Some(s),
            Self::Failure(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerateRequest
// ---------------------------------------------------------------------------

/// Inbound request for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_per_type: Option<i64>,
}

impl GenerateRequest {
    pub fn new(topic: impl Into<String>, max_per_type: Option<i64>) -> Self {
        Self {
            topic: topic.into(),
            max_per_type,
        }
    }

    /// The trimmed topic, or `None` when it is blank.
    pub fn topic(&self) -> Option<&str> {
        let topic = self.topic.trim();
        (!topic.is_empty()).then_some(topic)
    }

    /// The per-category quota, clamped to the accepted range.
    pub fn quota(&self) -> u32 {
        clamp_per_type(self.max_per_type)
    }
}

/// Count whitespace-separated tokens, discarding empties.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
