//! LexiconOracle: keyword-list bias detection
//!
//! Local fallback detector used when the remote service is unreachable, and
//! a deterministic oracle for tests. Each category compiles to one
//! case-insensitive, word-bounded alternation; longer words are tried first
//! so "businessman" wins over a shorter overlapping entry.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::highlight::buffer::byte_to_unit_offsets;
use crate::highlight::error::{ConfigError, OracleError};
use crate::highlight::oracle::{AnalysisRequest, Oracle, RawAnalysis};
use crate::highlight::span::RawSpan;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub word: String,
    #[serde(default = "default_severity")]
    pub severity: u8,
    #[serde(default)]
    pub suggestion: Option<String>,
}

fn default_severity() -> u8 {
    1
}

impl LexiconEntry {
    pub fn new(word: impl Into<String>, severity: u8, suggestion: Option<&str>) -> Self {
        Self {
            word: word.into(),
            severity,
            suggestion: suggestion.map(str::to_string),
        }
    }
}

/// Category → flagged words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconConfig {
    pub categories: BTreeMap<String, Vec<LexiconEntry>>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        let table: &[(&str, &[(&str, u8, &str)])] = &[
            (
                "political",
                &[
                    ("radical", 2, "person with strong views"),
                    ("extremist", 4, "person with extreme views"),
                    ("leftist", 2, "person with progressive views"),
                    ("rightist", 2, "person with conservative views"),
                    ("communist", 1, "person with communist views"),
                    ("socialist", 1, "person with socialist views"),
                    ("fascist", 4, "person with authoritarian views"),
                ],
            ),
            (
                "gender",
                &[
                    ("mankind", 1, "humanity"),
                    ("chairman", 1, "chairperson"),
                    ("policeman", 1, "police officer"),
                    ("stewardess", 1, "flight attendant"),
                    ("housewife", 1, "homemaker"),
                    ("mailman", 1, "mail carrier"),
                    ("businessman", 1, "businessperson"),
                ],
            ),
            (
                "racial",
                &[
                    ("colored", 1, "person of color"),
                    ("oriental", 1, "Asian"),
                    ("ethnic", 1, "from diverse backgrounds"),
                    ("urban", 1, "city-dwelling"),
                    ("ghetto", 1, "low-income neighborhood"),
                    ("exotic", 1, "unique"),
                    ("tribal", 1, "indigenous"),
                ],
            ),
            (
                "cultural",
                &[
                    ("primitive", 4, "traditional"),
                    ("uncivilized", 4, "different cultural practices"),
                    ("backward", 2, "developing"),
                    ("third-world", 1, "developing nation"),
                    ("developing", 1, "emerging economy"),
                    ("underdeveloped", 1, "developing region"),
                ],
            ),
        ];

        let categories = table
            .iter()
            .map(|(category, words)| {
                let entries = words
                    .iter()
                    .map(|(word, severity, suggestion)| LexiconEntry::new(*word, *severity, Some(*suggestion)))
                    .collect();
                (category.to_string(), entries)
            })
            .collect();

        Self { categories }
    }
}

impl LexiconConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

// =============================================================================
// LexiconOracle
// =============================================================================

struct CategoryMatcher {
    category: String,
    pattern: Regex,
    /// lowercase word → entry
    entries: HashMap<String, LexiconEntry>,
}

pub struct LexiconOracle {
    matchers: Vec<CategoryMatcher>,
}

impl LexiconOracle {
    pub fn new(config: &LexiconConfig) -> Result<Self, ConfigError> {
        let mut matchers = Vec::with_capacity(config.categories.len());
        for (category, entries) in &config.categories {
            if let Some(matcher) = build_matcher(category, entries)? {
                matchers.push(matcher);
            }
        }
        Ok(Self { matchers })
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::new(&LexiconConfig::from_json(json)?)
    }

    pub fn pattern_count(&self) -> usize {
        self.matchers.iter().map(|m| m.entries.len()).sum()
    }

    /// Replace (or add) the word list of one category.
    pub fn set_category(&mut self, category: &str, entries: &[LexiconEntry]) -> Result<(), ConfigError> {
        let name = category.to_lowercase();
        self.matchers.retain(|m| m.category != name);
        if let Some(matcher) = build_matcher(category, entries)? {
            self.matchers.push(matcher);
            self.matchers.sort_by(|a, b| a.category.cmp(&b.category));
        }
        Ok(())
    }

    /// Detect flagged words in `text`; offsets are UTF-16 units.
    pub fn detect(&self, text: &str, version: u64) -> RawAnalysis {
        let mut hits: Vec<(usize, usize, &CategoryMatcher, &LexiconEntry)> = Vec::new();
        for matcher in &self.matchers {
            for m in matcher.pattern.find_iter(text) {
                let word = m.as_str().to_lowercase();
                if let Some(entry) = matcher.entries.get(&word) {
                    hits.push((m.start(), m.end(), matcher, entry));
                }
            }
        }
        hits.sort_by(|a, b| (a.0, a.1, &a.2.category).cmp(&(b.0, b.1, &b.2.category)));

        let offsets: Vec<usize> = hits.iter().flat_map(|&(s, e, _, _)| [s, e]).collect();
        let units = byte_to_unit_offsets(text, &offsets);

        let spans = hits
            .iter()
            .enumerate()
            .map(|(i, &(_, _, matcher, entry))| {
                let suggestion = entry.suggestion.clone().unwrap_or_else(|| {
                    format!("Consider using more neutral language instead of \"{}\"", entry.word)
                });
                RawSpan::new(
                    units[2 * i] as i64,
                    units[2 * i + 1] as i64,
                    matcher.category.clone(),
                    entry.severity as i64,
                )
                .with_explanation(format!(
                    "The word \"{}\" may carry {} bias and could be perceived as non-neutral.",
                    entry.word, matcher.category
                ))
                .with_suggestion(suggestion)
            })
            .collect();

        RawAnalysis::new(version, spans)
    }
}

impl Default for LexiconOracle {
    fn default() -> Self {
        let config = LexiconConfig::default();
        let matchers = config
            .categories
            .iter()
            .filter_map(|(category, entries)| build_matcher(category, entries).ok().flatten())
            .collect();
        Self { matchers }
    }
}

impl Oracle for LexiconOracle {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<RawAnalysis, OracleError> {
        Ok(self.detect(&request.text, request.version))
    }
}

fn build_matcher(category: &str, entries: &[LexiconEntry]) -> Result<Option<CategoryMatcher>, ConfigError> {
    let mut words: Vec<&LexiconEntry> = entries.iter().filter(|e| !e.word.trim().is_empty()).collect();
    if words.is_empty() {
        return Ok(None);
    }
    words.sort_by(|a, b| b.word.len().cmp(&a.word.len()).then_with(|| a.word.cmp(&b.word)));

    let alternation = words
        .iter()
        .map(|e| regex::escape(e.word.trim()))
        .collect::<Vec<_>>()
        .join("|");
    let source = format!(r"\b(?:{})\b", alternation);
    let pattern = RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|source| ConfigError::Pattern {
            word: category.to_string(),
            source,
        })?;

    let entries = words
        .into_iter()
        .map(|e| (e.word.trim().to_lowercase(), e.clone()))
        .collect();

    Ok(Some(CategoryMatcher {
        category: category.to_lowercase(),
        pattern,
        entries,
    }))
}

// =============================================================================
// Tests
// =============================================================================
