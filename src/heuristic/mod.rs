use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod rules;

// ============================================================================
// Text rules: one fact about a blob of rendered text
// ============================================================================

/// A compiled regular expression that reads and writes as its source string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Pattern(Regex::new(pattern)?))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pattern::new(&value)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.as_str().to_string()
    }
}

/// A substring or regex test against text. Matching is case-sensitive;
/// list both spellings in a `ContainsAny` when case varies on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TextRule {
    Contains { pattern: String },
    Regex { pattern: Pattern },
    ContainsAll { patterns: Vec<String> },
    ContainsAny { patterns: Vec<String> },
}

impl TextRule {
    pub fn contains(pattern: &str) -> Self {
        TextRule::Contains {
            pattern: pattern.to_string(),
        }
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(TextRule::Regex {
            pattern: Pattern::new(pattern)?,
        })
    }

    pub fn all_of(patterns: &[&str]) -> Self {
        TextRule::ContainsAll {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn any_of(patterns: &[&str]) -> Self {
        TextRule::ContainsAny {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextRule::Contains { pattern } => text.contains(pattern.as_str()),
            TextRule::Regex { pattern } => pattern.is_match(text),
            TextRule::ContainsAll { patterns } => {
                patterns.iter().all(|p| text.contains(p.as_str()))
            }
            TextRule::ContainsAny { patterns } => {
                patterns.iter().any(|p| text.contains(p.as_str()))
            }
        }
    }
}

impl fmt::Display for TextRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextRule::Contains { pattern } => write!(f, "contains {:?}", pattern),
            TextRule::Regex { pattern } => write!(f, "matches /{}/", pattern.as_str()),
            TextRule::ContainsAll { patterns } => write!(f, "contains all of {:?}", patterns),
            TextRule::ContainsAny { patterns } => write!(f, "contains any of {:?}", patterns),
        }
    }
}

// ============================================================================
// Content heuristics: conjunction of facts
// ============================================================================

/// Decides a fact about rendered content when no stable selector exists.
///
/// Holds when every fact holds. Synonyms for one fact go in a single
/// `ContainsAny` rule, so the overall shape is AND across facts, OR within one.
/// A heuristic without facts never holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentHeuristic {
    pub name: String,
    pub facts: Vec<TextRule>,
}

impl ContentHeuristic {
    pub fn new(name: &str, facts: Vec<TextRule>) -> Self {
        Self {
            name: name.to_string(),
            facts,
        }
    }

    pub fn evaluate(&self, text: &str) -> bool {
        !self.facts.is_empty() && self.facts.iter().all(|fact| fact.matches(text))
    }

    /// Like `evaluate`, but keeps track of which facts failed.
    pub fn explain(&self, text: &str) -> HeuristicVerdict {
        let failed: Vec<String> = self
            .facts
            .iter()
            .filter(|fact| !fact.matches(text))
            .map(|fact| fact.to_string())
            .collect();

        HeuristicVerdict {
            name: self.name.clone(),
            holds: !self.facts.is_empty() && failed.is_empty(),
            failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicVerdict {
    pub name: String,
    pub holds: bool,
    pub failed: Vec<String>,
}

impl HeuristicVerdict {
    pub fn reason(&self) -> String {
        if self.holds {
            format!("{} holds", self.name)
        } else if self.failed.is_empty() {
            format!("{} has no facts to check", self.name)
        } else {
            format!("{} does not hold, failed: {}", self.name, self.failed.join("; "))
        }
    }
}
