use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the automation driver should locate an element.
///
/// Written as a single string so check suites stay flat:
/// - `text=Add to basket` matches by visible text
/// - `role=button` or `role=button:Add to basket` matches by ARIA role and accessible name
/// - anything else is a CSS selector
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    Css(String),
    Text(String),
    Role { role: String, name: Option<String> },
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Selector::Text(text.into())
    }

    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Selector::Role {
            role: role.into(),
            name: name.map(|n| n.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorParseError(pub String);

impl fmt::Display for SelectorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid selector '{}'", self.0)
    }
}

impl std::error::Error for SelectorParseError {}

impl FromStr for Selector {
    type Err = SelectorParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectorParseError(raw.to_string()));
        }

        if let Some(text) = trimmed.strip_prefix("text=") {
            if text.is_empty() {
                return Err(SelectorParseError(raw.to_string()));
            }
            return Ok(Selector::Text(text.to_string()));
        }

        if let Some(rest) = trimmed.strip_prefix("role=") {
            let (role, name) = match rest.split_once(':') {
                Some((role, name)) => (role.trim(), Some(name.trim())),
                None => (rest.trim(), None),
            };
            if role.is_empty() {
                return Err(SelectorParseError(raw.to_string()));
            }
            return Ok(Selector::Role {
                role: role.to_string(),
                name: name.filter(|n| !n.is_empty()).map(|n| n.to_string()),
            });
        }

        Ok(Selector::Css(trimmed.to_string()))
    }
}

impl TryFrom<String> for Selector {
    type Error = SelectorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(css) => write!(f, "{}", css),
            Selector::Text(text) => write!(f, "text={}", text),
            Selector::Role { role, name: Some(name) } => write!(f, "role={}:{}", role, name),
            Selector::Role { role, name: None } => write!(f, "role={}", role),
        }
    }
}
