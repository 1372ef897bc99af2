//! Work-email rule: syntactically valid address whose domain is not a known
//! consumer (free) email provider.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use greengrocer_core::ValueObject;

const BUNDLED_DOMAINS: &str = include_str!("../data/free_email_domains.json");

pub const INVALID_EMAIL: &str = "Email must be a valid email address";
pub const FREE_EMAIL: &str = "Should accept only work emails and none of the free emails.";

static EMAIL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

/// Set of free-email-provider domains (lowercase).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeEmailDomains(HashSet<String>);

impl FreeEmailDomains {
    /// The list shipped with the crate.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_DOMAINS).unwrap_or_default()
    }

    /// Parse a JSON array of domain strings.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let domains: Vec<String> = serde_json::from_str(json)?;
        Ok(domains.into_iter().collect())
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.0.contains(&domain.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for FreeEmailDomains {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|d| d.trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        )
    }
}

/// An email address that passed both the syntax and the work-domain rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkEmail(String);

impl ValueObject for WorkEmail {}

impl WorkEmail {
    /// Returns the failure message when the rule does not hold.
    pub fn parse(raw: &str, free_domains: &FreeEmailDomains) -> Result<Self, &'static str> {
        let candidate = raw.trim();
        if !EMAIL_SYNTAX.is_match(candidate) {
            return Err(INVALID_EMAIL);
        }
        let domain = candidate.rsplit_once('@').map(|(_, d)| d).unwrap_or_default();
        if free_domains.contains(domain) {
            return Err(FREE_EMAIL);
        }
        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
