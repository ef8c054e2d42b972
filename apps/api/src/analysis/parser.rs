//! Match percentage extraction from free-form model output.
//!
//! Two independent rules, tried in order:
//! 1. `structured_percentage` — the "Match Percentage: XX%" line the match prompt asks for.
//! 2. `scan_standalone_percentage` — the first word-bounded number in [0, 100].
//!
//! Nothing here fails: text without a usable number yields 0.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// "Match Percentage:" then optional whitespace / markdown emphasis, a digit run, and `%`.
static STRUCTURED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)match percentage:[\s*_]*(\d+)%").unwrap());

static STANDALONE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());

/// An integer percentage guaranteed to lie in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MatchPercentage(u8);

impl MatchPercentage {
    pub const ZERO: MatchPercentage = MatchPercentage(0);
    pub const FULL: MatchPercentage = MatchPercentage(100);

    /// Returns `None` for values above 100.
    pub fn new(value: u32) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(MatchPercentage)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// The gap to a full match: `100 - value`.
    pub fn remainder(self) -> u8 {
        100 - self.0
    }
}

impl TryFrom<u32> for MatchPercentage {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        MatchPercentage::new(value).ok_or_else(|| format!("{value} is not a percentage in 0..=100"))
    }
}

impl From<MatchPercentage> for u32 {
    fn from(p: MatchPercentage) -> Self {
        p.0 as u32
    }
}

impl std::fmt::Display for MatchPercentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Which rule produced a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageSource {
    /// Found on the templated "Match Percentage: XX%" line.
    Structured,
    /// First standalone number in range; may be an unrelated figure.
    Heuristic,
    /// Nothing usable in the text.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PercentageExtraction {
    pub percentage: MatchPercentage,
    pub source: PercentageSource,
}

/// Primary rule: the first in-range value on a "Match Percentage: XX%" line.
///
/// Templated values above 100 are not trusted and are skipped.
pub fn structured_percentage(text: &str) -> Option<MatchPercentage> {
    STRUCTURED_RE.captures_iter(text).find_map(|caps| {
        let value = caps.get(1)?.as_str().parse::<u32>().ok()?;
        MatchPercentage::new(value)
    })
}

/// Fallback rule: the first word-bounded digit run whose value is in [0, 100].
pub fn scan_standalone_percentage(text: &str) -> Option<MatchPercentage> {
    STANDALONE_NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .find_map(MatchPercentage::new)
}

/// Runs the structured rule, then the heuristic scan, then defaults to 0.
pub fn extract_match(text: &str) -> PercentageExtraction {
    if let Some(percentage) = structured_percentage(text) {
        return PercentageExtraction {
            percentage,
            source: PercentageSource::Structured,
        };
    }
    if let Some(percentage) = scan_standalone_percentage(text) {
        return PercentageExtraction {
            percentage,
            source: PercentageSource::Heuristic,
        };
    }
    PercentageExtraction {
        percentage: MatchPercentage::ZERO,
        source: PercentageSource::Default,
    }
}

#[cfg_attr(not(test), allow(dead_code))]
pub fn extract_percentage(text: &str) -> MatchPercentage {
    extract_match(text).percentage
}
