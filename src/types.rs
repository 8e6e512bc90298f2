// =============================================================================
// Shared types used across the signal desk
// =============================================================================
//
// Wire enums are accepted case-insensitively (the remote generator is not
// consistent about casing) and serialised in their canonical casing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Trade direction recommended by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Direction {
    Buy,
    Sell,
    Neutral,
}

impl TryFrom<String> for Direction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "NEUTRAL" => Ok(Self::Neutral),
            _ => Err(format!("unknown signal direction '{value}'")),
        }
    }
}

/// LOW / MEDIUM / HIGH grading used for both signal strength and impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(format!("unknown level '{value}'")),
        }
    }
}

/// A directional trading recommendation for one currency pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub pair: String,
    pub direction: Direction,
    pub strength: Level,
    /// Percentage as sent by the generator, e.g. "75%".
    pub confidence: String,
    #[serde(default)]
    pub rationale: String,
    pub impact: Level,
}

impl Signal {
    /// Parse `confidence` into a percentage. Accepts "75%", "75" and " 75.5 % ".
    pub fn confidence_pct(&self) -> Option<f64> {
        let trimmed = self.confidence.trim().trim_end_matches('%').trim();
        trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// The full collection of signals plus summary for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    #[serde(default)]
    pub market_summary: String,
    #[serde(default)]
    pub signals: Vec<Signal>,
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Accept RFC 3339 or a naive ISO-8601 datetime (interpreted as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

/// Parse a remote timestamp string into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Impact grading of an economic calendar release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum EventImpact {
    High,
    Medium,
    Low,
}

impl EventImpact {
    /// Wire form used in the `impact=` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl TryFrom<String> for EventImpact {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for EventImpact {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("unknown event impact '{value}'")),
        }
    }
}

/// A scheduled macroeconomic data release.
///
/// Scraped rows are loosely shaped: any text field may be `null`, and holiday
/// or ungraded rows carry no usable impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicEvent {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub time: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub country: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event: String,
    /// `None` for a missing, `null` or unrecognised grade.
    #[serde(default, deserialize_with = "lenient_impact")]
    pub impact: Option<EventImpact>,
    #[serde(default)]
    pub actual: Option<String>,
    #[serde(default)]
    pub forecast: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_impact<'de, D>(deserializer: D) -> Result<Option<EventImpact>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

/// Which scraper the remote should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeSource {
    #[default]
    CashbackForex,
    ForexFactory,
}

impl ScrapeSource {
    /// Remote path that triggers this scraper.
    pub fn path(&self) -> &'static str {
        match self {
            Self::CashbackForex => "/scrape/cashbackforex",
            Self::ForexFactory => "/scrape/forexfactory",
        }
    }
}

impl std::fmt::Display for ScrapeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashbackForex => write!(f, "cashbackforex"),
            Self::ForexFactory => write!(f, "forexfactory"),
        }
    }
}

/// Liveness of the remote API as seen by the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Checking,
    Online,
    Offline,
}
