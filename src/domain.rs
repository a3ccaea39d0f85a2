//! Domain model for the onboarding flow and the news dashboard.
//!
//! These are plain value types. All decisions about when they are created or
//! trimmed live in [`crate::session`].

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::FlowError;

/// Attribution stamped on every item that came from the external news source.
pub const NEWS_BOT_REPORTER: &str = "InfoSphere News Bot";

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Account role chosen right after login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Reader. Goes straight to topic selection.
    #[default]
    Citizen,
    /// Must pass document verification before topic selection.
    Reporter,
}

impl Role {
    pub fn requires_verification(self) -> bool {
        matches!(self, Role::Reporter)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Citizen => write!(f, "citizen"),
            Role::Reporter => write!(f, "reporter"),
        }
    }
}

/// News topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsField {
    TechAi,
    Jobs,
}

impl NewsField {
    pub const ALL: [NewsField; 2] = [NewsField::TechAi, NewsField::Jobs];

    /// Human readable label, also used verbatim in the news prompt.
    pub fn label(self) -> &'static str {
        match self {
            NewsField::TechAi => "Technology / AI",
            NewsField::Jobs => "Jobs / Daily Information",
        }
    }
}

impl fmt::Display for NewsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Geographic scope of a news query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsRegion {
    State,
    National,
    International,
}

impl NewsRegion {
    pub const ALL: [NewsRegion; 3] = [
        NewsRegion::State,
        NewsRegion::National,
        NewsRegion::International,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NewsRegion::State => "State-wise",
            NewsRegion::National => "National-wise",
            NewsRegion::International => "International-wise",
        }
    }

    /// Whether a state or country must be picked before a query is issued.
    pub fn requires_location(self) -> bool {
        !matches!(self, NewsRegion::International)
    }

    /// Catalog the subordinate picker offers for this region, if any.
    pub fn location_catalog(self) -> Option<&'static [&'static str]> {
        match self {
            NewsRegion::State => Some(INDIAN_STATES),
            NewsRegion::National => Some(COUNTRIES),
            NewsRegion::International => None,
        }
    }
}

impl fmt::Display for NewsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named state of the onboarding/browsing flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewStep {
    #[default]
    Login,
    RoleSelect,
    Verification,
    FieldSelect,
    RegionSelect,
    Dashboard,
}

impl ViewStep {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewStep::Login => "LOGIN",
            ViewStep::RoleSelect => "ROLE_SELECT",
            ViewStep::Verification => "VERIFICATION",
            ViewStep::FieldSelect => "FIELD_SELECT",
            ViewStep::RegionSelect => "REGION_SELECT",
            ViewStep::Dashboard => "DASHBOARD",
        }
    }
}

impl fmt::Display for ViewStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editorial tag the news source attaches to a story.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NewsTag {
    Critical,
    #[default]
    Latest,
    Growth,
    Policy,
    Trend,
}

impl NewsTag {
    pub fn as_str(self) -> &'static str {
        match self {
            NewsTag::Critical => "CRITICAL",
            NewsTag::Latest => "LATEST",
            NewsTag::Growth => "GROWTH",
            NewsTag::Policy => "POLICY",
            NewsTag::Trend => "TREND",
        }
    }

    /// Parse a tag leniently. Unknown or missing tags fall back to the default.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("CRITICAL") => NewsTag::Critical,
            Some("LATEST") => NewsTag::Latest,
            Some("GROWTH") => NewsTag::Growth,
            Some("POLICY") => NewsTag::Policy,
            Some("TREND") => NewsTag::Trend,
            _ => NewsTag::default(),
        }
    }

    pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(Self::parse_lenient(raw.as_deref()))
    }
}

impl fmt::Display for NewsTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a news item came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOrigin {
    #[default]
    External,
    Reporter,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

static EMAIL_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern is valid")
});

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, FlowError> {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(FlowError::InvalidEmail(input.to_string()));
        }
        if !EMAIL_SYNTAX.is_match(&normalized) {
            return Err(FlowError::InvalidEmail(input.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = FlowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session-scoped account. Created at login, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: EmailAddress,
    /// Starts as [`Role::Citizen`] until the role step runs.
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Name of the document that passed verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_proof_ref: Option<String>,
}

impl User {
    pub fn new(email: EmailAddress) -> Self {
        Self {
            email,
            role: Role::default(),
            is_verified: false,
            phone_number: None,
            id_proof_ref: None,
        }
    }
}

// ---------------------------------------------------------------------------
// NewsItem
// ---------------------------------------------------------------------------

/// Citation attached to a story when the news source used web grounding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// A single story on the dashboard. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// `news-<index>-<epoch millis>`, unique within a feed.
    pub id: String,
    pub title: String,
    pub description: String,
    pub field: NewsField,
    pub region: NewsRegion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_name: Option<String>,
    pub reporter_id: String,
    pub posted_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub source: ItemOrigin,
    #[serde(default, deserialize_with = "NewsTag::deserialize_lenient")]
    pub tag: NewsTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

impl NewsItem {
    /// Short story identifier shown in the article header.
    pub fn story_id(&self) -> &str {
        self.id.split('-').nth(1).unwrap_or(&self.id)
    }
}

// ---------------------------------------------------------------------------
// Location catalogs
// ---------------------------------------------------------------------------

/// Indian states and union territories offered for `STATE` queries.
pub const INDIAN_STATES: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Lakshadweep",
    "Puducherry",
];

/// Countries offered for `NATIONAL` queries.
pub const COUNTRIES: &[&str] = &[
    "India",
    "United States",
    "United Kingdom",
    "Canada",
    "Australia",
    "Germany",
    "France",
    "Italy",
    "Spain",
    "Netherlands",
    "Sweden",
    "Switzerland",
    "Japan",
    "China",
    "South Korea",
    "Singapore",
    "Indonesia",
    "Brazil",
    "Mexico",
    "Argentina",
    "South Africa",
    "Nigeria",
    "Kenya",
    "Egypt",
    "Saudi Arabia",
    "United Arab Emirates",
    "Israel",
    "Russia",
    "New Zealand",
    "Bangladesh",
    "Sri Lanka",
    "Nepal",
];

/// Resolve a user-typed location against a catalog, returning the canonical
/// spelling.
pub fn resolve_location(catalog: &[&'static str], input: &str) -> Option<&'static str> {
    let wanted = input.trim();
    if wanted.is_empty() {
        return None;
    }
    catalog
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(wanted))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
