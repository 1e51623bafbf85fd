//! Shared identifiers and small enums used across the MEDCHAT crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Row ID of a stored user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Upstream failure policy
// ---------------------------------------------------------------------------

/// What a service family does when the model call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamPolicy {
    /// Surface the failure as HTTP 500 with the error text.
    Propagate,
    /// Answer HTTP 200 with a fixed apology sentence.
    Fallback,
}

impl UpstreamPolicy {
    /// Reply text used by [`UpstreamPolicy::Fallback`].
    pub const FALLBACK_REPLY: &'static str = "抱歉，服务暂时出现问题，请稍后再试。";
}

impl fmt::Display for UpstreamPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => write!(f, "propagate"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

// ---------------------------------------------------------------------------
// Account fields
// ---------------------------------------------------------------------------

/// The free-form JSON columns of an account that clients may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    /// Survey answers and measurements.
    HealthData,
    /// Medication schedule entries.
    MedicationReminders,
    /// Hearing test scores.
    HearingTestResults,
    /// Sleep / light / phone-usage reports.
    SleepReports,
    /// Past chat exchanges.
    ChatHistory,
}

impl AccountField {
    /// Column name in the `users` table. Also the URL path segment.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::HealthData => "health_data",
            Self::MedicationReminders => "medication_reminders",
            Self::HearingTestResults => "hearing_test_results",
            Self::SleepReports => "sleep_reports",
            Self::ChatHistory => "chat_history",
        }
    }

    /// All writable fields.
    #[must_use]
    pub fn all() -> &'static [AccountField] {
        &[
            Self::HealthData,
            Self::MedicationReminders,
            Self::HearingTestResults,
            Self::SleepReports,
            Self::ChatHistory,
        ]
    }
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for AccountField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|field| field.column() == s)
            .ok_or_else(|| format!("unknown account field: '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_field_from_str_round_trip() {
        for field in AccountField::all() {
            let parsed: AccountField = field.to_string().parse().expect("should parse");
            assert_eq!(*field, parsed);
        }
    }

    #[test]
    fn account_field_rejects_password_hash() {
        assert!("password_hash".parse::<AccountField>().is_err());
        assert!("email".parse::<AccountField>().is_err());
    }

    #[test]
    fn policy_deserializes_lowercase() {
        let p: UpstreamPolicy = serde_json::from_str("\"fallback\"").expect("parse");
        assert_eq!(p, UpstreamPolicy::Fallback);
        assert_eq!(UpstreamPolicy::Propagate.to_string(), "propagate");
    }
}
