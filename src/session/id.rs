// src/session/id.rs — Session identifier: `<YYYYMMDD_HHMMSS>_<First>_<Last>`

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use crate::infra::errors::{Result, StudyError};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId {
    timestamp: NaiveDateTime,
    fake_name: String,
}

impl SessionId {
    pub fn new(timestamp: NaiveDateTime, fake_name: impl Into<String>) -> Self {
        Self {
            timestamp,
            fake_name: fake_name.into(),
        }
    }

    /// Parse `20250423_083412_Winter_Smith`. The timestamp is always the
    /// first 15 characters; everything after the separator is the name.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || StudyError::InvalidSessionId(s.to_string());

        let ts = s.get(..TIMESTAMP_LEN).ok_or_else(invalid)?;
        let rest = s.get(TIMESTAMP_LEN..).ok_or_else(invalid)?;
        let name = rest.strip_prefix('_').ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }
        let timestamp = NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
        Ok(Self::new(timestamp, name))
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// The timestamp part as it appears in the id.
    pub fn timestamp_str(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn fake_name(&self) -> &str {
        &self.fake_name
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.timestamp_str(), self.fake_name)
    }
}

impl FromStr for SessionId {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = StudyError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 23)
            .unwrap()
            .and_hms_opt(8, 34, 12)
            .unwrap()
    }

    #[test]
    fn test_display() {
        let id = SessionId::new(ts(), "Winter_Smith");
        assert_eq!(id.to_string(), "20250423_083412_Winter_Smith");
        assert_eq!(id.timestamp_str(), "20250423_083412");
    }

    #[test]
    fn test_parse_splits_after_timestamp() {
        let id = SessionId::parse("20250922_142955_Winter_Smith").unwrap();
        assert_eq!(id.fake_name(), "Winter_Smith");
        assert_eq!(id.timestamp_str(), "20250922_142955");
        assert_eq!(id.to_string(), "20250922_142955_Winter_Smith");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "20250423_083412",
            "20250423_083412_",
            "20250423-083412_Alex_Kim",
            "2025042_083412_Alex_Kim",
            "20251323_083412_Alex_Kim",
            "connection_test_file.txt",
        ] {
            assert!(SessionId::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_parse_non_ascii_does_not_panic() {
        assert!(SessionId::parse("2025042é_083412_Alex").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = SessionId::new(ts(), "Alex_Kim");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"20250423_083412_Alex_Kim\"");
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
