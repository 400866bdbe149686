// src/auth/mod.rs — Study credential table
//
// Maps username/password pairs to a small study configuration: the
// experimental condition, the data folder, and three feature flags.
// Participants cannot choose their condition; only dev-mode credentials can.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::infra::config::AuthConfig;
use crate::infra::errors::{Result, StudyError};

/// Experimental arm assigned to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    #[serde(alias = "personalized")]
    Personalised,
    Generic,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Personalised => "personalised",
            Condition::Generic => "generic",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Condition {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "personalised" | "personalized" => Ok(Condition::Personalised),
            "generic" => Ok(Condition::Generic),
            other => Err(StudyError::UnknownCondition(other.to_string())),
        }
    }
}

/// Booleans derived from which credential logged in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub dev_mode: bool,
    pub fast_test_mode: bool,
    pub upload_enabled: bool,
}

impl FeatureFlags {
    const fn new(dev_mode: bool, fast_test_mode: bool, upload_enabled: bool) -> Self {
        Self {
            dev_mode,
            fast_test_mode,
            upload_enabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialConfig {
    pub username: String,
    pub password_hash: String,
    pub condition: Condition,
    pub description: String,
    pub data_folder: String,
    pub flags: FeatureFlags,
}

impl CredentialConfig {
    /// Decide the session condition for this credential.
    ///
    /// Dev-mode credentials may pick either arm; everyone else gets the
    /// assigned one, and asking for the other arm is an error.
    pub fn resolve_condition(&self, requested: Option<Condition>) -> Result<Condition> {
        match requested {
            Some(c) if self.flags.dev_mode => Ok(c),
            Some(c) if c != self.condition => Err(StudyError::ConditionLocked {
                username: self.username.clone(),
                assigned: self.condition.to_string(),
            }),
            _ => Ok(self.condition),
        }
    }
}

/// Hex SHA-256 of `password ++ salt`.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time byte comparison so hash checks do not leak timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// (username, password, condition, description, data_folder, flags)
type BuiltinRow = (
    &'static str,
    &'static str,
    Condition,
    &'static str,
    &'static str,
    FeatureFlags,
);

const PARTICIPANT: FeatureFlags = FeatureFlags::new(false, false, false);

const BUILTIN: &[BuiltinRow] = &[
    (
        "personalised_p001",
        "PersonalisedCohort2025!",
        Condition::Personalised,
        "Personalised Learning Cohort Participant",
        "personalised_cohort",
        PARTICIPANT,
    ),
    (
        "personalised_p002",
        "PersonalisedCohort2025!",
        Condition::Personalised,
        "Personalised Learning Cohort Participant",
        "personalised_cohort",
        PARTICIPANT,
    ),
    (
        "personalised_p003",
        "PersonalisedCohort2025!",
        Condition::Personalised,
        "Personalised Learning Cohort Participant",
        "personalised_cohort",
        PARTICIPANT,
    ),
    (
        "generic_g001",
        "GenericCohort2025!",
        Condition::Generic,
        "Generic Learning Cohort Participant",
        "generic_cohort",
        PARTICIPANT,
    ),
    (
        "generic_g002",
        "GenericCohort2025!",
        Condition::Generic,
        "Generic Learning Cohort Participant",
        "generic_cohort",
        PARTICIPANT,
    ),
    (
        "generic_g003",
        "GenericCohort2025!",
        Condition::Generic,
        "Generic Learning Cohort Participant",
        "generic_cohort",
        PARTICIPANT,
    ),
    (
        "dev_researcher",
        "DevMode2025Research!",
        Condition::Personalised,
        "Development Mode - Full Access",
        "dev_testing",
        FeatureFlags::new(true, false, true),
    ),
    (
        "fast_demo",
        "FastDemo2025!",
        Condition::Personalised,
        "Fast Test Mode - Demo Access",
        "demo_testing",
        FeatureFlags::new(false, true, false),
    ),
    (
        "dev_fast_test",
        "DevFastTest2025!",
        Condition::Personalised,
        "Development + Fast Test Mode",
        "dev_fast_testing",
        FeatureFlags::new(true, true, true),
    ),
    (
        "admin_furkan",
        "AdminAccess2025Furkan!",
        Condition::Personalised,
        "Administrator Access",
        "admin_testing",
        FeatureFlags::new(true, false, true),
    ),
];

/// Static username → credential lookup.
#[derive(Debug, Clone)]
pub struct CredentialTable {
    salt: String,
    credentials: BTreeMap<String, CredentialConfig>,
}

impl CredentialTable {
    /// The credentials handed out for the study, hashed with `salt`.
    pub fn builtin(salt: &str) -> Self {
        let credentials = BUILTIN
            .iter()
            .map(|(user, pass, condition, desc, folder, flags)| {
                (
                    user.to_string(),
                    CredentialConfig {
                        username: user.to_string(),
                        password_hash: hash_password(pass, salt),
                        condition: *condition,
                        description: desc.to_string(),
                        data_folder: folder.to_string(),
                        flags: *flags,
                    },
                )
            })
            .collect();
        Self {
            salt: salt.to_string(),
            credentials,
        }
    }

    /// Table from `[auth]` config; the built-in table when no entries are listed.
    pub fn from_config(auth: &AuthConfig) -> Self {
        if auth.credentials.is_empty() {
            return Self::builtin(&auth.salt);
        }
        let credentials = auth
            .credentials
            .iter()
            .map(|e| {
                (
                    e.username.clone(),
                    CredentialConfig {
                        username: e.username.clone(),
                        password_hash: e.password_hash.to_ascii_lowercase(),
                        condition: e.condition,
                        description: e.description.clone(),
                        data_folder: e.data_folder.clone(),
                        flags: FeatureFlags::new(e.dev_mode, e.fast_test_mode, e.upload_enabled),
                    },
                )
            })
            .collect();
        Self {
            salt: auth.salt.clone(),
            credentials,
        }
    }

    /// Authenticate and return the credential's configuration.
    ///
    /// Unknown users and wrong passwords fail identically.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<&CredentialConfig> {
        let candidate = hash_password(password, &self.salt);
        match self.credentials.get(username) {
            Some(cred) if constant_time_eq(candidate.as_bytes(), cred.password_hash.as_bytes()) => {
                tracing::info!(
                    condition = %cred.condition,
                    folder = %cred.data_folder,
                    "Credential accepted"
                );
                Ok(cred)
            }
            _ => {
                tracing::warn!("Rejected login attempt");
                Err(StudyError::InvalidCredentials)
            }
        }
    }

    pub fn get(&self, username: &str) -> Option<&CredentialConfig> {
        self.credentials.get(username)
    }

    /// Username → description, sorted by username.
    pub fn available_usernames(&self) -> Vec<(&str, &str)> {
        self.credentials
            .values()
            .map(|c| (c.username.as_str(), c.description.as_str()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CredentialConfig> {
        self.credentials.values()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
