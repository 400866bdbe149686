// src/session/mod.rs — Pseudonymous session bootstrap
//
// A session is created at login and lives in
// `<output>/<data_folder>/<YYYYMMDD_HHMMSS>_<First>_<Last>/`. It is only ever
// mutated by appending artifacts and is never deleted by the system.

pub mod artifacts;
pub mod id;
pub mod pseudonym;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::auth::{Condition, CredentialConfig, FeatureFlags};
use crate::infra::errors::{Result, StudyError};

pub use id::SessionId;
pub use pseudonym::PseudonymGenerator;

pub const PROFILE_DIR: &str = "profile";
pub const KNOWLEDGE_TEST_DIR: &str = "knowledge_test";
pub const LEARNING_LOGS_DIR: &str = "learning_logs";
pub const UEQ_DIR: &str = "ueq";
pub const META_DIR: &str = "meta";
pub const ANALYTICS_DIR: &str = "analytics";

/// Subdirectories created for every new session.
pub const SESSION_SUBDIRS: [&str; 6] = [
    PROFILE_DIR,
    KNOWLEDGE_TEST_DIR,
    LEARNING_LOGS_DIR,
    UEQ_DIR,
    META_DIR,
    ANALYTICS_DIR,
];

pub const CONDITION_FILE: &str = "condition.txt";
pub const RECORD_FILE: &str = "session.json";

/// Directory-name collisions with earlier runs before giving up.
const CREATE_ATTEMPTS: usize = 8;

/// Persisted as `meta/session.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub condition: Condition,
    pub data_folder: String,
    #[serde(default)]
    pub flags: FeatureFlags,
    pub created_at: DateTime<Local>,
}

/// Flat view used by loggers and analytics.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub session_dir: PathBuf,
    pub fake_name: String,
    pub timestamp: String,
    pub condition: Condition,
}

#[derive(Debug, Clone)]
pub struct Session {
    record: SessionRecord,
    dir: PathBuf,
}

impl Session {
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn id(&self) -> &SessionId {
        &self.record.session_id
    }

    pub fn fake_name(&self) -> &str {
        self.record.session_id.fake_name()
    }

    pub fn condition(&self) -> Condition {
        self.record.condition
    }

    pub fn flags(&self) -> FeatureFlags {
        self.record.flags
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn subdir(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.record.session_id.to_string(),
            session_dir: self.dir.clone(),
            fake_name: self.fake_name().to_string(),
            timestamp: self.record.session_id.timestamp_str(),
            condition: self.record.condition,
        }
    }

    /// Create any missing subdirectories. Safe to call repeatedly.
    pub fn ensure_layout(&self) -> Result<()> {
        for sub in SESSION_SUBDIRS {
            std::fs::create_dir_all(self.dir.join(sub))?;
        }
        Ok(())
    }

    fn write_record(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.record)?;
        std::fs::write(self.dir.join(META_DIR).join(RECORD_FILE), json)?;
        std::fs::write(self.dir.join(CONDITION_FILE), self.record.condition.as_str())?;
        Ok(())
    }
}

/// Creates and opens sessions under one output root.
pub struct SessionManager {
    output_root: PathBuf,
    names: PseudonymGenerator,
}

impl SessionManager {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self::with_generator(output_root, PseudonymGenerator::new())
    }

    pub fn with_generator(output_root: impl Into<PathBuf>, names: PseudonymGenerator) -> Self {
        Self {
            output_root: output_root.into(),
            names,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Create a new session for an authenticated credential.
    ///
    /// The condition comes from the credential; `requested` is honoured only
    /// for dev-mode credentials (see `CredentialConfig::resolve_condition`).
    pub fn create_session(
        &mut self,
        credential: &CredentialConfig,
        requested: Option<Condition>,
    ) -> Result<Session> {
        self.create_session_at(credential, requested, Local::now())
    }

    pub fn create_session_at(
        &mut self,
        credential: &CredentialConfig,
        requested: Option<Condition>,
        now: DateTime<Local>,
    ) -> Result<Session> {
        let condition = credential.resolve_condition(requested)?;
        let folder = self.output_root.join(&credential.data_folder);
        std::fs::create_dir_all(&folder)?;

        let timestamp: NaiveDateTime = now.naive_local();
        let mut last_collision = None;

        for _ in 0..CREATE_ATTEMPTS {
            let session_id = SessionId::new(timestamp, self.names.next_name()?);
            let dir = folder.join(session_id.to_string());

            // The session root must be new; reusing one would mix participants.
            match std::fs::create_dir(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(dir = %dir.display(), "Session directory taken, drawing a new name");
                    last_collision = Some(dir);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            let session = Session {
                record: SessionRecord {
                    session_id,
                    condition,
                    data_folder: credential.data_folder.clone(),
                    flags: credential.flags,
                    created_at: now,
                },
                dir,
            };
            session.ensure_layout()?;
            session.write_record()?;

            tracing::info!(
                session = %session.id(),
                condition = %condition,
                folder = %credential.data_folder,
                "Created session"
            );
            return Ok(session);
        }

        Err(StudyError::SessionExists(
            last_collision.unwrap_or_else(|| folder.clone()),
        ))
    }

    /// Open an existing session directory.
    ///
    /// Prefers `meta/session.json`; directories written before the record
    /// existed fall back to the directory name and `condition.txt`.
    pub fn open_session(dir: &Path) -> Result<Session> {
        let record_path = dir.join(META_DIR).join(RECORD_FILE);
        if record_path.exists() {
            let record: SessionRecord = serde_json::from_str(&std::fs::read_to_string(&record_path)?)?;
            return Ok(Session {
                record,
                dir: dir.to_path_buf(),
            });
        }

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StudyError::InvalidSessionId(dir.display().to_string()))?;
        let session_id = SessionId::parse(name)?;

        let condition_path = dir.join(CONDITION_FILE);
        if !condition_path.exists() {
            return Err(StudyError::MissingArtifact(condition_path));
        }
        let condition: Condition = std::fs::read_to_string(&condition_path)?.parse()?;

        let data_folder = dir
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let created_at = session_id
            .timestamp()
            .and_local_timezone(Local)
            .earliest()
            .unwrap_or_else(Local::now);

        Ok(Session {
            record: SessionRecord {
                session_id,
                condition,
                data_folder,
                flags: FeatureFlags::default(),
                created_at,
            },
            dir: dir.to_path_buf(),
        })
    }

    /// Find a session directory by id or path.
    pub fn locate(output_root: &Path, id_or_path: &str) -> Result<PathBuf> {
        let as_path = Path::new(id_or_path);
        if as_path.is_dir() {
            return Ok(as_path.to_path_buf());
        }
        SessionId::parse(id_or_path)?;
        list_session_dirs(output_root)?
            .into_iter()
            .find(|d| d.file_name().and_then(|n| n.to_str()) == Some(id_or_path))
            .ok_or_else(|| StudyError::SessionNotFound(id_or_path.to_string()))
    }
}

fn is_session_dir(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| SessionId::parse(n).is_ok())
}

/// Every session directory under `output_root`, sorted by path.
///
/// Looks one level deep (`<folder>/<session>`) and also accepts sessions
/// placed directly under the root.
pub fn list_session_dirs(output_root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !output_root.is_dir() {
        return Ok(found);
    }
    for entry in std::fs::read_dir(output_root)? {
        let path = entry?.path();
        if is_session_dir(&path) {
            found.push(path);
        } else if path.is_dir() {
            for inner in std::fs::read_dir(&path)? {
                let inner = inner?.path();
                if is_session_dir(&inner) {
                    found.push(inner);
                }
            }
        }
    }
    found.sort();
    Ok(found)
}
