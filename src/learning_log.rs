// src/learning_log.rs — Buffered logging of tutoring interactions

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::auth::Condition;
use crate::infra::errors::Result;
use crate::session::artifacts::display_value;
use crate::session::Session;

/// Key under which the UI passes the participant profile as context.
const PROFILE_KEY: &str = "StudentProfile";
const PROFILE_NAME_KEY: &str = "Name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub timestamp: String,
    pub interaction_type: String,
    pub user_input: Value,
    pub system_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// One saved batch of interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningLog {
    pub session_id: String,
    pub fake_name: String,
    pub condition: Condition,
    pub timestamp: String,
    pub interactions: Vec<Interaction>,
}

impl LearningLog {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Session ID: {}", self.session_id);
        let _ = writeln!(out, "Fake Name: {}", self.fake_name);
        let _ = writeln!(out, "Condition : {}\n", self.condition);
        let _ = writeln!(out, "Timestamp: {}", self.timestamp);
        out.push_str("\n=== INTERACTIONS ===\n\n");

        for i in &self.interactions {
            let _ = writeln!(out, "--- Interaction at {} ---", i.timestamp);
            let _ = writeln!(out, "Type: {}", i.interaction_type);
            let _ = writeln!(out, "User Input: {}", display_value(&i.user_input));
            let _ = writeln!(out, "System Response: {}", i.system_response);
            if let Some(meta) = &i.metadata {
                out.push_str("Metadata:\n");
                for (k, v) in meta {
                    let _ = writeln!(out, "  {k}: {}", display_value(v));
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Collects interactions for one session until they are saved.
pub struct LearningLogger<'a> {
    session: &'a Session,
    entries: Vec<Interaction>,
}

impl<'a> LearningLogger<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            entries: Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Buffer one interaction. A `StudentProfile` object inside the input
    /// has its `Name` replaced by the session's fake name first.
    pub fn log_interaction(
        &mut self,
        interaction_type: &str,
        user_input: Value,
        system_response: &str,
        metadata: Option<Map<String, Value>>,
    ) {
        self.entries.push(Interaction {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            interaction_type: interaction_type.to_string(),
            user_input: self.pseudonymize(user_input),
            system_response: system_response.to_string(),
            metadata: metadata.filter(|m| !m.is_empty()),
        });
    }

    fn pseudonymize(&self, mut input: Value) -> Value {
        if let Some(profile) = input
            .get_mut(PROFILE_KEY)
            .and_then(Value::as_object_mut)
        {
            profile.insert(
                PROFILE_NAME_KEY.into(),
                Value::String(self.session.fake_name().to_string()),
            );
        }
        input
    }

    /// Write buffered interactions and clear the buffer.
    ///
    /// With an empty buffer nothing is written unless `force` is set.
    pub fn save_logs(&mut self, force: bool) -> Result<Option<PathBuf>> {
        if self.entries.is_empty() && !force {
            return Ok(None);
        }
        let info = self.session.info();
        let log = LearningLog {
            session_id: info.session_id,
            fake_name: info.fake_name,
            condition: info.condition,
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            interactions: std::mem::take(&mut self.entries),
        };
        let path = self.session.save_learning_log(&log)?;
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialTable;
    use crate::infra::config::DEFAULT_SALT;
    use crate::session::{PseudonymGenerator, SessionManager, LEARNING_LOGS_DIR};
    use serde_json::json;
    use tempfile::TempDir;

    fn session(tmp: &TempDir) -> Session {
        let cred = CredentialTable::builtin(DEFAULT_SALT)
            .get("generic_g003")
            .cloned()
            .unwrap();
        SessionManager::with_generator(tmp.path(), PseudonymGenerator::with_seed(13))
            .create_session(&cred, None)
            .unwrap()
    }

    #[test]
    fn test_empty_buffer_not_saved() {
        let tmp = TempDir::new().unwrap();
        let s = session(&tmp);
        let mut logger = LearningLogger::new(&s);
        assert!(logger.save_logs(false).unwrap().is_none());
        assert!(logger.save_logs(true).unwrap().is_some());
    }

    #[test]
    fn test_profile_name_replaced() {
        let tmp = TempDir::new().unwrap();
        let s = session(&tmp);
        let mut logger = LearningLogger::new(&s);
        logger.log_interaction(
            "slide_explanation",
            json!({"StudentProfile": {"Name": "Jane Doe", "Major": "Biology"}, "slide": 3}),
            "Explanation",
            None,
        );
        let path = logger.save_logs(false).unwrap().unwrap();
        assert_eq!(logger.pending(), 0);

        let saved: LearningLog =
            serde_json::from_str(&std::fs::read_to_string(path.with_extension("json")).unwrap())
                .unwrap();
        let input = &saved.interactions[0].user_input;
        assert_eq!(input["StudentProfile"]["Name"], json!(s.fake_name()));
        assert_eq!(input["StudentProfile"]["Major"], json!("Biology"));
        assert_eq!(input["slide"], json!(3));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("Jane Doe"));
        assert!(text.contains("Type: slide_explanation"));
    }

    #[test]
    fn test_plain_input_untouched_and_metadata_rendered() {
        let tmp = TempDir::new().unwrap();
        let s = session(&tmp);
        let mut logger = LearningLogger::new(&s);
        let mut meta = Map::new();
        meta.insert("slide".into(), json!(12));
        logger.log_interaction("manual_chat", json!("Why?"), "Because.", Some(meta));
        logger.save_logs(false).unwrap();

        let logs: Vec<_> = std::fs::read_dir(s.subdir(LEARNING_LOGS_DIR))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "txt"))
            .collect();
        assert_eq!(logs.len(), 1);
        let text = std::fs::read_to_string(logs[0].path()).unwrap();
        assert!(text.contains("User Input: Why?"));
        assert!(text.contains("Metadata:\n  slide: 12"));
        assert!(text.contains("Condition : generic"));
    }
}
