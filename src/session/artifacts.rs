// src/session/artifacts.rs — Artifact writers for a session directory

use chrono::Local;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{Session, KNOWLEDGE_TEST_DIR, LEARNING_LOGS_DIR, PROFILE_DIR, UEQ_DIR};
use crate::infra::errors::Result;
use crate::learning_log::LearningLog;
use crate::survey::ueq::{UeqEvaluation, UeqRecord};

pub const ORIGINAL_PROFILE: &str = "original_profile";
pub const PSEUDONYMIZED_PROFILE: &str = "pseudonymized_profile";
pub const KNOWLEDGE_TEST_RESULTS: &str = "knowledge_test_results.txt";
pub const UEQ_RESPONSES: &str = "ueq_responses.txt";

/// Render a JSON value the way it reads in the text artifacts.
pub(crate) fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn key_value_text(map: &Map<String, Value>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}: {}\n", display_value(v)))
        .collect()
}

/// `base.ext`, or `base_2.ext`, `base_3.ext`… when that name is taken.
fn unique_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let first = dir.join(format!("{base}.{ext}"));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("{base}_{n}.{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

impl Session {
    fn condition_header(&self) -> String {
        format!("Condition : {}\n\n", self.condition())
    }

    /// Save the participant profile twice: as given, and with `name`
    /// replaced by the session's fake name. Returns the pseudonymized text path.
    pub fn save_profile(&self, profile: &Map<String, Value>) -> Result<PathBuf> {
        let mut pseudo = profile.clone();
        pseudo.insert("name".into(), Value::String(self.fake_name().to_string()));

        let dir = self.subdir(PROFILE_DIR);
        std::fs::write(
            dir.join(format!("{ORIGINAL_PROFILE}.txt")),
            key_value_text(profile),
        )?;
        std::fs::write(
            dir.join(format!("{ORIGINAL_PROFILE}.json")),
            serde_json::to_string_pretty(profile)?,
        )?;

        let pseudo_txt = dir.join(format!("{PSEUDONYMIZED_PROFILE}.txt"));
        std::fs::write(&pseudo_txt, key_value_text(&pseudo))?;
        std::fs::write(
            dir.join(format!("{PSEUDONYMIZED_PROFILE}.json")),
            serde_json::to_string_pretty(&pseudo)?,
        )?;

        tracing::debug!(session = %self.id(), "Saved profile");
        Ok(pseudo_txt)
    }

    pub fn save_knowledge_test_results(&self, summary: &str) -> Result<PathBuf> {
        let path = self.subdir(KNOWLEDGE_TEST_DIR).join(KNOWLEDGE_TEST_RESULTS);
        std::fs::write(&path, format!("{}{summary}", self.condition_header()))?;
        tracing::debug!(session = %self.id(), "Saved knowledge test results");
        Ok(path)
    }

    /// Write one batch of interactions as text and as JSON. Returns the text path.
    pub fn save_learning_log(&self, log: &LearningLog) -> Result<PathBuf> {
        let dir = self.subdir(LEARNING_LOGS_DIR);
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let txt = unique_path(&dir, &format!("learning_log_{stamp}"), "txt");
        let json = txt.with_extension("json");

        std::fs::write(&txt, log.render_text())?;
        std::fs::write(&json, serde_json::to_string_pretty(log)?)?;

        tracing::debug!(
            session = %self.id(),
            interactions = log.interactions.len(),
            "Saved learning log"
        );
        Ok(txt)
    }

    /// Free-text UEQ answers.
    pub fn save_ueq_responses(&self, response_text: &str) -> Result<PathBuf> {
        let path = self.subdir(UEQ_DIR).join(UEQ_RESPONSES);
        std::fs::write(&path, format!("{}{response_text}", self.condition_header()))?;
        Ok(path)
    }

    /// Raw answers, scale means, grades and an optional comment, as JSON.
    pub fn save_ueq(
        &self,
        answers: &BTreeMap<String, u8>,
        evaluation: &UeqEvaluation,
        comment: Option<&str>,
    ) -> Result<PathBuf> {
        let record = UeqRecord {
            answers: answers.clone(),
            scale_means: evaluation.means.clone(),
            grades: evaluation.grades.clone(),
            comment: comment.unwrap_or_default().to_string(),
            condition: Some(self.condition()),
        };
        let path = self.subdir(UEQ_DIR).join(UEQ_RESPONSES);
        std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;
        tracing::debug!(session = %self.id(), "Saved UEQ");
        Ok(path)
    }
}
