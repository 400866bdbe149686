// src/analytics/session.rs — Final research analytics for one session
//
// Reads every artifact a session directory holds and condenses it into
// `analytics/final_research_analytics.json`.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::auth::Condition;
use crate::infra::errors::Result;
use crate::learning_log::LearningLog;
use crate::session::artifacts::{KNOWLEDGE_TEST_RESULTS, PSEUDONYMIZED_PROFILE, UEQ_RESPONSES};
use crate::session::{
    list_session_dirs, Session, SessionManager, ANALYTICS_DIR, KNOWLEDGE_TEST_DIR, LEARNING_LOGS_DIR, PROFILE_DIR,
    UEQ_DIR,
};
use crate::survey::knowledge::parse_total_score;
use crate::survey::ueq::UeqRecord;
use crate::timer;

pub const ANALYTICS_FILE: &str = "final_research_analytics.json";

/// Page name of the tutoring phase in page timings.
pub const LEARNING_PAGE: &str = "personalized_learning";

pub const SLIDE_EXPLANATION: &str = "slide_explanation";
pub const MANUAL_CHAT: &str = "manual_chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSessionInfo {
    pub session_id: String,
    pub pseudonym: String,
    pub condition: Condition,
    #[serde(default)]
    pub data_folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningEngagement {
    pub total_ai_interactions: u32,
    pub slide_explanations: u32,
    pub manual_chat: u32,
    pub other: u32,
    pub slide_to_chat_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeTestSummary {
    pub correct_answers: u32,
    pub total_questions: u32,
    pub accuracy_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningEfficiency {
    pub interactions_per_minute: f64,
    pub avg_time_per_interaction_seconds: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_session_time_minutes: Option<f64>,
    #[serde(default)]
    pub learning_engagement: LearningEngagement,
    pub knowledge_test_summary: Option<KnowledgeTestSummary>,
    pub learning_efficiency: Option<LearningEfficiency>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAnalytics {
    pub session_info: AnalyticsSessionInfo,
    pub generated_at: String,
    #[serde(default)]
    pub page_timings: BTreeMap<String, f64>,
    #[serde(default)]
    pub summary_metrics: SummaryMetrics,
    pub ueq_results: Option<UeqRecord>,
    pub profile_data: Option<Map<String, Value>>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Skipping unreadable JSON: {e}");
            None
        }
    }
}

fn load_learning_logs(dir: &Path) -> Result<Vec<LearningLog>> {
    let mut logs = Vec::new();
    if !dir.is_dir() {
        return Ok(logs);
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|x| x == "json"))
        .collect();
    paths.sort();
    for p in paths {
        if let Some(log) = read_json::<LearningLog>(&p) {
            logs.push(log);
        }
    }
    Ok(logs)
}

/// The UEQ JSON, preferring a recalculated `_fixed` copy. Plain-text
/// responses yield `None`.
fn load_ueq(dir: &Path) -> Option<UeqRecord> {
    let fixed = dir.join("ueq_responses_fixed.txt");
    let path = if fixed.exists() {
        fixed
    } else {
        dir.join(UEQ_RESPONSES)
    };
    let text = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

pub fn engagement(logs: &[LearningLog]) -> LearningEngagement {
    let mut e = LearningEngagement::default();
    for i in logs.iter().flat_map(|l| &l.interactions) {
        e.total_ai_interactions += 1;
        match i.interaction_type.as_str() {
            SLIDE_EXPLANATION => e.slide_explanations += 1,
            MANUAL_CHAT => e.manual_chat += 1,
            _ => e.other += 1,
        }
    }
    if e.manual_chat > 0 {
        e.slide_to_chat_ratio = Some(e.slide_explanations as f64 / e.manual_chat as f64);
    }
    e
}

fn efficiency(
    engagement: &LearningEngagement,
    timings: &BTreeMap<String, f64>,
) -> Option<LearningEfficiency> {
    let learning_secs = timings.get(LEARNING_PAGE).copied().filter(|s| *s > 0.0)?;
    let n = engagement.total_ai_interactions;
    Some(LearningEfficiency {
        interactions_per_minute: n as f64 / (learning_secs / 60.0),
        avg_time_per_interaction_seconds: (n > 0).then(|| learning_secs / n as f64),
    })
}

/// Build analytics for an opened session without writing anything.
pub fn build(session: &Session) -> Result<FinalAnalytics> {
    let dir = session.dir();
    let page_timings = timer::read_durations(dir)?.unwrap_or_default();

    let logs = load_learning_logs(&dir.join(LEARNING_LOGS_DIR))?;
    let learning_engagement = engagement(&logs);

    let knowledge_test_summary = std::fs::read_to_string(
        dir.join(KNOWLEDGE_TEST_DIR).join(KNOWLEDGE_TEST_RESULTS),
    )
    .ok()
    .and_then(|t| parse_total_score(&t))
    .map(|(correct, total)| KnowledgeTestSummary {
        correct_answers: correct,
        total_questions: total,
        accuracy_percentage: if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64 * 100.0
        },
    });

    let total_secs: f64 = page_timings.values().sum();
    let summary_metrics = SummaryMetrics {
        total_session_time_minutes: (!page_timings.is_empty()).then(|| total_secs / 60.0),
        learning_efficiency: efficiency(&learning_engagement, &page_timings),
        learning_engagement,
        knowledge_test_summary,
    };

    Ok(FinalAnalytics {
        session_info: AnalyticsSessionInfo {
            session_id: session.id().to_string(),
            pseudonym: session.fake_name().to_string(),
            condition: session.condition(),
            data_folder: session.record().data_folder.clone(),
        },
        generated_at: Local::now().to_rfc3339(),
        page_timings,
        summary_metrics,
        ueq_results: load_ueq(&dir.join(UEQ_DIR)),
        profile_data: read_json(&dir.join(PROFILE_DIR).join(format!("{PSEUDONYMIZED_PROFILE}.json"))),
    })
}

/// Build and write `analytics/final_research_analytics.json`.
pub fn generate(session_dir: &Path) -> Result<PathBuf> {
    let session = SessionManager::open_session(session_dir)?;
    let analytics = build(&session)?;

    let out_dir = session_dir.join(ANALYTICS_DIR);
    std::fs::create_dir_all(&out_dir)?;
    let path = out_dir.join(ANALYTICS_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&analytics)?)?;

    tracing::info!(session = %session.id(), "Wrote final analytics");
    Ok(path)
}

/// Outcome of generating analytics for every session under a root.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub per_condition: BTreeMap<Condition, usize>,
    /// (session directory, reason)
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run [`generate`] for each session directory under `output_root`.
///
/// A broken session is recorded in `failed` and does not stop the rest.
pub fn generate_all(output_root: &Path) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for dir in list_session_dirs(output_root)? {
        let condition = match SessionManager::open_session(&dir) {
            Ok(s) => s.condition(),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "Cannot open session: {e}");
                report.failed.push((dir, e.to_string()));
                continue;
            }
        };
        match generate(&dir) {
            Ok(path) => {
                *report.per_condition.entry(condition).or_default() += 1;
                report.written.push(path);
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "Analytics failed: {e}");
                report.failed.push((dir, e.to_string()));
            }
        }
    }
    tracing::info!(
        written = report.written.len(),
        failed = report.failed.len(),
        "Batch analytics finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning_log::Interaction;
    use serde_json::json;

    fn log(types: &[&str]) -> LearningLog {
        LearningLog {
            session_id: "20250423_083412_Alex_Kim".into(),
            fake_name: "Alex_Kim".into(),
            condition: Condition::Generic,
            timestamp: String::new(),
            interactions: types
                .iter()
                .map(|t| Interaction {
                    timestamp: String::new(),
                    interaction_type: t.to_string(),
                    user_input: json!(""),
                    system_response: String::new(),
                    metadata: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_engagement_counts() {
        let e = engagement(&[
            log(&[SLIDE_EXPLANATION, SLIDE_EXPLANATION, MANUAL_CHAT]),
            log(&[SLIDE_EXPLANATION, "test"]),
        ]);
        assert_eq!(e.total_ai_interactions, 5);
        assert_eq!(e.slide_explanations, 3);
        assert_eq!(e.manual_chat, 1);
        assert_eq!(e.other, 1);
        assert_eq!(e.slide_to_chat_ratio, Some(3.0));
    }

    #[test]
    fn test_engagement_no_chat_has_no_ratio() {
        let e = engagement(&[log(&[SLIDE_EXPLANATION])]);
        assert_eq!(e.slide_to_chat_ratio, None);
    }

    #[test]
    fn test_efficiency_needs_learning_time() {
        let e = engagement(&[log(&[MANUAL_CHAT, MANUAL_CHAT, MANUAL_CHAT])]);
        assert!(efficiency(&e, &BTreeMap::new()).is_none());

        let timings: BTreeMap<String, f64> = [(LEARNING_PAGE.to_string(), 120.0)].into();
        let eff = efficiency(&e, &timings).unwrap();
        assert_eq!(eff.interactions_per_minute, 1.5);
        assert_eq!(eff.avg_time_per_interaction_seconds, Some(40.0));
    }
}
