// src/analytics/aggregate.rs — Cross-session comparison by condition

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::session::{FinalAnalytics, LearningEngagement, ANALYTICS_FILE, LEARNING_PAGE};
use super::stats::Stats;
use crate::auth::Condition;
use crate::infra::errors::{Result, StudyError};
use crate::session::ANALYTICS_DIR;
use crate::survey::ueq::{Grade, SCALES};

pub const REPORT_FILE: &str = "research_analysis.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UeqAggregate {
    pub responses: usize,
    pub scale_scores: BTreeMap<String, Stats>,
    pub grade_distribution: BTreeMap<String, BTreeMap<Grade, usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionAnalysis {
    pub sessions: usize,
    pub total_session_time_minutes: Option<Stats>,
    pub learning_phase_minutes: Option<Stats>,
    pub total_interactions: Option<Stats>,
    pub slide_explanations_total: u32,
    pub manual_chat_total: u32,
    pub slide_to_chat_ratio: Option<Stats>,
    pub knowledge_accuracy_percentage: Option<Stats>,
    pub knowledge_correct_answers: Option<Stats>,
    pub interactions_per_minute: Option<Stats>,
    pub avg_time_per_interaction_seconds: Option<Stats>,
    pub ueq: Option<UeqAggregate>,
}

/// One row of the per-session detail list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedSession {
    pub session_id: String,
    pub condition: Condition,
    pub total_session_time_minutes: Option<f64>,
    pub learning_phase_minutes: Option<f64>,
    pub total_interactions: u32,
    pub knowledge_accuracy_percentage: Option<f64>,
    pub ueq_scale_means: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchAnalysis {
    pub generated_at: String,
    pub total_sessions: usize,
    pub conditions: BTreeMap<Condition, ConditionAnalysis>,
    pub detailed_sessions: Vec<DetailedSession>,
}

/// Every `analytics/final_research_analytics.json` under the root, sorted.
pub fn find_analytics_files(output_root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = output_root
        .join("**")
        .join(ANALYTICS_DIR)
        .join(ANALYTICS_FILE);
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern).map_err(|e| StudyError::Config(e.to_string()))?;
    let mut found: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
    found.sort();
    Ok(found)
}

/// Load analytics files, skipping (and logging) unreadable ones.
pub fn load_all(output_root: &Path) -> Result<Vec<FinalAnalytics>> {
    let mut out = Vec::new();
    for path in find_analytics_files(output_root)? {
        let parsed = std::fs::read_to_string(&path)
            .map_err(StudyError::from)
            .and_then(|t| serde_json::from_str::<FinalAnalytics>(&t).map_err(StudyError::from));
        match parsed {
            Ok(a) => out.push(a),
            Err(e) => tracing::warn!(path = %path.display(), "Skipping analytics file: {e}"),
        }
    }
    Ok(out)
}

fn learning_minutes(a: &FinalAnalytics) -> Option<f64> {
    a.page_timings.get(LEARNING_PAGE).map(|s| s / 60.0)
}

fn stats_of<F>(sessions: &[&FinalAnalytics], f: F) -> Option<Stats>
where
    F: Fn(&FinalAnalytics) -> Option<f64>,
{
    let values: Vec<f64> = sessions.iter().filter_map(|a| f(*a)).collect();
    Stats::from_values(&values)
}

fn ueq_aggregate(sessions: &[&FinalAnalytics]) -> Option<UeqAggregate> {
    let records: Vec<_> = sessions.iter().filter_map(|a| a.ueq_results.as_ref()).collect();
    if records.is_empty() {
        return None;
    }
    let mut agg = UeqAggregate {
        responses: records.len(),
        ..Default::default()
    };
    for scale in &SCALES {
        let means: Vec<f64> = records
            .iter()
            .filter_map(|r| r.scale_means.get(scale.name).copied())
            .collect();
        if let Some(s) = Stats::from_values(&means) {
            agg.scale_scores.insert(scale.name.to_string(), s);
        }

        let mut dist: BTreeMap<Grade, usize> = Grade::ALL.iter().map(|g| (*g, 0)).collect();
        for r in &records {
            if let Some(g) = r.grades.get(scale.name) {
                *dist.entry(*g).or_insert(0) += 1;
            }
        }
        agg.grade_distribution.insert(scale.name.to_string(), dist);
    }
    Some(agg)
}

fn eng(a: &FinalAnalytics) -> &LearningEngagement {
    &a.summary_metrics.learning_engagement
}

fn analyze_condition(sessions: &[&FinalAnalytics]) -> ConditionAnalysis {
    ConditionAnalysis {
        sessions: sessions.len(),
        total_session_time_minutes: stats_of(sessions, |a| {
            a.summary_metrics.total_session_time_minutes
        }),
        learning_phase_minutes: stats_of(sessions, learning_minutes),
        total_interactions: stats_of(sessions, |a| Some(eng(a).total_ai_interactions as f64)),
        slide_explanations_total: sessions.iter().map(|a| eng(a).slide_explanations).sum(),
        manual_chat_total: sessions.iter().map(|a| eng(a).manual_chat).sum(),
        slide_to_chat_ratio: stats_of(sessions, |a| eng(a).slide_to_chat_ratio),
        knowledge_accuracy_percentage: stats_of(sessions, |a| {
            a.summary_metrics
                .knowledge_test_summary
                .as_ref()
                .map(|k| k.accuracy_percentage)
        }),
        knowledge_correct_answers: stats_of(sessions, |a| {
            a.summary_metrics
                .knowledge_test_summary
                .as_ref()
                .map(|k| k.correct_answers as f64)
        }),
        interactions_per_minute: stats_of(sessions, |a| {
            a.summary_metrics
                .learning_efficiency
                .as_ref()
                .map(|e| e.interactions_per_minute)
        }),
        avg_time_per_interaction_seconds: stats_of(sessions, |a| {
            a.summary_metrics
                .learning_efficiency
                .as_ref()
                .and_then(|e| e.avg_time_per_interaction_seconds)
        }),
        ueq: ueq_aggregate(sessions),
    }
}

/// Compare already-loaded sessions by condition.
pub fn summarize(all: &[FinalAnalytics]) -> ResearchAnalysis {
    let mut conditions = BTreeMap::new();
    for condition in [Condition::Personalised, Condition::Generic] {
        let group: Vec<&FinalAnalytics> = all
            .iter()
            .filter(|a| a.session_info.condition == condition)
            .collect();
        if !group.is_empty() {
            conditions.insert(condition, analyze_condition(&group));
        }
    }

    let detailed_sessions = all
        .iter()
        .map(|a| DetailedSession {
            session_id: a.session_info.session_id.clone(),
            condition: a.session_info.condition,
            total_session_time_minutes: a.summary_metrics.total_session_time_minutes,
            learning_phase_minutes: learning_minutes(a),
            total_interactions: a.summary_metrics.learning_engagement.total_ai_interactions,
            knowledge_accuracy_percentage: a
                .summary_metrics
                .knowledge_test_summary
                .as_ref()
                .map(|k| k.accuracy_percentage),
            ueq_scale_means: a
                .ueq_results
                .as_ref()
                .map(|u| u.scale_means.clone())
                .unwrap_or_default(),
        })
        .collect();

    ResearchAnalysis {
        generated_at: Local::now().to_rfc3339(),
        total_sessions: all.len(),
        conditions,
        detailed_sessions,
    }
}

/// Load every session under `output_root` and build the comparison.
pub fn analyze(output_root: &Path) -> Result<ResearchAnalysis> {
    let all = load_all(output_root)?;
    tracing::info!(sessions = all.len(), "Analyzing research data");
    Ok(summarize(&all))
}

/// Write `research_analysis.json` into `output_root`.
pub fn write_report(output_root: &Path, analysis: &ResearchAnalysis) -> Result<PathBuf> {
    std::fs::create_dir_all(output_root)?;
    let path = output_root.join(REPORT_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(analysis)?)?;
    Ok(path)
}
