// src/survey/knowledge.rs — Knowledge test scoring
//
// The questions and answer key are study data (JSON or YAML), not code. Each
// question is single choice; a response is the text of the chosen option.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::infra::errors::{Result, StudyError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    /// Text of the correct option.
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeTest {
    #[serde(default)]
    pub title: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult {
    pub id: String,
    pub response: Option<String>,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub items: Vec<ItemResult>,
    pub score: u32,
    pub total: u32,
}

impl KnowledgeTest {
    /// Load an answer key from JSON, or YAML for `.yaml`/`.yml` files.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let test: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => serde_yml::from_str(&text).map_err(anyhow::Error::from)?,
            _ => serde_json::from_str(&text)?,
        };
        test.validate()?;
        Ok(test)
    }

    /// Every answer must be one of its question's options.
    pub fn validate(&self) -> Result<()> {
        for q in &self.questions {
            if !q.options.contains(&q.answer) {
                return Err(StudyError::InvalidAnswer {
                    item: q.id.clone(),
                    reason: "answer key is not one of the options".into(),
                });
            }
        }
        Ok(())
    }

    /// Score responses keyed by question id. Unanswered questions count as wrong;
    /// a response that is not one of the options is rejected.
    pub fn grade(&self, responses: &BTreeMap<String, String>) -> Result<QuizResult> {
        let mut items = Vec::with_capacity(self.questions.len());
        for q in &self.questions {
            let response = responses.get(&q.id).cloned();
            if let Some(r) = &response {
                if !q.options.contains(r) {
                    return Err(StudyError::InvalidAnswer {
                        item: q.id.clone(),
                        reason: format!("'{r}' is not an option"),
                    });
                }
            }
            let correct = response.as_deref() == Some(q.answer.as_str());
            items.push(ItemResult {
                id: q.id.clone(),
                response,
                correct,
            });
        }
        let score = items.iter().filter(|i| i.correct).count() as u32;
        Ok(QuizResult {
            total: items.len() as u32,
            score,
            items,
        })
    }
}

impl QuizResult {
    pub fn accuracy_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score as f64 / self.total as f64 * 100.0
    }

    /// Text saved to `knowledge_test/knowledge_test_results.txt`.
    pub fn summary(&self) -> String {
        let mut out = String::from("\nYour Responses:\n--------------------------------------\n");
        for (n, item) in self.items.iter().enumerate() {
            let mark = if item.correct { '✓' } else { '✗' };
            let response = item.response.as_deref().unwrap_or("(no answer)");
            out.push_str(&format!("{}. {response} {mark}\n", n + 1));
        }
        out.push_str(&format!("\nTotal Score: {}/{}\n", self.score, self.total));
        out
    }
}

/// Find `Total Score: n/m` in a saved results file.
pub fn parse_total_score(text: &str) -> Option<(u32, u32)> {
    text.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("Total Score:")?;
        let (n, m) = rest.trim().split_once('/')?;
        Some((n.trim().parse().ok()?, m.trim().parse().ok()?))
    })
}
