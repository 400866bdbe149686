// src/cli/record.rs — Store artifacts produced by the study UI

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use super::RecordAction;
use crate::learning_log::LearningLogger;
use crate::session::Session;
use crate::survey::knowledge::KnowledgeTest;
use crate::survey::ueq;
use crate::timer::PageTimer;

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}

pub async fn run_record(session: &Session, action: RecordAction) -> anyhow::Result<()> {
    match action {
        RecordAction::Profile { file } => {
            let profile: Map<String, Value> = read_json(&file)?;
            let path = session.save_profile(&profile)?;
            println!("Saved profile: {}", path.display());
        }
        RecordAction::Quiz { key, responses } => {
            let test = KnowledgeTest::load(&key)?;
            let responses: BTreeMap<String, String> = read_json(&responses)?;
            let result = test.grade(&responses)?;
            let path = session.save_knowledge_test_results(&result.summary())?;
            println!(
                "Score {}/{} ({:.1}%): {}",
                result.score,
                result.total,
                result.accuracy_percentage(),
                path.display()
            );
        }
        RecordAction::Ueq { answers, comment } => {
            let answers: BTreeMap<String, u8> = read_json(&answers)?;
            let evaluation = ueq::evaluate(&answers)?;
            let path = session.save_ueq(&answers, &evaluation, comment.as_deref())?;
            for (scale, mean) in &evaluation.means {
                let grade = evaluation.grades.get(scale).map(|g| g.as_str()).unwrap_or("");
                println!("  {scale:<15} {mean:>6.2}  {grade}");
            }
            println!("Saved UEQ: {}", path.display());
        }
        RecordAction::Log {
            interaction_type,
            input,
            response,
        } => {
            // Structured input (e.g. a profile context) is kept as JSON.
            let input = serde_json::from_str::<Value>(&input).unwrap_or(Value::String(input));
            let mut logger = LearningLogger::new(session);
            logger.log_interaction(&interaction_type, input, &response, None);
            if let Some(path) = logger.save_logs(false)? {
                println!("Logged: {}", path.display());
            }
        }
        RecordAction::Page { name } => {
            let mut timer = PageTimer::load(session.dir())?;
            timer.start(&name);
            timer.save(session.dir())?;
            tracing::debug!(session = %session.id(), page = %name, "Page entered");
        }
    }
    Ok(())
}
