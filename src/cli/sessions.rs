// src/cli/sessions.rs — Session listing

use serde::Serialize;

use crate::infra::config::Config;
use crate::analytics::session::ANALYTICS_FILE;
use crate::session::{list_session_dirs, SessionManager, ANALYTICS_DIR};

#[derive(Debug, Serialize)]
struct SessionRow {
    session_id: String,
    condition: String,
    data_folder: String,
    analytics: bool,
    path: String,
}

pub async fn list_sessions(config: &Config, folder: Option<&str>, json: bool) -> anyhow::Result<()> {
    let root = config.output_dir();
    let mut rows = Vec::new();
    for dir in list_session_dirs(&root)? {
        let session = match SessionManager::open_session(&dir) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "Skipping session: {e}");
                continue;
            }
        };
        if folder.is_some_and(|f| f != session.record().data_folder) {
            continue;
        }
        rows.push(SessionRow {
            session_id: session.id().to_string(),
            condition: session.condition().to_string(),
            data_folder: session.record().data_folder.clone(),
            analytics: dir.join(ANALYTICS_DIR).join(ANALYTICS_FILE).is_file(),
            path: dir.display().to_string(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No sessions under {}", root.display());
        return Ok(());
    }
    for r in &rows {
        let mark = if r.analytics { "analytics" } else { "" };
        println!(
            "  {:<40} {:<13} {:<22} {mark}",
            r.session_id, r.condition, r.data_folder
        );
    }
    println!();
    println!("{} session(s)", rows.len());
    Ok(())
}
