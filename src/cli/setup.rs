// src/cli/setup.rs — First-time setup and prerequisite check

use std::path::{Path, PathBuf};

use crate::auth::CredentialTable;
use crate::infra::config::Config;
use crate::infra::paths;
use crate::session::list_session_dirs;
use crate::survey::knowledge::KnowledgeTest;

/// Write `Config::default()` to `path` unless a file is already there.
/// Returns whether a file was written.
pub async fn write_default_config(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, toml::to_string_pretty(&Config::default())?).await?;
    Ok(true)
}

/// Create directories and write a default config to `config_path` if none exists.
pub async fn run_setup(config: &Config, config_path: &Path) -> anyhow::Result<()> {
    println!("studylab setup");
    println!();

    let output = config.output_dir();
    eprint!("  Creating directories... ");
    paths::ensure_dirs(&output)?;
    eprintln!("done");

    if write_default_config(config_path).await? {
        println!("  Config: {} (written)", config_path.display());
    } else {
        println!("  Config: {} (already exists)", config_path.display());
    }

    println!("  Output: {}", output.display());
    println!();
    println!("Setup complete!");
    println!();
    println!("Tips:");
    println!("  studylab check                     Verify prerequisites");
    println!("  studylab credentials               Show login names");
    println!("  studylab login -u <username>       Start a session");
    Ok(())
}

/// One line of the check report.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckItem {
    pub label: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckItem {
    fn new(label: &str, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            ok,
            detail: detail.into(),
        }
    }
}

fn check_output_dir(dir: &Path) -> CheckItem {
    match std::fs::metadata(dir) {
        Ok(m) if !m.is_dir() => CheckItem::new("Output", false, "not a directory"),
        Ok(m) if m.permissions().readonly() => CheckItem::new("Output", false, "read-only"),
        Ok(_) => {
            let n = list_session_dirs(dir).map(|d| d.len()).unwrap_or(0);
            CheckItem::new("Output", true, format!("{} ({n} sessions)", dir.display()))
        }
        Err(_) => CheckItem::new(
            "Output",
            false,
            format!("{} missing (run `studylab setup`)", dir.display()),
        ),
    }
}

/// Evaluate every prerequisite without printing.
pub fn collect_checks(
    config: &Config,
    config_path: &Path,
    answer_key: Option<&PathBuf>,
) -> Vec<CheckItem> {
    let mut items = Vec::new();

    items.push(CheckItem::new(
        "Config",
        true,
        if config_path.exists() {
            format!("{} (loaded)", config_path.display())
        } else {
            "(using defaults)".to_string()
        },
    ));

    let table = CredentialTable::from_config(&config.auth);
    items.push(CheckItem::new(
        "Credentials",
        !table.is_empty(),
        format!("{} configured", table.len()),
    ));

    items.push(check_output_dir(&config.output_dir()));

    if let Some(upload) = &config.upload {
        let key_set = std::env::var_os(&upload.service_key_env).is_some();
        items.push(CheckItem::new(
            "Upload",
            key_set,
            if key_set {
                format!("{} bucket '{}'", upload.url, upload.bucket)
            } else {
                format!("{} is not set", upload.service_key_env)
            },
        ));
    }

    if let Some(key) = answer_key {
        items.push(match KnowledgeTest::load(key) {
            Ok(t) => CheckItem::new(
                "Answer key",
                true,
                format!("{} questions", t.questions.len()),
            ),
            Err(e) => CheckItem::new("Answer key", false, e.to_string()),
        });
    }

    items
}

pub async fn run_check(
    config: &Config,
    config_path: &Path,
    answer_key: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let items = collect_checks(config, config_path, answer_key);
    for item in &items {
        let mark = if item.ok { "ok" } else { "MISSING" };
        println!("  {:<12} {:<8} {}", item.label, mark, item.detail);
    }

    let missing = items.iter().filter(|i| !i.ok).count();
    if missing > 0 {
        anyhow::bail!("{missing} prerequisite(s) missing");
    }
    println!();
    println!("All prerequisites present.");
    Ok(())
}
