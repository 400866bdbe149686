// src/cli/mod.rs — CLI definition (clap derive)

pub mod login;
pub mod record;
pub mod report;
pub mod sessions;
pub mod setup;
pub mod upload;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::infra::config::Config;
use crate::session::{Session, SessionManager};

#[derive(Parser)]
#[command(
    name = "studylab",
    about = "Session and pseudonymization toolkit for a tutoring study",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the output directory and a default config file
    Setup,
    /// Verify prerequisites; exits non-zero when something is missing
    Check {
        /// Knowledge test answer key that sessions will be graded against
        #[arg(long)]
        answer_key: Option<PathBuf>,
    },
    /// List the usernames participants can log in with
    Credentials,
    /// Authenticate and create a new session directory
    Login {
        #[arg(short, long)]
        username: Option<String>,
        /// Read interactively when omitted
        #[arg(short, long)]
        password: Option<String>,
        /// Condition override (dev-mode credentials only)
        #[arg(long)]
        condition: Option<String>,
    },
    /// List sessions under the output directory
    Sessions {
        /// Only sessions in this data folder
        #[arg(long)]
        folder: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Store one artifact in a session
    Record {
        /// Session id or directory
        #[arg(short, long)]
        session: String,
        #[command(subcommand)]
        action: RecordAction,
    },
    /// Stop page timing, write analytics, and upload if enabled
    Finish {
        #[arg(short, long)]
        session: String,
        #[arg(long)]
        no_upload: bool,
    },
    /// Write analytics/final_research_analytics.json (every session if none given)
    Analytics {
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Compare all sessions by condition
    Analyze {
        /// Output root to scan (defaults to the configured one)
        #[arg(long)]
        root: Option<PathBuf>,
        /// Where to write research_analysis.json (defaults to the root)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Recompute scale means and grades of saved UEQ files
    UeqRecalc {
        /// Files to fix; all ueq_responses.txt under the output root if omitted
        files: Vec<PathBuf>,
    },
    /// Upload a session to cloud storage
    Upload {
        #[arg(short, long)]
        session: String,
        /// Upload even if the credential does not enable it
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum RecordAction {
    /// Participant profile (JSON object)
    Profile { file: PathBuf },
    /// Grade knowledge test responses against an answer key
    Quiz {
        #[arg(long)]
        key: PathBuf,
        /// JSON object: question id → chosen option
        #[arg(long)]
        responses: PathBuf,
    },
    /// UEQ answers (JSON object q1..q26 → 1..7)
    Ueq {
        answers: PathBuf,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Append one tutoring interaction to the learning log
    Log {
        #[arg(long = "type")]
        interaction_type: String,
        #[arg(long)]
        input: String,
        #[arg(long)]
        response: String,
    },
    /// Mark a page as entered (closes the previous one)
    Page { name: String },
}

/// Resolve a session id or path against the configured output root and open it.
pub fn open_session(config: &Config, id_or_path: &str) -> anyhow::Result<Session> {
    let dir = SessionManager::locate(&config.output_dir(), id_or_path)?;
    Ok(SessionManager::open_session(&dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_quiz() {
        let cli = Cli::try_parse_from([
            "studylab",
            "record",
            "--session",
            "20250423_083412_Alex_Kim",
            "quiz",
            "--key",
            "key.json",
            "--responses",
            "r.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Record {
                session,
                action: RecordAction::Quiz { key, .. },
            } => {
                assert_eq!(session, "20250423_083412_Alex_Kim");
                assert_eq!(key, PathBuf::from("key.json"));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_analytics_session_optional() {
        let cli = Cli::try_parse_from(["studylab", "analytics"]).unwrap();
        assert!(matches!(cli.command, Commands::Analytics { session: None }));

        let cli = Cli::try_parse_from(["studylab", "analytics", "-s", "x"]).unwrap();
        assert!(matches!(cli.command, Commands::Analytics { session: Some(s) } if s == "x"));
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["studylab", "sessions", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("c.toml"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["studylab"]).is_err());
    }
}
