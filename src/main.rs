// src/main.rs — studylab entry point

use clap::Parser;
use std::path::PathBuf;

use studylab::cli::{self, Cli, Commands};
use studylab::infra::config::Config;
use studylab::infra::{logger, paths};

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG / STUDYLAB_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml; setup may create it)
    let config_path = cli
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(paths::config_file_path);
    let may_be_missing = cli.config.is_none() || matches!(cli.command, Commands::Setup);
    let config = if config_path.exists() || !may_be_missing {
        Config::load_from(&config_path)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Setup => cli::setup::run_setup(&config, &config_path).await,
        Commands::Check { answer_key } => cli::setup::run_check(&config, &config_path, answer_key.as_ref()).await,
        Commands::Credentials => cli::login::show_credentials(&config).await,
        Commands::Login {
            username,
            password,
            condition,
        } => cli::login::run_login(&config, username, password, condition).await,
        Commands::Sessions { folder, json } => {
            cli::sessions::list_sessions(&config, folder.as_deref(), json).await
        }
        Commands::Record { session, action } => {
            let session = cli::open_session(&config, &session)?;
            cli::record::run_record(&session, action).await
        }
        Commands::Finish { session, no_upload } => {
            let session = cli::open_session(&config, &session)?;
            cli::upload::run_finish(&config, &session, no_upload).await
        }
        Commands::Analytics { session: Some(session) } => {
            let session = cli::open_session(&config, &session)?;
            cli::report::run_analytics(&session).await
        }
        Commands::Analytics { session: None } => cli::report::run_analytics_all(&config).await,
        Commands::Analyze { root, output } => cli::report::run_analyze(&config, root, output).await,
        Commands::UeqRecalc { files } => cli::report::run_ueq_recalc(&config, files).await,
        Commands::Upload { session, force } => {
            let session = cli::open_session(&config, &session)?;
            cli::upload::run_upload(&config, &session, force).await
        }
    }
}
