// src/cli/upload.rs — Session completion and cloud upload

use crate::analytics::session as session_analytics;
use crate::infra::config::Config;
use crate::session::Session;
use crate::timer::PageTimer;
use crate::upload::{upload_session, SupabaseStore, UploadReport};

async fn upload(config: &Config, session: &Session, force: bool) -> anyhow::Result<UploadReport> {
    let Some(cfg) = &config.upload else {
        anyhow::bail!("No [upload] section in config");
    };
    let store = SupabaseStore::from_config(cfg)?;
    Ok(upload_session(&store, session, cfg.max_file_bytes, force).await?)
}

fn print_report(report: &UploadReport) {
    println!(
        "Uploaded {} file(s), skipped {}, failed {}",
        report.uploaded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for (path, reason) in report.skipped.iter().chain(&report.failed) {
        println!("  {path}: {reason}");
    }
}

pub async fn run_upload(config: &Config, session: &Session, force: bool) -> anyhow::Result<()> {
    let report = upload(config, session, force).await?;
    print_report(&report);
    if !report.failed.is_empty() {
        anyhow::bail!("{} file(s) failed to upload", report.failed.len());
    }
    Ok(())
}

/// End of a participant's session: close page timing, write analytics,
/// then upload when the credential allows it.
pub async fn run_finish(config: &Config, session: &Session, no_upload: bool) -> anyhow::Result<()> {
    let mut timer = PageTimer::load(session.dir())?;
    if let Some(path) = timer.dump(session.dir())? {
        println!("Page durations: {}", path.display());
    }
    timer.save(session.dir())?;

    let analytics = session_analytics::generate(session.dir())?;
    println!("Analytics: {}", analytics.display());

    if no_upload || !session.flags().upload_enabled {
        return Ok(());
    }
    if config.upload.is_none() {
        tracing::warn!(session = %session.id(), "Upload enabled but no [upload] config; skipping");
        return Ok(());
    }
    run_upload(config, session, false).await
}
