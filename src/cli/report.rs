// src/cli/report.rs — Analytics and UEQ maintenance commands

use std::path::PathBuf;

use crate::analytics::{aggregate, session as session_analytics};
use crate::infra::config::Config;
use crate::session::{list_session_dirs, Session, UEQ_DIR};
use crate::session::artifacts::UEQ_RESPONSES;
use crate::survey::ueq;

pub async fn run_analytics(session: &Session) -> anyhow::Result<()> {
    let path = session_analytics::generate(session.dir())?;
    println!("Wrote {}", path.display());
    Ok(())
}

pub async fn run_analytics_all(config: &Config) -> anyhow::Result<()> {
    let root = config.output_dir();
    let report = session_analytics::generate_all(&root)?;
    if report.written.is_empty() && report.failed.is_empty() {
        println!("No sessions under {}", root.display());
        return Ok(());
    }

    for (condition, count) in &report.per_condition {
        println!("  {condition:<13} {count} session(s)");
    }
    println!("Wrote {} analytics file(s)", report.written.len());

    if !report.is_success() {
        for (dir, reason) in &report.failed {
            eprintln!("  failed: {} ({reason})", dir.display());
        }
        anyhow::bail!("{} session(s) failed", report.failed.len());
    }
    Ok(())
}

pub async fn run_analyze(
    config: &Config,
    root: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let root = root.unwrap_or_else(|| config.output_dir());
    let analysis = aggregate::analyze(&root)?;
    if analysis.total_sessions == 0 {
        anyhow::bail!("No session analytics found under {}", root.display());
    }

    println!("Sessions analyzed: {}", analysis.total_sessions);
    for (condition, stats) in &analysis.conditions {
        println!();
        println!("  {condition} ({} sessions)", stats.sessions);
        if let Some(s) = &stats.total_session_time_minutes {
            println!("    Session time:   {:.1} min (sd {:.1})", s.mean, s.std_dev);
        }
        if let Some(s) = &stats.total_interactions {
            println!("    Interactions:   {:.1} (sd {:.1})", s.mean, s.std_dev);
        }
        if let Some(s) = &stats.knowledge_accuracy_percentage {
            println!("    Quiz accuracy:  {:.1}% (sd {:.1})", s.mean, s.std_dev);
        }
    }

    let out_dir = output.unwrap_or(root);
    let path = aggregate::write_report(&out_dir, &analysis)?;
    println!();
    println!("Wrote {}", path.display());
    Ok(())
}

pub async fn run_ueq_recalc(config: &Config, files: Vec<PathBuf>) -> anyhow::Result<()> {
    let files = if files.is_empty() {
        list_session_dirs(&config.output_dir())?
            .into_iter()
            .map(|d| d.join(UEQ_DIR).join(UEQ_RESPONSES))
            .filter(|p| p.exists())
            .collect()
    } else {
        files
    };

    let mut failed = 0usize;
    for file in &files {
        match ueq::recalc_file(file) {
            Ok(out) => println!("  fixed  {}", out.display()),
            Err(e) => {
                failed += 1;
                eprintln!("  failed {}: {e}", file.display());
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} UEQ file(s) could not be recalculated", files.len());
    }
    Ok(())
}
