// src/cli/login.rs — Credential listing and session creation

use crate::auth::{Condition, CredentialTable};
use crate::infra::config::Config;
use crate::session::{list_session_dirs, PseudonymGenerator, SessionId, SessionManager};

pub async fn show_credentials(config: &Config) -> anyhow::Result<()> {
    let table = CredentialTable::from_config(&config.auth);
    println!("  {:<20} {:<13} {:<22} description", "username", "condition", "folder");
    for c in table.iter() {
        let mut tags = Vec::new();
        if c.flags.dev_mode {
            tags.push("dev");
        }
        if c.flags.fast_test_mode {
            tags.push("fast");
        }
        if c.flags.upload_enabled {
            tags.push("upload");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        println!(
            "  {:<20} {:<13} {:<22} {}{tags}",
            c.username, c.condition, c.data_folder, c.description
        );
    }
    Ok(())
}

fn prompt_text(label: &str) -> anyhow::Result<String> {
    match inquire::Text::new(label).prompt_skippable()? {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => anyhow::bail!("{label} is required"),
    }
}

fn prompt_password() -> anyhow::Result<String> {
    match inquire::Password::new("Password:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt_skippable()?
    {
        Some(p) if !p.is_empty() => Ok(p),
        _ => anyhow::bail!("Password is required"),
    }
}

/// A name generator that will not repeat any fake name already on disk.
pub fn generator_for(output_root: &std::path::Path) -> anyhow::Result<PseudonymGenerator> {
    let mut names = PseudonymGenerator::new();
    for dir in list_session_dirs(output_root)? {
        if let Some(id) = dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| SessionId::parse(n).ok())
        {
            names.reserve(id.fake_name());
        }
    }
    Ok(names)
}

pub async fn run_login(
    config: &Config,
    username: Option<String>,
    password: Option<String>,
    condition: Option<String>,
) -> anyhow::Result<()> {
    let table = CredentialTable::from_config(&config.auth);

    let username = match username {
        Some(u) => u,
        None => prompt_text("Username:")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    let credential = table.authenticate(&username, &password)?;
    let requested = condition.as_deref().map(str::parse::<Condition>).transpose()?;

    let output_root = config.output_dir();
    let mut manager = SessionManager::with_generator(&output_root, generator_for(&output_root)?);
    let session = manager.create_session(credential, requested)?;

    println!("Session:   {}", session.id());
    println!("Condition: {}", session.condition());
    println!("Directory: {}", session.dir().display());
    if credential.flags.fast_test_mode {
        println!("Mode:      fast test");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::DEFAULT_SALT;
    use tempfile::TempDir;

    #[test]
    fn test_generator_reserves_existing_names() {
        let tmp = TempDir::new().unwrap();
        let cred = CredentialTable::builtin(DEFAULT_SALT)
            .get("generic_g001")
            .cloned()
            .unwrap();
        let mut first = SessionManager::with_generator(tmp.path(), PseudonymGenerator::with_seed(1));
        let existing = first.create_session(&cred, None).unwrap();

        let names = generator_for(tmp.path()).unwrap();
        assert_eq!(names.issued(), 1);

        let mut second = SessionManager::with_generator(tmp.path(), names);
        let next = second.create_session(&cred, None).unwrap();
        assert_ne!(next.fake_name(), existing.fake_name());
    }
}
