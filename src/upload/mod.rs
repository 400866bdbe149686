// src/upload/mod.rs — Copy a finished session to cloud object storage

pub mod supabase;

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::infra::errors::{Result, StudyError};
use crate::session::Session;

pub use supabase::SupabaseStore;

/// Object storage backend. Paths use `/` separators.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn name(&self) -> &str;

    /// Verify that the backend and its bucket are reachable.
    async fn check(&self) -> Result<()>;

    /// Create or overwrite one object.
    async fn put(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UploadReport {
    pub session_id: String,
    pub uploaded: Vec<String>,
    /// (relative path, reason)
    pub skipped: Vec<(String, String)>,
    pub failed: Vec<(String, String)>,
}

impl UploadReport {
    pub fn is_success(&self) -> bool {
        !self.uploaded.is_empty() && self.failed.is_empty()
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Regular files under `dir`, sorted.
fn session_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("**").join("*");
    let entries =
        glob::glob(&pattern.to_string_lossy()).map_err(|e| StudyError::Config(e.to_string()))?;
    let mut files: Vec<PathBuf> = entries.filter_map(|p| p.ok()).filter(|p| p.is_file()).collect();
    files.sort();
    Ok(files)
}

fn object_path(session_id: &str, relative: &Path) -> String {
    let rel: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("sessions/{session_id}/{}", rel.join("/"))
}

/// Upload every file of a session to `sessions/<session_id>/<relative path>`.
///
/// Refused with `UploadDisabled` when the session's credential does not
/// enable upload, unless `force` is set. Files over `max_file_bytes` are
/// skipped; per-file failures are collected rather than aborting.
pub async fn upload_session(
    store: &dyn ObjectStore,
    session: &Session,
    max_file_bytes: u64,
    force: bool,
) -> Result<UploadReport> {
    if !session.flags().upload_enabled && !force {
        return Err(StudyError::UploadDisabled);
    }
    store.check().await?;

    let session_id = session.id().to_string();
    let mut report = UploadReport {
        session_id: session_id.clone(),
        ..Default::default()
    };

    for file in session_files(session.dir())? {
        let relative = file.strip_prefix(session.dir()).unwrap_or(&file);
        let rel_display = relative.display().to_string();

        let size = std::fs::metadata(&file)?.len();
        if size > max_file_bytes {
            tracing::warn!(file = %rel_display, size, "Skipping oversized file");
            report
                .skipped
                .push((rel_display, format!("{size} bytes exceeds {max_file_bytes}")));
            continue;
        }

        let body = match std::fs::read(&file) {
            Ok(b) => b,
            Err(e) => {
                report.failed.push((rel_display, format!("read error: {e}")));
                continue;
            }
        };

        let target = object_path(&session_id, relative);
        match store.put(&target, body, content_type_for(&file)).await {
            Ok(()) => {
                tracing::debug!(object = %target, "Uploaded");
                report.uploaded.push(rel_display);
            }
            Err(e) => {
                tracing::warn!(object = %target, "Upload failed: {e}");
                report.failed.push((rel_display, e.to_string()));
            }
        }
    }

    tracing::info!(
        store = store.name(),
        session = %session_id,
        uploaded = report.uploaded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Session upload finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialTable;
    use crate::infra::config::DEFAULT_SALT;
    use crate::session::{PseudonymGenerator, SessionManager, PROFILE_DIR};
    use serde_json::{json, Map};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
        reject: Option<String>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        fn name(&self) -> &str {
            "memory"
        }

        async fn check(&self) -> Result<()> {
            Ok(())
        }

        async fn put(&self, path: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
            if self.reject.as_deref().is_some_and(|r| path.ends_with(r)) {
                return Err(StudyError::Storage {
                    path: path.into(),
                    message: "rejected".into(),
                });
            }
            self.objects
                .lock()
                .unwrap()
                .insert(path.into(), (body, content_type.into()));
            Ok(())
        }
    }

    fn session(tmp: &TempDir, username: &str) -> Session {
        let cred = CredentialTable::builtin(DEFAULT_SALT)
            .get(username)
            .cloned()
            .unwrap();
        let s = SessionManager::with_generator(tmp.path(), PseudonymGenerator::with_seed(5))
            .create_session(&cred, None)
            .unwrap();
        let mut profile = Map::new();
        profile.insert("Name".into(), json!("Jane"));
        s.save_profile(&profile).unwrap();
        s
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("a/b.json")), "application/json");
        assert_eq!(content_type_for(Path::new("a/b.TXT")), "text/plain");
        assert_eq!(content_type_for(Path::new("a/b.png")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_disabled_credential_refused() {
        let tmp = TempDir::new().unwrap();
        let s = session(&tmp, "generic_g001");
        let store = MemoryStore::default();
        let err = upload_session(&store, &s, u64::MAX, false).await.unwrap_err();
        assert!(matches!(err, StudyError::UploadDisabled));
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_force_uploads_every_file() {
        let tmp = TempDir::new().unwrap();
        let s = session(&tmp, "generic_g001");
        let store = MemoryStore::default();
        let report = upload_session(&store, &s, u64::MAX, true).await.unwrap();
        assert!(report.is_success());

        let objects = store.objects.lock().unwrap();
        let key = format!("sessions/{}/{PROFILE_DIR}/pseudonymized_profile.json", s.id());
        let (_, ct) = &objects[&key];
        assert_eq!(ct, "application/json");
        assert!(objects.keys().any(|k| k.ends_with("meta/session.json")));
        assert_eq!(objects.len(), report.uploaded.len());
    }

    #[tokio::test]
    async fn test_oversized_and_failed_files_reported() {
        let tmp = TempDir::new().unwrap();
        let s = session(&tmp, "generic_g001");
        std::fs::write(s.dir().join("big.bin"), vec![0u8; 64]).unwrap();

        let store = MemoryStore {
            reject: Some("condition.txt".into()),
            ..Default::default()
        };
        let report = upload_session(&store, &s, 32, true).await.unwrap();
        assert!(report.skipped.iter().any(|(p, _)| p == "big.bin"));
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_success());
    }
}
