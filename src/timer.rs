// src/timer.rs — Per-page dwell time tracking
//
// The running state is kept in `meta/page_timer.json` so that separate
// invocations can time one session; `dump` writes the final
// `meta/page_durations.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::infra::errors::Result;
use crate::session::META_DIR;

pub const STATE_FILE: &str = "page_timer.json";
pub const DURATIONS_FILE: &str = "page_durations.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageTimer {
    current_page: Option<String>,
    entered_at: Option<DateTime<Utc>>,
    /// Seconds per page for pages already left.
    durations: BTreeMap<String, f64>,
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds().max(0)) as f64 / 1000.0
}

impl PageTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_page(&self) -> Option<&str> {
        self.current_page.as_deref()
    }

    /// A page became active.
    pub fn start(&mut self, page: &str) {
        self.start_at(page, Utc::now());
    }

    pub fn start_at(&mut self, page: &str, now: DateTime<Utc>) {
        self.stop_at(now);
        self.current_page = Some(page.to_string());
        self.entered_at = Some(now);
    }

    /// Close the running page, if any.
    pub fn stop_at(&mut self, now: DateTime<Utc>) {
        if let (Some(page), Some(since)) = (self.current_page.take(), self.entered_at.take()) {
            *self.durations.entry(page).or_insert(0.0) += seconds_between(since, now);
        }
    }

    /// Durations in seconds, including the page still running.
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> BTreeMap<String, f64> {
        let mut out = self.durations.clone();
        if let (Some(page), Some(since)) = (&self.current_page, self.entered_at) {
            *out.entry(page.clone()).or_insert(0.0) += seconds_between(since, now);
        }
        out
    }

    /// Stop the running page and write `meta/page_durations.json`.
    /// Returns `None` when nothing was ever timed.
    pub fn dump(&mut self, session_dir: &Path) -> Result<Option<PathBuf>> {
        self.dump_at(session_dir, Utc::now())
    }

    pub fn dump_at(&mut self, session_dir: &Path, now: DateTime<Utc>) -> Result<Option<PathBuf>> {
        self.stop_at(now);
        if self.durations.is_empty() {
            return Ok(None);
        }
        let meta = session_dir.join(META_DIR);
        std::fs::create_dir_all(&meta)?;
        let path = meta.join(DURATIONS_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&self.durations)?)?;
        Ok(Some(path))
    }

    /// Load persisted state, or a fresh timer.
    pub fn load(session_dir: &Path) -> Result<Self> {
        let path = session_dir.join(META_DIR).join(STATE_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }

    pub fn save(&self, session_dir: &Path) -> Result<()> {
        let meta = session_dir.join(META_DIR);
        std::fs::create_dir_all(&meta)?;
        std::fs::write(meta.join(STATE_FILE), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Read `meta/page_durations.json` if present.
pub fn read_durations(session_dir: &Path) -> Result<Option<BTreeMap<String, f64>>> {
    let path = session_dir.join(META_DIR).join(DURATIONS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&std::fs::read_to_string(path)?)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-04-23T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_switching_pages_accumulates() {
        let mut timer = PageTimer::new();
        timer.start_at("home", t0());
        timer.start_at("profile", t0() + Duration::seconds(30));
        timer.start_at("home", t0() + Duration::seconds(90));
        timer.stop_at(t0() + Duration::seconds(100));

        let snap = timer.snapshot_at(t0() + Duration::seconds(500));
        assert_eq!(snap["home"], 40.0);
        assert_eq!(snap["profile"], 60.0);
        assert!(timer.current_page().is_none());
    }

    #[test]
    fn test_snapshot_includes_running_page() {
        let mut timer = PageTimer::new();
        timer.start_at("learning", t0());
        let snap = timer.snapshot_at(t0() + Duration::milliseconds(2500));
        assert_eq!(snap["learning"], 2.5);
        // Snapshot does not stop the clock.
        assert_eq!(timer.current_page(), Some("learning"));
    }

    #[test]
    fn test_dump_nothing_timed() {
        let tmp = TempDir::new().unwrap();
        let mut timer = PageTimer::new();
        assert!(timer.dump(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_dump_writes_durations() {
        let tmp = TempDir::new().unwrap();
        let mut timer = PageTimer::new();
        timer.start_at("ueq", t0());
        let path = timer
            .dump_at(tmp.path(), t0() + Duration::seconds(12))
            .unwrap()
            .unwrap();
        assert!(path.ends_with("meta/page_durations.json"));

        let read = read_durations(tmp.path()).unwrap().unwrap();
        assert_eq!(read["ueq"], 12.0);
    }

    #[test]
    fn test_state_persists() {
        let tmp = TempDir::new().unwrap();
        let mut timer = PageTimer::new();
        timer.start_at("knowledge_test", t0());
        timer.save(tmp.path()).unwrap();

        let loaded = PageTimer::load(tmp.path()).unwrap();
        assert_eq!(loaded, timer);
        assert_eq!(PageTimer::load(&tmp.path().join("none")).unwrap(), PageTimer::new());
    }

    #[test]
    fn test_clock_going_backwards_clamps_to_zero() {
        let mut timer = PageTimer::new();
        timer.start_at("home", t0());
        timer.stop_at(t0() - Duration::seconds(5));
        assert_eq!(timer.snapshot_at(t0())["home"], 0.0);
    }
}
