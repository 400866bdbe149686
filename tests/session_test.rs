// tests/session_test.rs — Integration test: session creation and reopening

use chrono::{Local, TimeZone};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use tempfile::TempDir;

use studylab::auth::{Condition, CredentialTable};
use studylab::infra::config::DEFAULT_SALT;
use studylab::session::{
    list_session_dirs, PseudonymGenerator, SessionId, SessionManager, CONDITION_FILE,
    SESSION_SUBDIRS,
};

fn table() -> CredentialTable {
    CredentialTable::builtin(DEFAULT_SALT)
}

#[test]
fn test_login_to_session_flow() {
    let tmp = TempDir::new().unwrap();
    let table = table();
    let cred = table
        .authenticate("personalised_p001", "PersonalisedCohort2025!")
        .unwrap();

    let mut manager = SessionManager::new(tmp.path());
    let session = manager
        .create_session(cred, None)
        .unwrap();

    assert!(session.dir().starts_with(tmp.path().join("personalised_cohort")));
    for sub in SESSION_SUBDIRS {
        assert!(session.dir().join(sub).is_dir(), "{sub}");
    }
    assert_eq!(
        std::fs::read_to_string(session.dir().join(CONDITION_FILE))
            .unwrap()
            .trim(),
        "personalised"
    );

    let info = session.info();
    assert_eq!(info.condition, Condition::Personalised);
    assert_eq!(info.session_id, format!("{}_{}", info.timestamp, info.fake_name));
}

#[test]
fn test_many_sessions_in_one_second_are_distinct() {
    let tmp = TempDir::new().unwrap();
    let cred = table().get("generic_g002").cloned().unwrap();
    let now = Local.with_ymd_and_hms(2025, 5, 2, 14, 0, 0).unwrap();

    let mut manager = SessionManager::with_generator(tmp.path(), PseudonymGenerator::with_seed(99));
    let mut names = HashSet::new();
    for _ in 0..40 {
        let s = manager.create_session_at(&cred, None, now).unwrap();
        assert_eq!(s.id().timestamp_str(), "20250502_140000");
        assert!(names.insert(s.fake_name().to_string()));
    }
    assert_eq!(list_session_dirs(tmp.path()).unwrap().len(), 40);
}

#[test]
fn test_reopen_matches_created() {
    let tmp = TempDir::new().unwrap();
    let cred = table().get("dev_fast_test").cloned().unwrap();
    let mut manager = SessionManager::new(tmp.path());
    let created = manager.create_session(&cred, Some(Condition::Generic)).unwrap();

    let dir = SessionManager::locate(tmp.path(), &created.id().to_string()).unwrap();
    let reopened = SessionManager::open_session(&dir).unwrap();
    assert_eq!(reopened.record(), created.record());
    assert!(reopened.flags().fast_test_mode);
    assert_eq!(reopened.condition(), Condition::Generic);
}

#[test]
fn test_session_id_parsing() {
    let id = SessionId::parse("20250423_083412_Casey_Nguyen").unwrap();
    assert_eq!(id.fake_name(), "Casey_Nguyen");
    assert_eq!(id.timestamp_str(), "20250423_083412");
    assert_eq!(id.to_string(), "20250423_083412_Casey_Nguyen");

    assert!(SessionId::parse("not_a_session").is_err());
    assert!(SessionId::parse("20251399_083412_A_B").is_err());
}

#[test]
fn test_unknown_session_not_found() {
    let tmp = TempDir::new().unwrap();
    assert!(SessionManager::locate(tmp.path(), "20250423_083412_Alex_Kim").is_err());
}
