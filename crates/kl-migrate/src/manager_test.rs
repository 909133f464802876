use super::*;
use kl_core::{ScriptRoot, Substitutions};
use kl_db::{DbResult, DuckDbSession, SqliteSession};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir_all(&migrations).unwrap();
    for (name, content) in files {
        fs::write(migrations.join(name), content).unwrap();
    }
    dir
}

fn manager(root: &Path) -> MigrationManager {
    let resolver = MigrationResolver::new(vec![ScriptRoot::Directory(root.to_path_buf())], "migrations");
    MigrationManager::new(resolver, MigratorOptions::default())
}

fn ledger_versions(session: &mut dyn Session) -> Vec<String> {
    session
        .query_text("SELECT version FROM schema_version ORDER BY version", 1)
        .unwrap()
        .into_iter()
        .map(|row| row[0].clone().unwrap())
        .collect()
}

const CREATE_BOOKS: &str = "CREATE TABLE books (id INTEGER PRIMARY KEY, title VARCHAR);";
const SEED_BOOKS: &str = "INSERT INTO books VALUES (1, 'Dune');\nINSERT INTO books VALUES (2, 'Emma');";
const BAD_SEED: &str = "INSERT INTO books VALUES (3, 'Ulysses');\nINSERT INTO no_such_table VALUES (1);";

/// Records every call; answers queries from canned values.
#[derive(Default)]
struct RecordingSession {
    url: String,
    backend: Option<Dialect>,
    calls: Rc<RefCell<Vec<String>>>,
    fail_on: Option<&'static str>,
}

impl RecordingSession {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }
}

impl Session for RecordingSession {
    fn url(&self) -> &str {
        &self.url
    }
    fn backend(&self) -> Option<Dialect> {
        self.backend
    }
    fn execute(&mut self, sql: &str) -> DbResult<()> {
        self.calls.borrow_mut().push(sql.to_string());
        match self.fail_on {
            Some(marker) if sql.contains(marker) => {
                Err(DbError::ExecutionError(format!("refused: {sql}")))
            }
            _ => Ok(()),
        }
    }
    fn query_count(&mut self, sql: &str) -> DbResult<i64> {
        self.calls.borrow_mut().push(sql.to_string());
        Ok(0)
    }
    fn query_text(&mut self, sql: &str, _columns: usize) -> DbResult<Vec<Vec<Option<String>>>> {
        self.calls.borrow_mut().push(sql.to_string());
        Ok(Vec::new())
    }
}

/// Collects observer events as strings.
#[derive(Clone, Default)]
struct RecordingObserver(Rc<RefCell<Vec<String>>>);

impl MigrationObserver for RecordingObserver {
    fn on_ledger_created(&mut self, table: &str) {
        self.0.borrow_mut().push(format!("ledger:{table}"));
    }
    fn on_pending(&mut self, count: usize) {
        self.0.borrow_mut().push(format!("pending:{count}"));
    }
    fn on_no_pending(&mut self) {
        self.0.borrow_mut().push("none".to_string());
    }
    fn on_migration_start(&mut self, migration: &Migration) {
        self.0.borrow_mut().push(format!("start:{}", migration.version()));
    }
    fn on_migration_complete(&mut self, migration: &Migration, _duration: Duration) {
        self.0.borrow_mut().push(format!("done:{}", migration.version()));
    }
    fn on_migration_failed(&mut self, migration: &Migration, _error: &MigrateError) {
        self.0.borrow_mut().push(format!("failed:{}", migration.version()));
    }
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn test_scenario_a_applies_all_in_order() {
    let dir = project(&[
        ("002_seed_books.sql", SEED_BOOKS),
        ("001_create_books.sql", CREATE_BOOKS),
    ]);
    let events = RecordingObserver::default();
    let mut mgr = manager(dir.path()).with_observer(Box::new(events.clone()));
    let mut session = DuckDbSession::in_memory().unwrap();

    let report = mgr.migrate(&mut session).unwrap();

    assert!(matches!(report.outcome, RunOutcome::Completed));
    assert_eq!(report.summary(), "2 migrations applied");
    assert_eq!(ledger_versions(&mut session), ["001", "002"]);
    assert_eq!(session.query_count("SELECT COUNT(*) FROM books").unwrap(), 2);
    assert_eq!(mgr.state(), &RunState::Completed);
    assert_eq!(
        *events.0.borrow(),
        [
            "ledger:schema_version",
            "pending:2",
            "start:001",
            "done:001",
            "start:002",
            "done:002"
        ]
    );
}

#[test]
fn test_scenario_b_aborts_and_keeps_earlier_migration() {
    let dir = project(&[
        ("001_create_books.sql", CREATE_BOOKS),
        ("002_bad.sql", BAD_SEED),
    ]);
    let mut mgr = manager(dir.path());
    let mut session = DuckDbSession::in_memory().unwrap();

    let report = mgr.migrate(&mut session).unwrap();

    assert_eq!(report.applied_count(), 1);
    match &report.outcome {
        RunOutcome::Aborted { version, name, error } => {
            assert_eq!(version.as_str(), "002");
            assert_eq!(name, "bad");
            assert!(error.to_string().contains("no_such_table"), "{error}");
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(
        mgr.state(),
        &RunState::Aborted {
            version: Version::parse("2").unwrap()
        }
    );
    assert_eq!(ledger_versions(&mut session), ["001"]);
    // The first statement of 002 was rolled back with the rest of it.
    assert_eq!(session.query_count("SELECT COUNT(*) FROM books").unwrap(), 0);

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, MigrateError::Apply { ref version, .. } if version == "002"));
}

#[test]
fn test_scenario_c_rerun_after_fix_applies_only_fixed_migration() {
    let dir = project(&[
        ("001_create_books.sql", CREATE_BOOKS),
        ("002_bad.sql", BAD_SEED),
    ]);
    let mut session = DuckDbSession::in_memory().unwrap();
    let first = manager(dir.path()).migrate(&mut session).unwrap();
    assert!(!first.is_success());

    fs::write(dir.path().join("migrations/002_bad.sql"), SEED_BOOKS).unwrap();
    let events = RecordingObserver::default();
    let mut mgr = manager(dir.path()).with_observer(Box::new(events.clone()));
    let second = mgr.migrate(&mut session).unwrap();

    assert_eq!(second.applied_count(), 1);
    assert_eq!(second.applied[0].version.as_str(), "002");
    assert_eq!(ledger_versions(&mut session), ["001", "002"]);
    assert_eq!(
        session
            .query_count("SELECT COUNT(*) FROM schema_version WHERE version = '001'")
            .unwrap(),
        1
    );
    assert_eq!(*events.0.borrow(), ["pending:1", "start:002", "done:002"]);
}

#[test]
fn test_second_run_is_no_op() {
    let dir = project(&[("001_create_books.sql", CREATE_BOOKS)]);
    let mut session = SqliteSession::in_memory().unwrap();
    manager(dir.path()).migrate(&mut session).unwrap();

    let events = RecordingObserver::default();
    let mut mgr = manager(dir.path()).with_observer(Box::new(events.clone()));
    let report = mgr.migrate(&mut session).unwrap();

    assert!(matches!(report.outcome, RunOutcome::NoOp));
    assert_eq!(report.applied_count(), 0);
    assert_eq!(mgr.state(), &RunState::NoOp);
    assert_eq!(*events.0.borrow(), ["none"]);
    assert_eq!(ledger_versions(&mut session), ["001"]);
}

#[test]
fn test_failure_in_middle_leaves_later_migrations_untouched() {
    let dir = project(&[
        ("1_a.sql", "CREATE TABLE a (id INTEGER);"),
        ("2_b.sql", "CREATE TABLE b (id INTEGER);"),
        ("3_c.sql", "CREATE TABLE c (id INTEGER);\nSELEC broken;"),
        ("4_d.sql", "CREATE TABLE d (id INTEGER);"),
        ("10_e.sql", "CREATE TABLE e (id INTEGER);"),
    ]);
    let mut session = SqliteSession::in_memory().unwrap();
    let report = manager(dir.path()).migrate(&mut session).unwrap();

    assert_eq!(report.applied_count(), 2);
    assert_eq!(ledger_versions(&mut session), ["1", "2"]);
    for (table, expected) in [("a", 1), ("b", 1), ("c", 0), ("d", 0), ("e", 0)] {
        let sql = format!("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '{table}'");
        assert_eq!(session.query_count(&sql).unwrap(), expected, "table {table}");
    }
}

#[test]
fn test_numeric_order_across_widths() {
    let dir = project(&[
        ("10_second.sql", "INSERT INTO log VALUES ('10');"),
        ("2_first.sql", "CREATE TABLE log (v VARCHAR);\nINSERT INTO log VALUES ('2');"),
    ]);
    let mut session = DuckDbSession::in_memory().unwrap();
    let report = manager(dir.path()).migrate(&mut session).unwrap();
    let order: Vec<&str> = report.applied.iter().map(|a| a.version.as_str()).collect();
    assert_eq!(order, ["2", "10"]);
}

// ── Early failures ─────────────────────────────────────────────────────

#[test]
fn test_duplicate_versions_never_touch_session() {
    let dir = project(&[("001_one.sql", "SELECT 1;"), ("1_other.sql", "SELECT 2;")]);
    let mut session = RecordingSession::new("duckdb::memory:");
    let calls = session.calls.clone();

    let err = manager(dir.path()).migrate(&mut session).unwrap_err();

    assert!(matches!(err, MigrateError::Resolution(_)));
    assert!(err.to_string().contains("001_one.sql"));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_unknown_dialect_fails_before_schema_access() {
    let dir = project(&[("001_one.sql", "SELECT 1;")]);
    let mut session = RecordingSession::new("mongodb://localhost/app");
    let calls = session.calls.clone();

    let err = manager(dir.path()).migrate(&mut session).unwrap_err();

    assert!(matches!(err, MigrateError::Dialect(DbError::UnknownDialect { .. })));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_non_transactional_backend_requires_opt_in() {
    let dir = project(&[("001_keyspace.cql", "CREATE TABLE ks.books (id int PRIMARY KEY);")]);
    let mut session = RecordingSession {
        backend: Some(Dialect::Cassandra),
        ..RecordingSession::new("custom://cluster/ks")
    };
    let calls = session.calls.clone();

    let err = manager(dir.path()).migrate(&mut session).unwrap_err();

    assert!(matches!(err, MigrateError::NonTransactional { ref dialect } if dialect == "cassandra"));
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_non_transactional_opt_in_degrades_without_transactions() {
    let dir = project(&[("001_keyspace.cql", "CREATE TABLE ks.books (id int PRIMARY KEY);")]);
    let mut session = RecordingSession {
        backend: Some(Dialect::Cassandra),
        ..RecordingSession::new("cassandra://cluster/ks")
    };
    let calls = session.calls.clone();
    let resolver = MigrationResolver::new(
        vec![ScriptRoot::Directory(dir.path().to_path_buf())],
        "migrations",
    );
    let options = MigratorOptions {
        allow_non_transactional: true,
        ..Default::default()
    };

    let report = MigrationManager::new(resolver, options)
        .migrate(&mut session)
        .unwrap();

    assert_eq!(report.applied_count(), 1);
    let calls = calls.borrow();
    assert!(calls.iter().any(|c| c.contains("system_schema.tables") && c.contains("'ks'")));
    assert!(calls.iter().any(|c| c.starts_with("CREATE TABLE schema_version")));
    assert!(calls.iter().any(|c| c.starts_with("INSERT INTO schema_version")));
    assert!(!calls.iter().any(|c| c == "BEGIN TRANSACTION" || c == "COMMIT"));
}

#[test]
fn test_failed_commit_rolls_back_and_aborts() {
    let dir = project(&[("001_one.sql", "CREATE TABLE one (id INTEGER);")]);
    let mut session = RecordingSession {
        fail_on: Some("COMMIT"),
        ..RecordingSession::new("duckdb::memory:")
    };
    let calls = session.calls.clone();

    let report = manager(dir.path()).migrate(&mut session).unwrap();

    assert!(!report.is_success());
    assert_eq!(report.applied_count(), 0);
    let calls = calls.borrow();
    let tail: Vec<&str> = calls.iter().rev().take(2).map(String::as_str).collect();
    assert_eq!(tail, ["ROLLBACK", "COMMIT"]);
}

#[test]
fn test_mysql_scripts_split_with_mysql_rules() {
    let dir = project(&[(
        "001_authors.sql",
        "# don't run twice\nINSERT INTO authors VALUES ('O\\'Brien');\nINSERT INTO authors VALUES ('Joyce');\n",
    )]);
    let mut session = RecordingSession::new("mysql://localhost/library");
    let calls = session.calls.clone();

    let report = manager(dir.path()).migrate(&mut session).unwrap();

    assert!(report.is_success());
    let calls = calls.borrow();
    let inserts: Vec<&str> = calls
        .iter()
        .map(String::as_str)
        .filter(|c| c.starts_with("INSERT INTO authors"))
        .collect();
    assert_eq!(
        inserts,
        [
            "INSERT INTO authors VALUES ('O\\'Brien')",
            "INSERT INTO authors VALUES ('Joyce')",
        ]
    );
}

// ── Read-only operations ───────────────────────────────────────────────

#[test]
fn test_status_and_pending_without_ledger() {
    let dir = project(&[("001_create_books.sql", CREATE_BOOKS)]);
    let mut session = DuckDbSession::in_memory().unwrap();
    let mgr = manager(dir.path());

    let status = mgr.status(&mut session).unwrap();
    assert!(status.applied.is_empty());
    assert_eq!(status.pending.len(), 1);

    // status must not create the ledger
    assert_eq!(
        session
            .query_count("SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'schema_version'")
            .unwrap(),
        0
    );
}

#[test]
fn test_status_after_partial_run() {
    let dir = project(&[
        ("001_create_books.sql", CREATE_BOOKS),
        ("002_bad.sql", BAD_SEED),
    ]);
    let mut session = DuckDbSession::in_memory().unwrap();
    let mut mgr = manager(dir.path());
    mgr.migrate(&mut session).unwrap();

    let status = mgr.status(&mut session).unwrap();
    assert_eq!(status.applied.len(), 1);
    assert_eq!(status.applied[0].version, "001");
    assert!(status.applied[0].applied_at.is_some());

    assert_eq!(status.names.len(), 2);
    assert_eq!(status.names[&Version::parse("1").unwrap()], "create_books");
    assert_eq!(status.names[&Version::parse("002").unwrap()], "bad");

    let pending = mgr.pending_migrations(&mut session).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].name(), "bad");
}

#[test]
fn test_create_ledger_is_idempotent() {
    let dir = project(&[]);
    let events = RecordingObserver::default();
    let mut mgr = manager(dir.path()).with_observer(Box::new(events.clone()));
    let mut session = SqliteSession::in_memory().unwrap();

    assert!(mgr.create_ledger(&mut session).unwrap());
    assert!(!mgr.create_ledger(&mut session).unwrap());
    assert_eq!(*events.0.borrow(), ["ledger:schema_version"]);
}

#[test]
fn test_substitution_applied_at_execution() {
    let dir = project(&[(
        "001_create.sql",
        "CREATE TABLE ${table} (note VARCHAR);\nINSERT INTO ${table} VALUES ('${not_configured}');",
    )]);
    let resolver = MigrationResolver::new(
        vec![ScriptRoot::Directory(dir.path().to_path_buf())],
        "migrations",
    )
    .with_substitutions(Substitutions::new([("table", "notes")]));
    let mut mgr = MigrationManager::new(resolver, MigratorOptions::default());
    let mut session = DuckDbSession::in_memory().unwrap();

    mgr.migrate(&mut session).unwrap().into_result().unwrap();

    let rows = session.query_text("SELECT note FROM notes", 1).unwrap();
    assert_eq!(rows, vec![vec![Some("${not_configured}".to_string())]]);
}

#[test]
fn test_custom_ledger_table() {
    let dir = project(&[("001_create_books.sql", CREATE_BOOKS)]);
    let resolver = MigrationResolver::new(
        vec![ScriptRoot::Directory(dir.path().to_path_buf())],
        "migrations",
    );
    let options = MigratorOptions {
        ledger_table: "keel_history".to_string(),
        ..Default::default()
    };
    let mut mgr = MigrationManager::new(resolver, options);
    let mut session = SqliteSession::in_memory().unwrap();
    mgr.migrate(&mut session).unwrap();

    assert_eq!(
        session
            .query_count("SELECT COUNT(*) FROM keel_history WHERE version = '001'")
            .unwrap(),
        1
    );
}
