// crates/db-test-store-sqlite/tests/sqlite_gateway.rs
// ============================================================================
// Module: SQLite Gateway Tests
// Description: Setup, execution, and teardown against real SQLite files.
// Purpose: Validate the gateway contract the runner depends on.
// Dependencies: db-test-store-sqlite, db-test-core, serde_json, tempfile
// ============================================================================
//! ## Overview
//! Each test builds database script directories in a temp dir, sets up a
//! gateway, and inspects statement results and files on disk.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use db_test_core::DatabaseGateway;
use db_test_core::DbName;
use db_test_core::ExecutionErrorKind;
use db_test_core::NoopReporter;
use db_test_core::Params;
use db_test_core::RunEvent;
use db_test_core::RunOptions;
use db_test_core::RunOrchestrator;
use db_test_core::RunReporter;
use db_test_core::TestOutcome;
use db_test_core::TestRecord;
use db_test_core::register;
use db_test_store_sqlite::DatabaseSpec;
use db_test_store_sqlite::SqliteGateway;
use db_test_store_sqlite::SqliteGatewayConfig;
use db_test_store_sqlite::SqliteGatewayError;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reporter that keeps event messages.
#[derive(Default)]
struct MemoryReporter {
    /// Captured messages.
    messages: Mutex<Vec<String>>,
}

impl MemoryReporter {
    /// Returns the captured messages.
    fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }
}

impl RunReporter for MemoryReporter {
    fn record(&self, event: &RunEvent) {
        self.messages.lock().expect("lock").push(event.message.clone());
    }
}

/// Temp directory holding database scripts and the work dir.
struct Fixture {
    /// Root temp directory.
    root: TempDir,
}

impl Fixture {
    /// Creates an empty fixture.
    fn new() -> Self {
        Self {
            root: TempDir::new().expect("tempdir"),
        }
    }

    /// Writes a file relative to the root.
    fn write(&self, relative: &str, contents: &str) {
        let path = self.root.path().join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    /// Returns a path relative to the root.
    fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Returns a config with the work dir inside the fixture.
    fn config(&self) -> SqliteGatewayConfig {
        SqliteGatewayConfig {
            work_dir: self.path("work"),
            ..SqliteGatewayConfig::default()
        }
    }

    /// Writes a sectioned `app` database plus one suite fixture.
    fn sectioned_app(&self) {
        self.write("dbs/app/pre-data/01_schema.sql", "create table items (id integer not null, label text);");
        self.write("dbs/app/data/01_rows.sql", "insert into items values (1, 'one');");
        self.write("suite/data/app/01_fixture.sql", "insert into items values (2, 'two');");
        self.write("dbs/app/post-data/01_index.sql", "create unique index items_id on items (id);");
    }

    /// Sets up a gateway for the `app` database.
    fn setup(&self, reporter: &dyn RunReporter) -> Result<SqliteGateway, SqliteGatewayError> {
        SqliteGateway::setup(
            self.config(),
            &[DatabaseSpec::new("app", self.path("dbs/app"))],
            &self.path("suite"),
            reporter,
        )
    }
}

/// Converts a JSON object literal into params.
fn params(value: Value) -> Params {
    let Value::Object(map) = value else {
        panic!("params must be an object");
    };
    map
}

/// Builds a record from a JSON object literal.
fn record(id: &str, fields: Value) -> TestRecord {
    TestRecord::from_fields(id, params(fields))
}

/// Returns the `app` database name.
fn app() -> DbName {
    DbName::new("app")
}

// ============================================================================
// SECTION: Setup
// ============================================================================

/// Verifies sections run in order and fixtures land between data and post-data.
#[test]
fn sectioned_setup_applies_scripts_in_order() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let reporter = MemoryReporter::default();
    let gateway = fixture.setup(&reporter).expect("setup");

    let rows = gateway
        .execute(&app(), "select id, label from items order by id", &Params::new())
        .expect("query");
    assert_eq!(
        serde_json::to_value(rows).expect("json"),
        json!([{"id": 1, "label": "one"}, {"id": 2, "label": "two"}])
    );
    let loads: Vec<String> =
        reporter.messages().into_iter().filter(|message| message.starts_with("loading")).collect();
    assert_eq!(
        loads,
        vec![
            "loading pre-data for app",
            "loading data for app",
            "loading test data for app",
            "loading post-data for app",
        ]
    );
}

/// Verifies a directory without sections uses its top-level scripts.
#[test]
fn unsectioned_directory_uses_root_scripts() {
    let fixture = Fixture::new();
    fixture.write("dbs/app/schema.sql", "create table t (x integer); insert into t values (5);");
    let gateway = fixture.setup(&NoopReporter).expect("setup");
    let rows = gateway.execute(&app(), "select x from t", &Params::new()).expect("query");
    assert_eq!(serde_json::to_value(rows).expect("json"), json!([{"x": 5}]));
}

/// Verifies a failing script aborts setup and leaves no database file behind.
#[test]
fn failing_script_aborts_setup() {
    let fixture = Fixture::new();
    fixture.write("dbs/app/schema.sql", "create table t (x integer;");
    let err = fixture.setup(&NoopReporter).err().expect("setup failure");
    assert!(matches!(err, SqliteGatewayError::Script { .. }));
    let leftovers = fs::read_dir(fixture.path("work")).expect("work dir").count();
    assert_eq!(leftovers, 0);
}

/// Verifies a missing database directory is rejected.
#[test]
fn missing_database_directory_is_rejected() {
    let fixture = Fixture::new();
    let err = fixture.setup(&NoopReporter).err().expect("setup failure");
    assert!(matches!(err, SqliteGatewayError::Invalid(_)));
}

/// Verifies physical names carry the logical name and a run stamp.
#[test]
fn physical_name_is_stamped() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let gateway = fixture.setup(&NoopReporter).expect("setup");
    let physical = gateway.physical_name(&app()).expect("physical name");
    let stamp = physical.strip_prefix("app_test_").expect("prefix");
    assert_eq!(stamp.len(), 14);
    assert!(stamp.chars().all(|ch| ch.is_ascii_digit()));
    assert_eq!(gateway.live_databases(), vec![app()]);
    assert!(gateway.physical_name(&DbName::new("other")).is_none());
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Verifies named parameters bind and unused ones are ignored.
#[test]
fn binds_named_parameters() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let gateway = fixture.setup(&NoopReporter).expect("setup");
    let inserted = gateway
        .execute(
            &app(),
            "insert into items values (:id, :label)",
            &params(json!({"id": 3, "label": "three", "unused": true})),
        )
        .expect("insert");
    assert_eq!(inserted, None);
    let rows = gateway
        .execute(&app(), "select label from items where id = :id", &params(json!({"id": 3})))
        .expect("select");
    assert_eq!(serde_json::to_value(rows).expect("json"), json!([{"label": "three"}]));
}

/// Verifies a missing parameter is a statement error.
#[test]
fn missing_parameter_is_reported() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let gateway = fixture.setup(&NoopReporter).expect("setup");
    let err = gateway
        .execute(&app(), "select * from items where id = :id", &Params::new())
        .expect_err("missing param");
    assert_eq!(err.kind, ExecutionErrorKind::Statement);
    assert!(err.message.contains("'id'"));
}

/// Verifies a failed statement surfaces the engine message and leaves data unchanged.
#[test]
fn failed_statement_rolls_back() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let gateway = fixture.setup(&NoopReporter).expect("setup");
    let err = gateway
        .execute(&app(), "insert into items values (1, 'dup')", &Params::new())
        .expect_err("unique violation");
    assert!(err.message.contains("UNIQUE constraint failed"));
    assert_eq!(err.statement.as_deref(), Some("insert into items values (1, 'dup')"));
    let rows = gateway.execute(&app(), "select count(*) as n from items", &Params::new()).expect("count");
    assert_eq!(serde_json::to_value(rows).expect("json"), json!([{"n": 2}]));
}

/// Verifies queries against an unknown database fail without touching files.
#[test]
fn unknown_database_is_reported() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let gateway = fixture.setup(&NoopReporter).expect("setup");
    let err = gateway.execute(&DbName::new("ghost"), "select 1", &Params::new()).expect_err("unknown");
    assert_eq!(err.kind, ExecutionErrorKind::UnknownDatabase);
}

// ============================================================================
// SECTION: Teardown
// ============================================================================

/// Returns the file backing `app`.
fn database_file(gateway: &SqliteGateway) -> PathBuf {
    gateway.database_path(&app()).expect("path").to_path_buf()
}

/// Returns true when the path exists.
fn exists(path: &Path) -> bool {
    path.try_exists().expect("stat")
}

/// Verifies teardown removes database files by default.
#[test]
fn teardown_removes_files() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let mut gateway = fixture.setup(&NoopReporter).expect("setup");
    let path = database_file(&gateway);
    assert!(exists(&path));
    let removed = gateway.teardown(false, &NoopReporter).expect("teardown");
    assert_eq!(removed, vec![path.clone()]);
    assert!(!exists(&path));
    assert!(gateway.live_databases().is_empty());
}

/// Verifies kept databases survive teardown.
#[test]
fn teardown_keeps_files_when_asked() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let mut gateway = fixture.setup(&NoopReporter).expect("setup");
    let path = database_file(&gateway);
    let reporter = MemoryReporter::default();
    gateway.teardown(true, &reporter).expect("teardown");
    assert!(exists(&path));
    assert!(reporter.messages().iter().any(|message| message.starts_with("keeping database app")));
}

// ============================================================================
// SECTION: Runs
// ============================================================================

/// Verifies a full run over real databases, including exceptions and cleanup.
#[test]
fn orchestrated_run_against_sqlite() {
    let fixture = Fixture::new();
    fixture.sectioned_app();
    let mut gateway = fixture.setup(&NoopReporter).expect("setup");
    let registration = register(vec![
        record("a_select", json!({"db": "app", "sql": "select id from items order by id", "result": [{"id": 1}, {"id": 2}]})),
        record(
            "b_duplicate",
            json!({
                "db": "app",
                "sql": "insert into items values (:id, 'dup')",
                "params": {"id": 1},
                "result": null,
                "expected_exception": "UNIQUE constraint failed"
            }),
        ),
        record(
            "c_insert",
            json!({
                "db": "app",
                "sql": "insert into items values (:id, 'new')",
                "params": {"id": 9},
                "check_sql": "select label from items where id = :id",
                "cleanup": "delete from items where id = :id",
                "result": [{"label": "new"}]
            }),
        ),
        record("d_missing_db", json!({"db": "ghost", "sql": "select 1", "result": null})),
    ])
    .expect("registration");

    let summary = RunOrchestrator::new(&gateway, &NoopReporter, RunOptions::default())
        .run(&registration.valid);
    let outcomes: Vec<&TestOutcome> = summary.reports.iter().map(|report| &report.outcome).collect();
    assert_eq!(outcomes[0], &TestOutcome::Passed);
    assert_eq!(outcomes[1], &TestOutcome::ExceptionMatched);
    assert_eq!(outcomes[2], &TestOutcome::Passed);
    assert!(matches!(outcomes[3], TestOutcome::Skipped(_)));
    assert_eq!(summary.failed_count(), 1);

    let remaining = gateway.execute(&app(), "select count(*) as n from items", &Params::new()).expect("count");
    assert_eq!(serde_json::to_value(remaining).expect("json"), json!([{"n": 2}]));
    gateway.teardown(false, &NoopReporter).expect("teardown");
}
