use cli_test_dir::*;
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

/// Every configuration variable, so we can make sure none leak in from the
/// environment running the tests.
const CONFIG_VARS: &[&str] = &[
    "S3_BUCKET",
    "CSV_KEY",
    "RDS_HOST",
    "RDS_PORT",
    "RDS_USER",
    "RDS_PASS",
    "RDS_DB",
    "RDS_TABLE",
    "GLUE_DB",
    "GLUE_TABLE",
    "GLUE_S3_LOCATION",
    "AWS_CLI",
    "S3INGEST_LOG_FORMAT",
];

/// How our fake `aws glue` should respond.
#[derive(Clone, Copy)]
enum GlueBehavior {
    Succeed,
    AlreadyExists,
    AccessDenied,
}

/// Write a fake `aws` script into `testdir`. It logs each invocation to
/// `calls.log`, serves `csv_fixture` for `aws s3 cp` (or fails if it's
/// `None`), and answers `aws glue` according to `glue`.
#[cfg(unix)]
fn fake_aws(
    testdir: &TestDir,
    csv_fixture: Option<&Path>,
    glue: GlueBehavior,
) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let log = testdir.path("calls.log");
    let s3_body = match csv_fixture {
        Some(path) => format!("cat '{}'", path.display()),
        None => "echo 'fatal error: An error occurred (404) when calling the HeadObject operation: Key \"people.csv\" does not exist' >&2; exit 1".to_owned(),
    };
    let glue_body = match glue {
        GlueBehavior::Succeed => "exit 0",
        GlueBehavior::AlreadyExists => {
            "echo \"An error occurred (AlreadyExistsException) when calling the $2 operation: already exists\" >&2; exit 254"
        }
        GlueBehavior::AccessDenied => {
            "echo \"An error occurred (AccessDeniedException) when calling the $2 operation: denied\" >&2; exit 254"
        }
    };
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> '{}'\ncase \"$1\" in\n  s3) {} ;;\n  glue) {} ;;\nesac\n",
        log.display(),
        s3_body,
        glue_body,
    );
    let path = testdir.path("fake-aws");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A command with full configuration, pointing at an unreachable database.
fn configured_cmd(testdir: &TestDir, aws: &Path) -> Command {
    let mut cmd = testdir.cmd();
    cmd.env("S3_BUCKET", "bucket")
        .env("CSV_KEY", "people.csv")
        .env("RDS_HOST", "127.0.0.1")
        // Nothing listens on port 1.
        .env("RDS_PORT", "1")
        .env("RDS_USER", "user")
        .env("RDS_PASS", "secret")
        .env("RDS_DB", "db")
        .env("RDS_TABLE", "people")
        .env("GLUE_DB", "ingest")
        .env("GLUE_TABLE", "people")
        .env("GLUE_S3_LOCATION", "s3://bucket/people/")
        .env("AWS_CLI", aws);
    cmd
}

/// The contents of `calls.log`, or an empty string if `aws` never ran.
fn aws_calls(testdir: &TestDir) -> String {
    fs::read_to_string(testdir.path("calls.log")).unwrap_or_default()
}

#[test]
fn help_flag() {
    let testdir = TestDir::new("s3ingest", "help_flag");
    let output = testdir.cmd().arg("--help").expect_success();
    assert!(output.stdout_str().contains("s3ingest"));
    assert!(output.stdout_str().contains("GLUE_S3_LOCATION"));
}

#[test]
fn version_flag() {
    let testdir = TestDir::new("s3ingest", "version_flag");
    let output = testdir.cmd().arg("--version").expect_success();
    assert!(output.stdout_str().contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_configuration_is_an_error() {
    let testdir = TestDir::new("s3ingest", "missing_configuration_is_an_error");
    let mut cmd = testdir.cmd();
    for var in CONFIG_VARS {
        cmd.env_remove(var);
    }
    let output = cmd.expect_failure();
    assert!(output.stderr_str().contains("--s3-bucket"));
}

#[test]
#[cfg(unix)]
fn fetch_failure_aborts_before_load() {
    let testdir = TestDir::new("s3ingest", "fetch_failure_aborts_before_load");
    let aws = fake_aws(&testdir, None, GlueBehavior::Succeed);
    let output = configured_cmd(&testdir, &aws).expect_failure();

    assert!(output.stderr_str().contains("does not exist"));
    assert!(!output.stdout_str().contains("Upload to database"));
    let calls = aws_calls(&testdir);
    assert!(calls.contains("s3 cp s3://bucket/people.csv -"));
    assert!(!calls.contains("glue"));
}

#[test]
#[cfg(unix)]
fn load_failure_falls_back_to_glue() {
    let testdir = TestDir::new("s3ingest", "load_failure_falls_back_to_glue");
    let src = testdir.src_path("fixtures/people.csv");
    let aws = fake_aws(&testdir, Some(&src), GlueBehavior::Succeed);
    let output = configured_cmd(&testdir, &aws)
        .tee_output()
        .expect_success();

    let stdout = output.stdout_str();
    assert!(stdout.contains("❌ Upload to database failed"));
    assert!(stdout.contains("✅ Fallback: catalog table registered"));
    assert!(!stdout.contains("secret"));

    let calls = aws_calls(&testdir);
    assert!(calls.contains("glue create-database --database-input {\"Name\":\"ingest\"}"));
    assert!(calls.contains("glue create-table --database-name ingest"));
    assert!(calls.contains("\"Name\":\"col20\""));
    assert!(!calls.contains("\"Name\":\"col21\""));
    assert!(calls.contains("\"Location\":\"s3://bucket/people/\""));
    assert!(calls.contains("\"TableType\":\"EXTERNAL_TABLE\""));
}

#[test]
#[cfg(unix)]
fn existing_glue_table_is_not_an_error() {
    let testdir = TestDir::new("s3ingest", "existing_glue_table_is_not_an_error");
    let src = testdir.src_path("fixtures/people.csv");
    let aws = fake_aws(&testdir, Some(&src), GlueBehavior::AlreadyExists);
    let output = configured_cmd(&testdir, &aws)
        .tee_output()
        .expect_success();

    assert!(output.stdout_str().contains("ℹ️ Catalog table already exists"));
    assert!(aws_calls(&testdir).contains("glue create-table"));
}

#[test]
#[cfg(unix)]
fn glue_permission_error_is_fatal() {
    let testdir = TestDir::new("s3ingest", "glue_permission_error_is_fatal");
    let src = testdir.src_path("fixtures/people.csv");
    let aws = fake_aws(&testdir, Some(&src), GlueBehavior::AccessDenied);
    let output = configured_cmd(&testdir, &aws).expect_failure();

    assert!(output.stderr_str().contains("AccessDeniedException"));
    assert!(!output.stdout_str().contains("Fallback: catalog table registered"));
}

#[test]
#[cfg(unix)]
fn malformed_csv_aborts_before_load() {
    let testdir = TestDir::new("s3ingest", "malformed_csv_aborts_before_load");
    let src = testdir.path("ragged.csv");
    fs::write(&src, "id,name\n1,a\n2,b,extra\n").unwrap();
    let aws = fake_aws(&testdir, Some(&src), GlueBehavior::Succeed);
    let output = configured_cmd(&testdir, &aws).expect_failure();

    assert!(output.stderr_str().contains("could not parse s3://bucket/people.csv"));
    assert!(!aws_calls(&testdir).contains("glue"));
}

#[test]
#[cfg(unix)]
fn short_rows_reach_the_load_step() {
    let testdir = TestDir::new("s3ingest", "short_rows_reach_the_load_step");
    let src = testdir.src_path("fixtures/short_rows.csv");
    let aws = fake_aws(&testdir, Some(&src), GlueBehavior::Succeed);
    let output = configured_cmd(&testdir, &aws)
        .tee_output()
        .expect_success();

    assert!(!output.stderr_str().contains("could not parse"));
    let stdout = output.stdout_str();
    assert!(stdout.contains("❌ Upload to database failed"));
    assert!(stdout.contains("✅ Fallback: catalog table registered"));
}
