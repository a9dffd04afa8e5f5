//! Worker process runner against real shell scripts
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use plugfy_execution::{ExecutionError, ProcessWorkerRunner, WorkerInvocation, WorkerRunner};
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_output_streams_are_captured() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(
        tmp.path(),
        "runner.sh",
        "echo \"first line\"\necho\necho \"   \"\necho \"second line\"\necho \"warning\" 1>&2\nexit 0\n",
    );

    let invocation = WorkerInvocation::new(&script, "STDInOut", "list", &JsonValue::Null).unwrap();
    let outcome = ProcessWorkerRunner::new().run(&invocation).await.unwrap();

    assert_eq!(outcome.exit_code, Some(0));
    assert!(outcome.success());
    assert_eq!(outcome.stdout, vec!["first line", "second line"]);
    assert_eq!(outcome.stderr, vec!["warning"]);
}

#[tokio::test]
async fn test_arguments_and_working_directory() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(
        tmp.path(),
        "runner.sh",
        "printf '%s\\n' \"$@\" > args.txt\n",
    );

    let params = json!({"assemblyName": "Demo.dll"});
    let invocation = WorkerInvocation::new(&script, "STDInOut", "info", &params).unwrap();
    let outcome = ProcessWorkerRunner::new().run(&invocation).await.unwrap();
    assert!(outcome.success());

    // The script ran in its own directory
    let recorded = std::fs::read_to_string(tmp.path().join("args.txt")).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(
        args,
        vec![
            "-t",
            "STDInOut",
            "-c",
            r#"{"Type":"info","Parameters":{"assemblyName":"Demo.dll"}}"#,
            "-p",
            r#"'{"assemblyName":"Demo.dll"}'"#,
        ]
    );
}

#[tokio::test]
async fn test_nonzero_exit_is_reported() {
    let tmp = TempDir::new().unwrap();
    let script = write_script(tmp.path(), "runner.sh", "echo \"boom\" 1>&2\nexit 3\n");

    let invocation = WorkerInvocation::new(&script, "STDInOut", "list", &json!({})).unwrap();
    let outcome = ProcessWorkerRunner::new().run(&invocation).await.unwrap();

    assert_eq!(outcome.exit_code, Some(3));
    assert!(!outcome.success());
    assert_eq!(outcome.stderr, vec!["boom"]);
}

#[tokio::test]
async fn test_spawn_failure() {
    let tmp = TempDir::new().unwrap();
    let not_executable = tmp.path().join("runner.txt");
    std::fs::write(&not_executable, "plain text").unwrap();

    let invocation =
        WorkerInvocation::new(&not_executable, "STDInOut", "list", &json!({})).unwrap();
    let err = ProcessWorkerRunner::new().run(&invocation).await.unwrap_err();
    assert!(matches!(err, ExecutionError::SpawnFailed { .. }));
}
