//! Kept in its own test binary: it rewrites `PATH` for the whole process.
#![cfg(unix)]

use pipesh::reaper::StageStatus;
use pipesh::{Orchestrator, parse};
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

fn plain_file(dir: &Path, name: &str) {
    let path = dir.join(name);
    fs::write(&path, "not a program\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
}

#[test]
fn non_executable_entries_on_path_are_skipped() {
    let shadow = tempfile::tempdir().unwrap();
    plain_file(shadow.path(), "echo");
    plain_file(shadow.path(), "pipesh-plain-file");

    let old_path = env::var("PATH").unwrap_or_default();
    // SAFETY: this binary runs a single test, so no other thread reads the
    // environment concurrently.
    unsafe {
        env::set_var("PATH", format!("{}:{old_path}", shadow.path().display()));
    }

    let out = shadow.path().join("out.txt");
    let orchestrator = Orchestrator::new();
    let report = orchestrator
        .execute(parse(&format!("echo hi > {}", out.display())).unwrap())
        .unwrap();
    assert!(report.success(), "{report:?}");
    assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");

    // found only as a file that cannot be executed
    let report = orchestrator
        .execute(parse("pipesh-plain-file").unwrap())
        .unwrap();
    assert!(matches!(report.outcomes()[0].status, StageStatus::Failed(_)));
    assert_eq!(report.last_status(), 126);

    unsafe {
        env::set_var("PATH", old_path);
    }
}
