//! End-to-end tests for the git-backed `gam` commands.
//!
//! Each test builds a throwaway repository and returns early when `git` is
//! not installed.

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

fn repository() -> Option<TestFixture> {
    if !git_available() {
        eprintln!("git not available, skipping");
        return None;
    }
    Some(TestFixture::new().with_sample_workspace().with_git_commit())
}

#[test]
fn test_dirty_reports_clean_then_dirty() {
    let Some(fixture) = repository() else { return };

    fixture
        .command()
        .arg("dirty")
        .assert()
        .success()
        .stdout("false\n");

    let fixture = fixture.with_file("notes.txt", "untracked");
    fixture
        .command()
        .arg("dirty")
        .assert()
        .success()
        .stdout("true\n");

    fixture
        .command()
        .arg("dirty")
        .arg("--check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("is dirty"));
}

#[test]
fn test_hash_matches_rev_parse() {
    let Some(fixture) = repository() else { return };
    let expected = fixture.git(&["rev-parse", "HEAD"]);

    fixture
        .command()
        .arg("hash")
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn test_hash_clean_only_on_dirty_tree_prints_nothing() {
    let Some(fixture) = repository() else { return };
    let fixture = fixture.with_file("apps/web/index.html", "<html></html>");

    fixture
        .command()
        .args(["hash", "--clean-only"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_changed_lists_files_since_base() {
    let Some(fixture) = repository() else { return };
    fixture.git(&["checkout", "--quiet", "-b", "feature"]);
    let fixture = fixture.with_file("apps/web/index.html", "<html></html>");
    fixture.commit_all("web page");

    fixture
        .command()
        .arg("changed")
        .assert()
        .success()
        .stdout("apps/web/index.html\n");
}

#[test]
fn test_changed_unknown_base_fails() {
    let Some(fixture) = repository() else { return };

    fixture
        .command()
        .args(["changed", "--base", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("merge-base"));
}

#[test]
fn test_affected_reports_build_and_sync_impact() {
    let Some(fixture) = repository() else { return };
    fixture.git(&["checkout", "--quiet", "-b", "feature"]);
    let fixture = fixture
        .with_file("apps/web/index.html", "<html></html>")
        .with_file("shared/proto/api.proto", "syntax = \"proto3\";\npackage api;\n");
    fixture.commit_all("web page and proto");

    let output = fixture
        .command()
        .arg("affected")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        result,
        serde_json::json!({
            "api": {"sync": true, "variants": ["slim"]},
            "web": {"sync": false, "variants": []}
        })
    );
}

#[test]
fn test_affected_nothing_changed() {
    let Some(fixture) = repository() else { return };

    fixture
        .command()
        .args(["affected", "--base", "HEAD"])
        .assert()
        .success()
        .stdout("{}\n");
}
