//! # Git Adapter
//!
//! Fixed option tables for the git sub-commands change detection needs
//! (`diff`, `diff-index`, `ls-files`, `merge-base`, `show-ref`,
//! `rev-parse`) and typed operations built on them.
//!
//! Every operation runs in [`RunOptions::cwd`], so the caller decides which
//! repository is inspected. Read-only queries (`refs`, `untracked_files`,
//! ...) report whatever git printed and treat a failing exit as "nothing";
//! only [`changed_files`] needs an intermediate value to continue and fails
//! with [`Error::GitCommand`] when it cannot get one.

use log::debug;
use regex::Regex;

use crate::command::{CommandBuilder, CommandSpec, OptionSpec, Separator};
use crate::defaults::DEFAULT_HEAD;
use crate::error::{Error, Result};
use crate::process::RunOptions;

/// Global `git` options.
pub static GIT: CommandSpec = CommandSpec::new(
    "git",
    &[
        OptionSpec::switch("version", "--version"),
        OptionSpec::switch("help", "--help"),
        OptionSpec::required("cwd", "-C", Separator::Space).multiple(),
        OptionSpec::required("config", "-c", Separator::Space).multiple(),
        OptionSpec::optional("execPath", "--exec-path", Separator::Equals),
        OptionSpec::switch("paginate", "--paginate"),
        OptionSpec::switch("noPager", "--no-pager"),
        OptionSpec::required("gitDir", "--git-dir", Separator::Equals),
        OptionSpec::required("workTree", "--work-tree", Separator::Equals),
        OptionSpec::required("namespace", "--namespace", Separator::Equals),
        OptionSpec::switch("bare", "--bare"),
        OptionSpec::switch("noReplaceObjects", "--no-replace-objects"),
        OptionSpec::switch("literalPathspecs", "--literal-pathspecs"),
        OptionSpec::switch("noOptionalLocks", "--no-optional-locks"),
    ],
);

/// `git diff` options.
pub static DIFF: CommandSpec = CommandSpec::new(
    "diff",
    &[
        OptionSpec::switch("nameOnly", "--name-only"),
        OptionSpec::switch("nameStatus", "--name-status"),
        OptionSpec::optional("relative", "--relative", Separator::Equals),
        OptionSpec::switch("noRelative", "--no-relative"),
        OptionSpec::switch("cached", "--cached"),
        OptionSpec::switch("mergeBase", "--merge-base"),
        OptionSpec::optional("diffFilter", "--diff-filter", Separator::Equals),
        OptionSpec::switch("exitCode", "--exit-code"),
        OptionSpec::switch("quiet", "--quiet"),
        OptionSpec::switch("noRenames", "--no-renames"),
        OptionSpec::required("string", "-S", Separator::None),
        OptionSpec::required("regex", "-G", Separator::None),
        OptionSpec::switch("noColor", "--no-color"),
        OptionSpec::switch("nullTerminated", "-z"),
    ],
);

/// `git diff-index` options.
pub static DIFF_INDEX: CommandSpec = CommandSpec::new(
    "diff-index",
    &[
        OptionSpec::switch("nameOnly", "--name-only"),
        OptionSpec::switch("nameStatus", "--name-status"),
        OptionSpec::optional("relative", "--relative", Separator::Equals),
        OptionSpec::switch("cached", "--cached"),
        OptionSpec::switch("mergeBase", "--merge-base"),
        OptionSpec::optional("diffFilter", "--diff-filter", Separator::Equals),
        OptionSpec::switch("quiet", "--quiet"),
        OptionSpec::switch("nullTerminated", "-z"),
    ],
);

/// `git ls-files` options.
pub static LS_FILES: CommandSpec = CommandSpec::new(
    "ls-files",
    &[
        OptionSpec::switch("cached", "--cached"),
        OptionSpec::switch("deleted", "--deleted"),
        OptionSpec::switch("modified", "--modified"),
        OptionSpec::switch("others", "--others"),
        OptionSpec::switch("ignored", "--ignored"),
        OptionSpec::switch("directory", "--directory"),
        OptionSpec::required("exclude", "--exclude", Separator::Equals).multiple(),
        OptionSpec::required("excludeFrom", "--exclude-from", Separator::Equals).multiple(),
        OptionSpec::switch("excludeStandard", "--exclude-standard"),
        OptionSpec::switch("errorUnmatch", "--error-unmatch"),
        OptionSpec::switch("fullName", "--full-name"),
        OptionSpec::switch("nullTerminated", "-z"),
    ],
);

/// `git merge-base` options.
pub static MERGE_BASE: CommandSpec = CommandSpec::new(
    "merge-base",
    &[
        OptionSpec::switch("all", "--all"),
        OptionSpec::switch("octopus", "--octopus"),
        OptionSpec::switch("isAncestor", "--is-ancestor"),
        OptionSpec::switch("forkPoint", "--fork-point"),
    ],
);

/// `git show-ref` options.
pub static SHOW_REF: CommandSpec = CommandSpec::new(
    "show-ref",
    &[
        OptionSpec::switch("head", "--head"),
        OptionSpec::switch("heads", "--heads"),
        OptionSpec::switch("tags", "--tags"),
        OptionSpec::switch("verify", "--verify"),
        OptionSpec::switch("quiet", "--quiet"),
        OptionSpec::optional("hash", "--hash", Separator::Equals),
        OptionSpec::optional("abbrev", "--abbrev", Separator::Equals),
    ],
);

/// `git rev-parse` options.
pub static REV_PARSE: CommandSpec = CommandSpec::new(
    "rev-parse",
    &[
        OptionSpec::switch("verify", "--verify"),
        OptionSpec::switch("quiet", "--quiet"),
        OptionSpec::optional("short", "--short", Separator::Equals),
        OptionSpec::optional("abbrevRef", "--abbrev-ref", Separator::Equals),
        OptionSpec::switch("symbolicFullName", "--symbolic-full-name"),
        OptionSpec::switch("showToplevel", "--show-toplevel"),
        OptionSpec::switch("showPrefix", "--show-prefix"),
        OptionSpec::switch("gitDir", "--git-dir"),
        OptionSpec::switch("isInsideWorkTree", "--is-inside-work-tree"),
        OptionSpec::switch("isInsideGitDir", "--is-inside-git-dir"),
        OptionSpec::switch("isBareRepository", "--is-bare-repository"),
    ],
);

fn command(sub: &'static CommandSpec) -> CommandBuilder {
    CommandBuilder::new(&[&GIT, sub])
}

/// A command that prints paths. `core.quotePath` is turned off so non-ASCII
/// names come out verbatim instead of as quoted octal escapes.
fn path_command(sub: &'static CommandSpec) -> Result<CommandBuilder> {
    let mut builder = command(sub);
    builder.segment_option("git", "config", Some("core.quotePath=false"))?;
    Ok(builder)
}

fn lines(command: &CommandBuilder, run: &RunOptions) -> Result<Vec<String>> {
    let result = command.run_sync(run)?;
    if !result.success() {
        debug!(
            "'{}' exited with {:?}: {}",
            command,
            result.status(),
            result.stderr_text().trim()
        );
    }
    Ok(result.sanitized_stdout().to_vec())
}

/// Files changed on `head` since it diverged from `base`.
///
/// Resolves `git merge-base <base> <head>` first, then lists
/// `git diff --name-only --relative <merge-base> <head>`. Paths are
/// relative to the working directory.
pub fn changed_files(base: &str, head: &str, run: &RunOptions) -> Result<Vec<String>> {
    let mut merge_base = command(&MERGE_BASE);
    merge_base.parameter(base).parameter(head);

    let result = merge_base.run_sync(run)?;
    let commit = result.sanitized_stdout().first().cloned();
    let commit = match commit {
        Some(commit) if result.success() => commit,
        _ => {
            return Err(Error::GitCommand {
                command: merge_base.to_string(),
                stderr: result.stderr_text().trim().to_string(),
            })
        }
    };
    debug!("Merge base of {} and {} is {}", base, head, commit);

    let mut diff = path_command(&DIFF)?;
    diff.flag("nameOnly")?
        .flag("relative")?
        .parameter(&commit)
        .parameter(head);
    lines(&diff, run)
}

pub fn has_changed_files(base: &str, head: &str, run: &RunOptions) -> Result<bool> {
    Ok(!changed_files(base, head, run)?.is_empty())
}

/// Whether the working directory is inside a git work tree.
pub fn inside_work_tree(run: &RunOptions) -> Result<bool> {
    let mut rev_parse = command(&REV_PARSE);
    rev_parse.flag("isInsideWorkTree")?;
    Ok(lines(&rev_parse, run)?.iter().any(|line| line == "true"))
}

/// All refs, as printed by `git show-ref`.
pub fn refs(run: &RunOptions) -> Result<Vec<String>> {
    lines(&command(&SHOW_REF), run)
}

pub fn has_refs(run: &RunOptions) -> Result<bool> {
    Ok(!refs(run)?.is_empty())
}

/// Untracked files not excluded by the standard ignore rules.
pub fn untracked_files(run: &RunOptions) -> Result<Vec<String>> {
    let mut ls_files = path_command(&LS_FILES)?;
    ls_files.flag("others")?.flag("excludeStandard")?;
    lines(&ls_files, run)
}

/// Tracked files with changes relative to `HEAD`.
pub fn uncommitted_files(run: &RunOptions) -> Result<Vec<String>> {
    let mut diff = path_command(&DIFF)?;
    diff.flag("nameOnly")?.flag("relative")?.parameter(DEFAULT_HEAD);
    lines(&diff, run)
}

/// Files staged in the index relative to `HEAD`.
pub fn staged_files(run: &RunOptions) -> Result<Vec<String>> {
    let mut diff_index = path_command(&DIFF_INDEX)?;
    diff_index
        .flag("nameOnly")?
        .flag("cached")?
        .parameter(DEFAULT_HEAD);
    lines(&diff_index, run)
}

/// Whether the repository has any untracked, uncommitted or staged files.
///
/// A directory outside a work tree, or a repository without refs, is never
/// dirty. Checks stop at the first non-empty file set.
pub fn repo_dirty(run: &RunOptions) -> Result<bool> {
    if !inside_work_tree(run)? || !has_refs(run)? {
        return Ok(false);
    }
    Ok(!untracked_files(run)?.is_empty()
        || !uncommitted_files(run)?.is_empty()
        || !staged_files(run)?.is_empty())
}

/// Options for [`hash`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashOptions {
    /// Return `None` when the repository is dirty.
    pub clean_only: bool,
    /// Ask git for an abbreviated hash.
    pub short: bool,
}

/// The commit hash of `HEAD`.
///
/// Returns `None` when `clean_only` is set and the repository is dirty, or
/// when git printed nothing that looks like a hash.
pub fn hash(options: HashOptions, run: &RunOptions) -> Result<Option<String>> {
    if options.clean_only && repo_dirty(run)? {
        return Ok(None);
    }

    let mut rev_parse = command(&REV_PARSE);
    if options.short {
        rev_parse.flag("short")?;
    }
    rev_parse.parameter(DEFAULT_HEAD);

    let pattern = Regex::new(r"\b[0-9a-f]{5,40}\b")?;
    Ok(lines(&rev_parse, run)?
        .into_iter()
        .find(|line| pattern.is_match(line)))
}

/// Trait for git operations - allows mocking in tests
pub trait GitOperations {
    fn changed_files(&self, base: &str, head: &str) -> Result<Vec<String>>;

    fn repo_dirty(&self) -> Result<bool>;

    fn hash(&self, options: HashOptions) -> Result<Option<String>>;
}

/// The default implementation of `GitOperations`, which runs the system's
/// `git` binary in the configured working directory.
#[derive(Debug, Clone, Default)]
pub struct DefaultGitOperations {
    run: RunOptions,
}

impl DefaultGitOperations {
    pub fn new(run: RunOptions) -> Self {
        Self { run }
    }
}

impl GitOperations for DefaultGitOperations {
    fn changed_files(&self, base: &str, head: &str) -> Result<Vec<String>> {
        changed_files(base, head, &self.run)
    }

    fn repo_dirty(&self) -> Result<bool> {
        repo_dirty(&self.run)
    }

    fn hash(&self, options: HashOptions) -> Result<Option<String>> {
        hash(options, &self.run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;

    fn git_available() -> bool {
        Command::new("git").arg("--version").output().is_ok()
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn init_repo(dir: &Path) {
        git(dir, &["init", "--quiet", "--initial-branch=main"]);
        git(dir, &["config", "user.email", "dev@example.com"]);
        git(dir, &["config", "user.name", "Dev"]);
        git(dir, &["config", "commit.gpgsign", "false"]);
        std::fs::write(dir.join("README.md"), "readme\n").unwrap();
        git(dir, &["add", "."]);
        git(dir, &["commit", "--quiet", "-m", "initial"]);
    }

    #[test]
    fn test_changed_files_command_shape() {
        let mut diff = command(&DIFF);
        diff.flag("nameOnly")
            .unwrap()
            .flag("relative")
            .unwrap()
            .parameter("abc123")
            .parameter("HEAD");
        assert_eq!(
            diff.to_array(),
            vec!["git", "diff", "--name-only", "--relative", "abc123", "HEAD"]
        );
    }

    #[test]
    fn test_hash_short_command_shape() {
        let mut rev_parse = command(&REV_PARSE);
        rev_parse.flag("short").unwrap().parameter(DEFAULT_HEAD);
        assert_eq!(rev_parse.to_string(), "git rev-parse --short HEAD");
    }

    #[test]
    fn test_global_cwd_option() {
        let mut builder = command(&SHOW_REF);
        builder
            .segment_option("git", "cwd", Some("/repo"))
            .unwrap()
            .flag("heads")
            .unwrap();
        assert_eq!(builder.to_string(), "git -C /repo show-ref --heads");
    }

    #[test]
    fn test_changed_files_between_branches() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        git(dir.path(), &["checkout", "--quiet", "-b", "feature"]);
        std::fs::create_dir_all(dir.path().join("app/src")).unwrap();
        std::fs::write(dir.path().join("app/src/main.go"), "package main\n").unwrap();
        git(dir.path(), &["add", "."]);
        git(dir.path(), &["commit", "--quiet", "-m", "app"]);

        let run = RunOptions::default().with_cwd(dir.path());
        let changed = changed_files("main", "HEAD", &run).unwrap();
        assert_eq!(changed, vec!["app/src/main.go"]);
        assert!(has_changed_files("main", "HEAD", &run).unwrap());
        assert!(!has_changed_files("HEAD", "HEAD", &run).unwrap());
    }

    #[test]
    fn test_path_commands_disable_quoting() {
        let mut ls_files = path_command(&LS_FILES).unwrap();
        ls_files.flag("others").unwrap();
        assert_eq!(
            ls_files.to_string(),
            "git -c core.quotePath=false ls-files --others"
        );
    }

    #[test]
    fn test_changed_files_keeps_non_ascii_names() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        git(dir.path(), &["checkout", "--quiet", "-b", "feature"]);
        std::fs::create_dir_all(dir.path().join("apps/api")).unwrap();
        std::fs::write(dir.path().join("apps/api/café.txt"), "menu\n").unwrap();
        let run = RunOptions::default().with_cwd(dir.path());
        assert_eq!(untracked_files(&run).unwrap(), vec!["apps/api/café.txt"]);

        git(dir.path(), &["add", "."]);
        assert_eq!(staged_files(&run).unwrap(), vec!["apps/api/café.txt"]);
        git(dir.path(), &["commit", "--quiet", "-m", "menu"]);

        let changed = changed_files("main", "HEAD", &run).unwrap();
        assert_eq!(changed, vec!["apps/api/café.txt"]);
        assert!(crate::path::contains("apps/api", &changed[0]));
    }

    #[test]
    fn test_changed_files_unknown_base_is_an_error() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let run = RunOptions::default().with_cwd(dir.path());
        let err = changed_files("no-such-branch", "HEAD", &run).unwrap_err();
        assert!(matches!(err, Error::GitCommand { .. }));
    }

    #[test]
    fn test_repo_dirty_detects_each_file_set() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let run = RunOptions::default().with_cwd(dir.path());

        assert!(inside_work_tree(&run).unwrap());
        assert!(!refs(&run).unwrap().is_empty());
        assert!(!repo_dirty(&run).unwrap());

        std::fs::write(dir.path().join("new.txt"), "x").unwrap();
        assert_eq!(untracked_files(&run).unwrap(), vec!["new.txt"]);
        assert!(repo_dirty(&run).unwrap());

        git(dir.path(), &["add", "new.txt"]);
        assert_eq!(staged_files(&run).unwrap(), vec!["new.txt"]);
        assert!(repo_dirty(&run).unwrap());

        git(dir.path(), &["commit", "--quiet", "-m", "new"]);
        std::fs::write(dir.path().join("README.md"), "changed\n").unwrap();
        assert_eq!(uncommitted_files(&run).unwrap(), vec!["README.md"]);
        assert!(repo_dirty(&run).unwrap());
    }

    #[test]
    fn test_repo_dirty_outside_work_tree() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let run = RunOptions::default().with_cwd(dir.path());
        assert!(!inside_work_tree(&run).unwrap());
        assert!(!repo_dirty(&run).unwrap());
    }

    #[test]
    fn test_hash_respects_clean_only() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let run = RunOptions::default().with_cwd(dir.path());

        let full = hash(HashOptions::default(), &run).unwrap().unwrap();
        assert_eq!(full.len(), 40);

        let short = hash(
            HashOptions {
                short: true,
                ..Default::default()
            },
            &run,
        )
        .unwrap()
        .unwrap();
        assert!(full.starts_with(&short));

        std::fs::write(dir.path().join("dirty.txt"), "x").unwrap();
        let clean_only = HashOptions {
            clean_only: true,
            short: false,
        };
        assert_eq!(hash(clean_only, &run).unwrap(), None);
    }

    #[test]
    fn test_default_operations_through_trait() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let git: &dyn GitOperations =
            &DefaultGitOperations::new(RunOptions::default().with_cwd(dir.path()));
        let clean_only = HashOptions {
            clean_only: true,
            short: false,
        };

        assert!(!git.repo_dirty().unwrap());
        assert!(git.changed_files("HEAD", "HEAD").unwrap().is_empty());
        let head = git.hash(clean_only).unwrap().unwrap();
        assert_eq!(head.len(), 40);

        std::fs::write(dir.path().join("README.md"), "edited\n").unwrap();
        assert!(git.repo_dirty().unwrap());
        assert_eq!(git.hash(clean_only).unwrap(), None);
        assert_eq!(git.hash(HashOptions::default()).unwrap(), Some(head));
    }
}
