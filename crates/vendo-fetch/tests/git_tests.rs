//! Git fetcher tests against local repositories built with the git CLI.

use std::path::Path;
use std::process::Command;

use vendo_config::sources::GitSource;
use vendo_config::{ConfigSet, SourceLock};
use vendo_fetch::git::GitFetcher;
use vendo_fetch::{Fetcher, ResourceRefFetcher};
use vendo_fs::TempArea;

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .expect("git available");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// A one-commit repository; returns its head SHA.
fn seed_repo(dir: &Path) -> String {
    git(dir, &["init", "-b", "main"]);
    std::fs::write(dir.join("lib.rs"), "pub fn answer() -> u32 { 42 }\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", "initial commit"]);
    git(dir, &["rev-parse", "HEAD"]).trim().to_string()
}

fn empty_set() -> ConfigSet {
    ConfigSet::from_str("apiVersion: vendo.dev/v1alpha1\nkind: Config\n", "0.4.0").unwrap()
}

fn source(url: &str, git_ref: &str) -> GitSource {
    GitSource {
        url: url.to_string(),
        git_ref: git_ref.to_string(),
        secret_ref: None,
        lfs_skip_smudge: false,
        depth: None,
    }
}

#[test]
fn retrieves_branch_and_pins_sha() {
    let remote = tempfile::tempdir().unwrap();
    let sha = seed_repo(remote.path());

    let set = empty_set();
    let refs = ResourceRefFetcher::new(&set);
    let opts = source(&remote.path().to_string_lossy(), "main");
    let fetcher = GitFetcher::new(&opts, None, &refs);

    let temp = TempArea::new().unwrap();
    let dst = temp.new_temp_dir("git").unwrap();
    let lock = fetcher.retrieve(&dst, &temp).unwrap();

    match lock {
        SourceLock::Git(git_lock) => {
            assert_eq!(git_lock.sha, sha);
            assert_eq!(git_lock.commit_title, "initial commit");
            assert!(git_lock.tags.is_empty());
        }
        other => panic!("expected git lock, got {other:?}"),
    }
    assert!(dst.join("lib.rs").is_file());
}

#[test]
fn tags_recorded_when_present() {
    let remote = tempfile::tempdir().unwrap();
    seed_repo(remote.path());
    git(remote.path(), &["tag", "v0.1.0"]);

    let set = empty_set();
    let refs = ResourceRefFetcher::new(&set);
    let opts = source(&remote.path().to_string_lossy(), "v0.1.0");
    let fetcher = GitFetcher::new(&opts, None, &refs);

    let temp = TempArea::new().unwrap();
    let dst = temp.new_temp_dir("git").unwrap();
    let lock = fetcher.retrieve(&dst, &temp).unwrap();

    match lock {
        SourceLock::Git(git_lock) => assert_eq!(git_lock.tags, vec!["v0.1.0".to_string()]),
        other => panic!("expected git lock, got {other:?}"),
    }
}

#[test]
fn locked_sha_wins_over_moved_ref() {
    let remote = tempfile::tempdir().unwrap();
    let first_sha = seed_repo(remote.path());

    // Move `main` forward; a locked sync must still land on the pin.
    std::fs::write(remote.path().join("new.rs"), "// new\n").unwrap();
    git(remote.path(), &["add", "."]);
    git(remote.path(), &["commit", "-m", "second commit"]);

    let set = empty_set();
    let refs = ResourceRefFetcher::new(&set);
    let opts = source(&remote.path().to_string_lossy(), "main");
    let fetcher = GitFetcher::new(&opts, Some(&first_sha), &refs);

    let temp = TempArea::new().unwrap();
    let dst = temp.new_temp_dir("git").unwrap();
    let lock = fetcher.retrieve(&dst, &temp).unwrap();

    match lock {
        SourceLock::Git(git_lock) => assert_eq!(git_lock.sha, first_sha),
        other => panic!("expected git lock, got {other:?}"),
    }
    assert!(!dst.join("new.rs").exists());
}

#[test]
fn credentials_do_not_outlive_the_fetch() {
    let remote = tempfile::tempdir().unwrap();
    seed_repo(remote.path());

    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
---
kind: Secret
metadata:
  name: key
stringData:
  ssh-privatekey: "fake material"
"#;
    let set = ConfigSet::from_str(yaml, "0.4.0").unwrap();
    let refs = ResourceRefFetcher::new(&set);

    let mut opts = source(&remote.path().to_string_lossy(), "main");
    opts.secret_ref = Some(vendo_config::sources::SecretRef {
        name: "key".to_string(),
    });
    let fetcher = GitFetcher::new(&opts, None, &refs);

    let temp = TempArea::new().unwrap();
    let dst = temp.new_temp_dir("git").unwrap();
    // Local path remote; ssh material is written and then removed.
    fetcher.retrieve(&dst, &temp).unwrap();

    let leftover: Vec<_> = walk_files(dst.parent().unwrap())
        .into_iter()
        .filter(|p| {
            p.file_name()
                .map(|n| n == "private-key" || n == ".git-credentials")
                .unwrap_or(false)
        })
        .collect();
    assert!(leftover.is_empty(), "credentials left behind: {leftover:?}");
}

#[test]
fn credentials_removed_when_fetch_fails() {
    let remote = tempfile::tempdir().unwrap();
    seed_repo(remote.path());

    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
---
kind: Secret
metadata:
  name: key
stringData:
  ssh-privatekey: "fake material"
"#;
    let set = ConfigSet::from_str(yaml, "0.4.0").unwrap();
    let refs = ResourceRefFetcher::new(&set);

    let mut opts = source(&remote.path().to_string_lossy(), "no-such-ref");
    opts.secret_ref = Some(vendo_config::sources::SecretRef {
        name: "key".to_string(),
    });
    let fetcher = GitFetcher::new(&opts, None, &refs);

    let temp = TempArea::new().unwrap();
    let dst = temp.new_temp_dir("git").unwrap();
    // The checkout of a nonexistent ref fails after the key was written.
    fetcher.retrieve(&dst, &temp).unwrap_err();

    let leftover: Vec<_> = walk_files(dst.parent().unwrap())
        .into_iter()
        .filter(|p| {
            p.file_name()
                .map(|n| n == "private-key" || n == ".git-credentials")
                .unwrap_or(false)
        })
        .collect();
    assert!(leftover.is_empty(), "credentials left behind: {leftover:?}");
}

fn walk_files(root: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out
}
