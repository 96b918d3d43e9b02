//! End-to-end engine tests with offline sources and local git remotes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use vendo_config::{ConfigSet, LockConfig};
use vendo_core::{sync, SyncOptions};

const ENGINE: &str = "0.4.0";

/// Stable fingerprint of a tree: relative path -> file bytes.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    out
}

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
        "git {:?}: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn locked_sync_reproduces_byte_identical_tree() {
    let root = TempDir::new().unwrap();
    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor
  contents:
  - path: a
    inline:
      paths:
        one.txt: first
  - path: b
    inline:
      paths:
        nested/two.txt: second
"#;
    let set = ConfigSet::from_str(yaml, ENGINE).unwrap();

    let lock = sync(root.path(), &set, None, &SyncOptions::default()).unwrap();
    let first = snapshot(&root.path().join("vendor"));

    // Remove the target entirely; a locked sync must rebuild it exactly.
    fs::remove_dir_all(root.path().join("vendor")).unwrap();
    let locked_opts = SyncOptions {
        locked: true,
        directories: None,
    };
    let relock = sync(root.path(), &set, Some(&lock), &locked_opts).unwrap();
    let second = snapshot(&root.path().join("vendor"));

    assert_eq!(first, second);
    assert_eq!(lock, relock);
}

#[test]
fn sync_then_locked_sync_produces_no_diff() {
    let root = TempDir::new().unwrap();
    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor/lib
  contents:
  - path: .
    inline:
      paths:
        mod.rs: "pub fn id() {}"
"#;
    let set = ConfigSet::from_str(yaml, ENGINE).unwrap();

    let lock = sync(root.path(), &set, None, &SyncOptions::default()).unwrap();
    let first = snapshot(&root.path().join("vendor/lib"));

    let locked_opts = SyncOptions {
        locked: true,
        directories: None,
    };
    sync(root.path(), &set, Some(&lock), &locked_opts).unwrap();
    let second = snapshot(&root.path().join("vendor/lib"));

    assert_eq!(first, second);
}

#[test]
fn git_pin_survives_remote_moving_forward() {
    let remote = TempDir::new().unwrap();
    git(remote.path(), &["init", "-b", "main"]);
    fs::write(remote.path().join("lib.txt"), "v1").unwrap();
    git(remote.path(), &["add", "."]);
    git(remote.path(), &["commit", "-m", "v1"]);
    let pinned_sha = git(remote.path(), &["rev-parse", "HEAD"]).trim().to_string();

    let root = TempDir::new().unwrap();
    let yaml = format!(
        r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor/lib
  contents:
  - path: .
    git:
      url: "{}"
      ref: main
"#,
        remote.path().to_string_lossy()
    );
    let set = ConfigSet::from_str(&yaml, ENGINE).unwrap();

    let lock = sync(root.path(), &set, None, &SyncOptions::default()).unwrap();
    let git_lock = lock.directories[0].contents[0].git.as_ref().unwrap();
    assert_eq!(git_lock.sha, pinned_sha);
    assert_eq!(
        fs::read_to_string(root.path().join("vendor/lib/lib.txt")).unwrap(),
        "v1"
    );

    // The remote moves on; the locked sync must not.
    fs::write(remote.path().join("lib.txt"), "v2").unwrap();
    git(remote.path(), &["add", "."]);
    git(remote.path(), &["commit", "-m", "v2"]);

    let locked_opts = SyncOptions {
        locked: true,
        directories: None,
    };
    sync(root.path(), &set, Some(&lock), &locked_opts).unwrap();
    assert_eq!(
        fs::read_to_string(root.path().join("vendor/lib/lib.txt")).unwrap(),
        "v1"
    );
}

#[test]
fn failing_directory_leaves_earlier_ones_synced() {
    let root = TempDir::new().unwrap();
    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor/good
  contents:
  - path: .
    inline:
      paths:
        ok.txt: fine
- path: vendor/bad
  contents:
  - path: .
    directory:
      path: does/not/exist
"#;
    let set = ConfigSet::from_str(yaml, ENGINE).unwrap();

    let err = sync(root.path(), &set, None, &SyncOptions::default()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("vendor/bad"), "got: {}", message);

    // Forward progress: the first directory landed and stays.
    assert!(root.path().join("vendor/good/ok.txt").is_file());
}

#[test]
fn error_names_directory_and_content() {
    let root = TempDir::new().unwrap();
    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor
  contents:
  - path: lib
    inline:
      paths:
        a.txt: x
    newRootPath: missing-root
"#;
    let set = ConfigSet::from_str(yaml, ENGINE).unwrap();

    let err = sync(root.path(), &set, None, &SyncOptions::default()).unwrap_err();
    let message = format!("{}", err);
    assert!(message.contains("vendor"), "got: {}", message);
    assert!(message.contains("lib"), "got: {}", message);
    assert!(message.contains("missing-root"), "got: {}", message);
}

#[test]
fn lock_mirrors_config_order_and_contents() {
    let root = TempDir::new().unwrap();
    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor/z
  contents:
  - path: x
    inline:
      paths:
        f: "1"
  - path: y
    manual: {}
- path: vendor/a
  contents:
  - path: .
    inline:
      paths:
        g: "2"
"#;
    let set = ConfigSet::from_str(yaml, ENGINE).unwrap();

    let lock = sync(root.path(), &set, None, &SyncOptions::default()).unwrap();

    assert_eq!(lock.directories[0].path, "vendor/z");
    assert_eq!(lock.directories[1].path, "vendor/a");
    assert_eq!(lock.directories[0].contents[0].path, "x");
    assert_eq!(lock.directories[0].contents[1].path, "y");
    assert!(lock.directories[0].contents[0].inline.is_some());
    assert!(lock.directories[0].contents[1].manual.is_some());
}

#[test]
fn locked_sync_round_trips_through_serialized_lock() {
    let root = TempDir::new().unwrap();
    let yaml = r#"
apiVersion: vendo.dev/v1alpha1
kind: Config
directories:
- path: vendor
  contents:
  - path: .
    inline:
      paths:
        data.txt: payload
"#;
    let set = ConfigSet::from_str(yaml, ENGINE).unwrap();

    let lock = sync(root.path(), &set, None, &SyncOptions::default()).unwrap();
    let serialized = lock.to_yaml_string().unwrap();
    let reloaded = LockConfig::parse(&serialized).unwrap();

    let locked_opts = SyncOptions {
        locked: true,
        directories: None,
    };
    let relock = sync(root.path(), &set, Some(&reloaded), &locked_opts).unwrap();
    assert_eq!(relock, lock);
}
