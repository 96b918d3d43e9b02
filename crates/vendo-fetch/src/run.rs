//! Subprocess execution for transport CLIs (git, helm, crane, imgpkg).
//!
//! The contract is: run to completion with captured stdout/stderr; a
//! non-zero exit is a failure carrying stderr.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Captured output of a completed subprocess.
#[derive(Debug)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Extra environment entries for one invocation; the parent environment is
/// always inherited.
pub type EnvPairs = Vec<(String, String)>;

/// Run `program` with `args`, returning captured output.
pub fn run(
    program: &str,
    args: &[&str],
    env: &EnvPairs,
    cwd: Option<&Path>,
) -> Result<CmdOutput> {
    tracing::debug!(program, args = %args.join(" "), "running subprocess");

    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, val) in env {
        cmd.env(key, val);
    }
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|source| Error::CommandSpawn {
        program: program.to_string(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(Error::CommandFailed {
            program: program.to_string(),
            args: args.join(" "),
            code: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CmdOutput { stdout, stderr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = run("echo", &["hello"], &Vec::new(), None).unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_error_with_stderr() {
        let err = run("sh", &["-c", "echo oops >&2; exit 3"], &Vec::new(), None).unwrap_err();
        match err {
            Error::CommandFailed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "oops");
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = run("vendo-no-such-binary", &[], &Vec::new(), None).unwrap_err();
        assert!(matches!(err, Error::CommandSpawn { .. }));
    }

    #[test]
    fn env_pairs_visible_to_child() {
        let env = vec![("VENDO_TEST_VAR".to_string(), "42".to_string())];
        let out = run("sh", &["-c", "echo $VENDO_TEST_VAR"], &env, None).unwrap();
        assert_eq!(out.stdout.trim(), "42");
    }
}
