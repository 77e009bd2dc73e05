// Diagnostic runner - runs a bundled diagnostic executable to completion
// reason: tokio::process + tokio::time::timeout for a bounded wait
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use nodegate_core::error::{EvalError, Result};

/// Environment variables a diagnostic sees by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &[
    "PATH",
    "SystemRoot",
    "SYSTEMROOT",
    "TEMP",
    "TMP",
    "CUDA_PATH",
    "CUDA_VISIBLE_DEVICES",
    "LD_LIBRARY_PATH",
];

/// Spawns diagnostics in a cleared environment with an allowlist
pub struct DiagnosticRunner {
    env_allowlist: Vec<String>,
}

impl DiagnosticRunner {
    /// Create a runner
    ///
    /// # Arguments
    /// * `env_allowlist` - Variables copied from this process into the child
    pub fn new(env_allowlist: Vec<String>) -> Self {
        Self { env_allowlist }
    }

    /// Keep allowlisted variables only
    fn filter_env(&self, env: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
        env.into_iter()
            .filter(|(k, _)| self.allows(k, cfg!(windows)))
            .collect()
    }

    /// Windows variable names are case-insensitive (`Path` is `PATH`)
    fn allows(&self, name: &str, ignore_case: bool) -> bool {
        self.env_allowlist.iter().any(|allowed| {
            if ignore_case {
                allowed.eq_ignore_ascii_case(name)
            } else {
                allowed == name
            }
        })
    }

    /// Run `program` with `args` and wait for its exit code
    ///
    /// # Returns
    /// The exit code, None if the child was ended by a signal
    ///
    /// # Errors
    /// - EvalError::SpawnFailed if the process cannot be started
    /// - EvalError::Timeout if it is still running after `timeout`; it is killed
    /// - EvalError::Io if waiting on it fails
    pub async fn run(&self, program: &Path, args: &[&str], timeout: Option<Duration>) -> Result<Option<i32>> {
        info!(
            program = %program.display(),
            args = ?args,
            timeout_ms = ?timeout.map(|t| t.as_millis()),
            "Starting diagnostic"
        );

        let mut child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(self.filter_env(std::env::vars_os().filter_map(|(k, v)| {
                Some((k.into_string().ok()?, v.into_string().ok()?))
            })))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EvalError::SpawnFailed(format!("{}: {}", program.display(), e)))?;

        let status = match timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status?,
                    Err(_) => {
                        warn!(program = %program.display(), "Diagnostic timed out, killing it");
                        if let Err(e) = child.kill().await {
                            warn!(error = %e, "Failed to kill diagnostic");
                        }
                        return Err(EvalError::Timeout(limit.as_millis()));
                    }
                }
            }
            None => child.wait().await?,
        };

        info!(
            program = %program.display(),
            exit_code = ?status.code(),
            "Diagnostic completed"
        );
        Ok(status.code())
    }
}

impl Default for DiagnosticRunner {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_reported() {
        let runner = DiagnosticRunner::default();
        let code = runner
            .run(Path::new("/bin/sh"), &["-c", "exit 3"], Some(Duration::from_secs(10)))
            .await
            .unwrap();
        assert_eq!(code, Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unbounded_wait() {
        let runner = DiagnosticRunner::default();
        let code = runner.run(Path::new("/bin/sh"), &["-c", "exit 0"], None).await.unwrap();
        assert_eq!(code, Some(0));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let runner = DiagnosticRunner::default();
        let result = runner
            .run(Path::new("/bin/sh"), &["-c", "sleep 10"], Some(Duration::from_millis(100)))
            .await;
        assert!(matches!(result, Err(EvalError::Timeout(100))));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = DiagnosticRunner::default();
        let result = runner
            .run(&dir.path().join("deviceQueryWin.exe"), &[], Some(Duration::from_secs(1)))
            .await;
        assert!(matches!(result, Err(EvalError::SpawnFailed(_))));
    }

    #[test]
    fn test_env_filtering() {
        let runner = DiagnosticRunner::new(vec!["ALLOWED_VAR".to_string()]);

        let env = vec![
            ("ALLOWED_VAR".to_string(), "value1".to_string()),
            ("BLOCKED_VAR".to_string(), "value2".to_string()),
        ];
        let filtered = runner.filter_env(env);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("ALLOWED_VAR"));
        assert!(!filtered.contains_key("BLOCKED_VAR"));
    }

    #[test]
    fn test_allowlist_case_rules() {
        let runner = DiagnosticRunner::default();

        assert!(runner.allows("Path", true));
        assert!(runner.allows("systemroot", true));
        assert!(!runner.allows("Path", false));
        assert!(runner.allows("PATH", false));
        assert!(!runner.allows("HOME", true));
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_search_path_spelling_kept() {
        let runner = DiagnosticRunner::default();
        let filtered = runner.filter_env(vec![
            ("Path".to_string(), r"C:\Windows\system32".to_string()),
            ("USERDOMAIN".to_string(), "CORP".to_string()),
        ]);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("Path"));
    }
}
