//! Platform Probes - yes/no questions about the local machine
//!
//! Each probe reads live state through `HostInfo` and keeps nothing between
//! calls. `check_*` never fails; `try_*` keeps the cause for tests.

use crate::application::constants::{GPU_DIAGNOSTIC_EXE, WIRELESS_INTERFACE_MARKER};
use crate::config::ProbeConfig;
use crate::error::{EvalError, Result};
use crate::port::HostInfo;
use regex::{Regex, RegexBuilder};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compile a case-insensitive search pattern
fn case_insensitive(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| EvalError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Drop the `\\?\` prefix Windows adds on canonicalize
///
/// Mount points are reported as plain `C:\` or `\\server\share`, and a
/// verbatim prefix never compares equal to those.
fn without_verbatim_prefix(path: PathBuf) -> PathBuf {
    let Some(rest) = path.to_str().and_then(|p| p.strip_prefix(r"\\?\")) else {
        return path;
    };
    if let Some(share) = rest.strip_prefix(r"UNC\") {
        return PathBuf::from(format!(r"\\{}", share));
    }
    if rest.as_bytes().get(1) == Some(&b':') {
        return PathBuf::from(rest);
    }
    path
}

/// Look for `file_name` in every directory of a platform search path
///
/// Missing or non-directory entries are logged and skipped.
///
/// # Returns
/// true on the first directory entry named exactly `file_name`
pub fn find_in_search_path(search_path: &OsStr, file_name: &str) -> bool {
    for dir in std::env::split_paths(search_path) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        if !dir.exists() {
            warn!(dir = %dir.display(), "Search path entry doesn't exist");
            continue;
        }
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Search path entry is not a directory");
            continue;
        }

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot list search path entry");
                continue;
            }
        };

        let mut names = entries.flatten().map(|entry| entry.file_name());
        if names.any(|name| name.as_os_str() == OsStr::new(file_name)) {
            debug!(dir = %dir.display(), file = %file_name, "Executable found");
            return true;
        }
    }
    false
}

/// Probes over a `HostInfo`
pub struct PlatformProbes {
    host: Arc<dyn HostInfo>,
    config: ProbeConfig,
}

impl PlatformProbes {
    /// Create probes over a host
    ///
    /// # Example
    /// ```ignore
    /// let probes = PlatformProbes::new(Arc::new(SystemHostInfo::new()), ProbeConfig::from_env());
    /// if probes.check_os_name(Some("linux")) { /* ... */ }
    /// ```
    pub fn new(host: Arc<dyn HostInfo>, config: ProbeConfig) -> Self {
        Self { host, config }
    }

    /// Case-insensitive pattern search of `pattern` in the OS name
    ///
    /// # Errors
    /// - EvalError::InvalidPattern if `pattern` does not compile
    pub fn try_check_os_name(&self, pattern: &str) -> Result<bool> {
        Ok(case_insensitive(pattern)?.is_match(&self.host.os_name()))
    }

    pub fn check_os_name(&self, pattern: Option<&str>) -> bool {
        let Some(pattern) = pattern else {
            return false;
        };
        self.try_check_os_name(pattern).unwrap_or_else(|e| {
            warn!(error = %e, "OS name check failed");
            false
        })
    }

    /// Case-insensitive equality with the local architecture
    pub fn check_os_arch(&self, arch: Option<&str>) -> bool {
        arch.is_some_and(|arch| arch.to_lowercase() == self.host.os_arch().to_lowercase())
    }

    /// Exact equality with the local OS version
    pub fn check_os_version(&self, version: Option<&str>) -> bool {
        version.is_some_and(|version| version == self.host.os_version())
    }

    /// Case-insensitive pattern search of `pattern` in a runtime property
    ///
    /// # Errors
    /// - EvalError::MissingFact if the property is not set
    /// - EvalError::InvalidPattern if `pattern` does not compile
    pub fn try_check_runtime_property(&self, name: &str, pattern: &str) -> Result<bool> {
        let value = self
            .host
            .runtime_property(name)
            .ok_or_else(|| EvalError::MissingFact(name.to_string()))?;
        Ok(case_insensitive(pattern)?.is_match(&value))
    }

    /// Missing properties and bad patterns are "not applicable", so they only
    /// show up at debug level
    pub fn check_runtime_property(&self, name: Option<&str>, pattern: Option<&str>) -> bool {
        let (Some(name), Some(pattern)) = (name, pattern) else {
            return false;
        };
        self.try_check_runtime_property(name, pattern)
            .unwrap_or_else(|e| {
                debug!(property = %name, error = %e, "Runtime property check failed");
                false
            })
    }

    /// Path of the bundled GPU diagnostic
    fn gpu_diagnostic_path(&self) -> Result<PathBuf> {
        let dir = match &self.config.diagnostics_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_exe()?
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| EvalError::SpawnFailed("executable has no parent directory".to_string()))?,
        };
        let program = dir.join(GPU_DIAGNOSTIC_EXE);
        if !program.is_file() {
            return Err(EvalError::SpawnFailed(format!(
                "{} not found",
                program.display()
            )));
        }
        Ok(program)
    }

    /// Run the bundled CUDA diagnostic (Windows only)
    ///
    /// The diagnostic reports devices through its exit code; a positive code
    /// means CUDA is usable. The wait is bounded by `ProbeConfig::diagnostic_timeout`.
    ///
    /// # Errors
    /// - EvalError::Unsupported off Windows
    /// - EvalError::SpawnFailed if the diagnostic is missing or cannot start
    /// - EvalError::Timeout if it does not finish in time
    pub async fn try_check_cuda(&self) -> Result<bool> {
        if !self.host.is_windows() {
            return Err(EvalError::Unsupported(
                "checking the CUDA library requires Windows".to_string(),
            ));
        }

        let program = self.gpu_diagnostic_path()?;
        let exit_code = self
            .host
            .run_diagnostic(&program, self.config.diagnostic_timeout)
            .await?;

        info!(program = %program.display(), exit_code = ?exit_code, "GPU diagnostic completed");
        Ok(exit_code.is_some_and(|code| code > 0))
    }

    pub async fn check_cuda(&self) -> bool {
        self.try_check_cuda().await.unwrap_or_else(|e| {
            warn!(error = %e, "CUDA check failed");
            false
        })
    }

    /// True iff total memory is at least `required` bytes
    pub fn check_total_memory(&self, required: u64) -> bool {
        self.host.total_memory() >= required
    }

    /// Free space on the filesystem holding `path`
    ///
    /// # Errors
    /// - EvalError::Io if `path` does not exist
    /// - EvalError::Unsupported if no filesystem holds it
    pub fn try_check_free_disk_space(&self, required: u64, path: &Path) -> Result<bool> {
        let path = without_verbatim_prefix(path.canonicalize()?);
        let available = self.host.available_space(&path).ok_or_else(|| {
            EvalError::Unsupported(format!("no filesystem found for {}", path.display()))
        })?;
        Ok(available >= required)
    }

    pub fn check_free_disk_space(&self, required: u64, path: &Path) -> bool {
        self.try_check_free_disk_space(required, path)
            .unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Free disk space check failed");
                false
            })
    }

    /// `check_free_disk_space` on the temporary directory
    pub fn check_free_disk_space_tmp(&self, required: u64) -> bool {
        self.check_free_disk_space(required, &std::env::temp_dir())
    }

    /// True if `file_name` is an entry of some directory on the search path
    pub fn check_exec(&self, file_name: &str) -> bool {
        let Some(search_path) = self.host.search_path() else {
            warn!("No search path set");
            return false;
        };
        let found = find_in_search_path(&search_path, file_name);
        if !found {
            warn!(file = %file_name, "Not found in the search path");
        }
        found
    }

    /// True if some interface name contains the wireless marker
    ///
    /// # Errors
    /// - Whatever interface enumeration reports
    pub fn try_check_wifi(&self) -> Result<bool> {
        Ok(self
            .host
            .interface_names()?
            .iter()
            .any(|name| name.contains(WIRELESS_INTERFACE_MARKER)))
    }

    pub fn check_wifi(&self) -> bool {
        self.try_check_wifi().unwrap_or_else(|e| {
            warn!(error = %e, "Network interface enumeration failed");
            false
        })
    }
}
