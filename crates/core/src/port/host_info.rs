// Host information port - raw facts about the local machine
// reason: async-trait for the diagnostic child process (like TaskExecutor)
use crate::error::Result;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

/// Raw host facts consumed by `PlatformProbes`
///
/// Implementations answer from live system state and keep nothing between
/// calls. Matching rules (case folding, patterns, thresholds) live in the
/// probes, not here.
#[async_trait]
pub trait HostInfo: Send + Sync {
    /// Operating system name, e.g. "Linux 22.04 Ubuntu" or "Windows 10 Pro"
    fn os_name(&self) -> String;

    /// CPU architecture, e.g. "x86_64"
    fn os_arch(&self) -> String;

    /// Operating system version
    fn os_version(&self) -> String;

    fn is_windows(&self) -> bool;

    /// Value of a named runtime property (well-known keys, then environment)
    fn runtime_property(&self, name: &str) -> Option<String>;

    /// Total memory visible to this process, in bytes
    fn total_memory(&self) -> u64;

    /// Free bytes on the filesystem that holds `path`
    ///
    /// # Returns
    /// None if no mounted filesystem contains `path`
    fn available_space(&self, path: &Path) -> Option<u64>;

    /// The executable search path, unsplit (`PATH`)
    fn search_path(&self) -> Option<OsString>;

    /// Names of local network interfaces
    fn interface_names(&self) -> Result<Vec<String>>;

    /// Run `program` to completion and return its exit code
    ///
    /// # Arguments
    /// * `program` - Absolute path of the executable
    /// * `timeout` - Upper bound on the wait; None waits indefinitely
    ///
    /// # Returns
    /// The exit code, or None if the process ended without one (signal)
    ///
    /// # Errors
    /// - EvalError::SpawnFailed if the process cannot be started
    /// - EvalError::Timeout if it outlives `timeout` (the child is killed)
    async fn run_diagnostic(&self, program: &Path, timeout: Option<Duration>)
        -> Result<Option<i32>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::EvalError;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Mock diagnostic behavior
    #[derive(Debug, Clone)]
    pub enum MockDiagnostic {
        /// Exit with this code
        Exit(i32),
        /// Fail to spawn with message
        SpawnFail(String),
        /// Hang past any timeout
        Hang,
    }

    /// Mock HostInfo with settable facts
    pub struct MockHostInfo {
        pub os_name: String,
        pub os_arch: String,
        pub os_version: String,
        pub windows: bool,
        pub properties: HashMap<String, String>,
        pub total_memory: u64,
        pub disks: Vec<(PathBuf, u64)>,
        pub search_path: Option<OsString>,
        pub interfaces: Option<Vec<String>>,
        pub diagnostic: MockDiagnostic,
        diagnostic_calls: Arc<Mutex<Vec<PathBuf>>>,
    }
    impl MockHostInfo {
        pub fn linux() -> Self {
            Self {
                os_name: "Linux".to_string(),
                os_arch: "x86_64".to_string(),
                os_version: "6.1.0".to_string(),
                windows: false,
                properties: HashMap::new(),
                total_memory: 8 * 1024 * 1024 * 1024,
                disks: vec![(PathBuf::from("/"), 50 * 1024 * 1024 * 1024)],
                search_path: None,
                interfaces: Some(vec!["lo".to_string(), "eth0".to_string()]),
                diagnostic: MockDiagnostic::Exit(0),
                diagnostic_calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn windows() -> Self {
            Self {
                os_name: "Windows 10".to_string(),
                os_arch: "AMD64".to_string(),
                os_version: "10.0".to_string(),
                windows: true,
                disks: vec![(PathBuf::from("C:\\"), 50 * 1024 * 1024 * 1024)],
                ..Self::linux()
            }
        }
        pub fn with_property(mut self, name: &str, value: &str) -> Self {
            self.properties.insert(name.to_string(), value.to_string());
            self
        }
        pub fn diagnostic_calls(&self) -> Vec<PathBuf> {
            self.diagnostic_calls.lock().unwrap().clone()
        }
    }
    #[async_trait]
    impl HostInfo for MockHostInfo {
        fn os_name(&self) -> String {
            self.os_name.clone()
        }
        fn os_arch(&self) -> String {
            self.os_arch.clone()
        }
        fn os_version(&self) -> String {
            self.os_version.clone()
        }
        fn is_windows(&self) -> bool {
            self.windows
        }
        fn runtime_property(&self, name: &str) -> Option<String> {
            self.properties.get(name).cloned()
        }
        fn total_memory(&self) -> u64 {
            self.total_memory
        }
        fn available_space(&self, path: &Path) -> Option<u64> {
            self.disks
                .iter()
                .filter(|(mount, _)| path.starts_with(mount))
                .max_by_key(|(mount, _)| mount.as_os_str().len())
                .map(|(_, free)| *free)
        }
        fn search_path(&self) -> Option<OsString> {
            self.search_path.clone()
        }
        fn interface_names(&self) -> Result<Vec<String>> {
            self.interfaces.clone().ok_or_else(|| {
                EvalError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "interface enumeration failed",
                ))
            })
        }
        async fn run_diagnostic(
            &self,
            program: &Path,
            timeout: Option<Duration>,
        ) -> Result<Option<i32>> {
            self.diagnostic_calls
                .lock()
                .unwrap()
                .push(program.to_path_buf());
            match self.diagnostic.clone() {
                MockDiagnostic::Exit(code) => Ok(Some(code)),
                MockDiagnostic::SpawnFail(msg) => Err(EvalError::SpawnFailed(msg)),
                MockDiagnostic::Hang => Err(EvalError::Timeout(
                    timeout.map(|t| t.as_millis()).unwrap_or(u128::MAX),
                )),
            }
        }
    }
}
