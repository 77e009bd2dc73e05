// Live HostInfo implementation
// reason: sysinfo for cross-platform OS, memory, disk and network facts
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use sysinfo::{Disks, Networks, System};
use tracing::debug;

use nodegate_core::error::Result;
use nodegate_core::port::HostInfo;

use crate::diagnostic_runner::DiagnosticRunner;

/// HostInfo answering from the running machine
///
/// Every call reads fresh state; nothing is cached between probes.
pub struct SystemHostInfo {
    runner: DiagnosticRunner,
}

impl SystemHostInfo {
    /// Create a host adapter with the default diagnostic environment
    ///
    /// # Example
    /// ```ignore
    /// let host = SystemHostInfo::new();
    /// println!("{}", host.os_name());
    /// ```
    pub fn new() -> Self {
        Self::with_runner(DiagnosticRunner::default())
    }

    pub fn with_runner(runner: DiagnosticRunner) -> Self {
        Self { runner }
    }
}

impl Default for SystemHostInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// First set variable among `names`
fn env_any(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| std::env::var(name).ok())
}

#[async_trait]
impl HostInfo for SystemHostInfo {
    fn os_name(&self) -> String {
        System::long_os_version()
            .or_else(System::name)
            .unwrap_or_else(|| std::env::consts::OS.to_string())
    }

    fn os_arch(&self) -> String {
        std::env::consts::ARCH.to_string()
    }

    fn os_version(&self) -> String {
        System::os_version()
            .or_else(System::kernel_version)
            .unwrap_or_default()
    }

    fn is_windows(&self) -> bool {
        cfg!(windows)
    }

    fn runtime_property(&self, name: &str) -> Option<String> {
        match name {
            "os.name" => Some(self.os_name()),
            "os.arch" => Some(self.os_arch()),
            "os.version" => Some(self.os_version()),
            "os.family" => Some(std::env::consts::FAMILY.to_string()),
            "user.name" => env_any(&["USER", "USERNAME", "LOGNAME"]),
            "user.home" => env_any(&["HOME", "USERPROFILE"]),
            "user.dir" => std::env::current_dir()
                .ok()
                .map(|dir| dir.display().to_string()),
            "tmp.dir" => Some(std::env::temp_dir().display().to_string()),
            "path.separator" => Some(if cfg!(windows) { ";" } else { ":" }.to_string()),
            "file.separator" => Some(std::path::MAIN_SEPARATOR.to_string()),
            "line.separator" => Some(if cfg!(windows) { "\r\n" } else { "\n" }.to_string()),
            other => std::env::var(other).ok(),
        }
    }

    fn total_memory(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.total_memory()
    }

    fn available_space(&self, path: &Path) -> Option<u64> {
        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())?;

        debug!(
            path = %path.display(),
            mount_point = %disk.mount_point().display(),
            available = disk.available_space(),
            "Disk found for path"
        );
        Some(disk.available_space())
    }

    fn search_path(&self) -> Option<OsString> {
        std::env::var_os("PATH")
    }

    fn interface_names(&self) -> Result<Vec<String>> {
        let networks = Networks::new_with_refreshed_list();
        let mut names = Vec::new();
        for (interface_name, _data) in &networks {
            names.push(interface_name.clone());
        }
        debug!(interfaces = ?names, "Network interfaces listed");
        Ok(names)
    }

    async fn run_diagnostic(&self, program: &Path, timeout: Option<Duration>) -> Result<Option<i32>> {
        self.runner.run(program, &[], timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_facts() {
        let host = SystemHostInfo::new();

        assert!(!host.os_name().is_empty());
        assert_eq!(host.os_arch(), std::env::consts::ARCH);
        assert!(host.total_memory() > 0);
        assert_eq!(host.is_windows(), cfg!(windows));
    }

    #[test]
    fn test_runtime_properties() {
        let host = SystemHostInfo::new();

        assert_eq!(host.runtime_property("os.name"), Some(host.os_name()));
        assert_eq!(
            host.runtime_property("file.separator"),
            Some(std::path::MAIN_SEPARATOR.to_string())
        );
        assert!(host.runtime_property("tmp.dir").is_some());
        assert!(host
            .runtime_property("nodegate.surely.unset.property")
            .is_none());
    }

    #[test]
    fn test_interfaces_listed() {
        // contents depend on the machine; enumeration itself must succeed
        assert!(SystemHostInfo::new().interface_names().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_available_space_for_root() {
        let host = SystemHostInfo::new();
        let root_mounted = Disks::new_with_refreshed_list()
            .list()
            .iter()
            .any(|disk| disk.mount_point() == Path::new("/"));

        // containers may expose no disks at all
        assert_eq!(host.available_space(Path::new("/")).is_some(), root_mounted);
    }

    #[test]
    fn test_relative_path_has_no_disk() {
        assert_eq!(SystemHostInfo::new().available_space(Path::new("relative/dir")), None);
    }
}
