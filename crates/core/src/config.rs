// Probe configuration
use crate::application::constants::DEFAULT_DIAGNOSTIC_TIMEOUT;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Directory holding bundled diagnostic executables
pub const ENV_DIAGNOSTICS_DIR: &str = "NODEGATE_DIAGNOSTICS_DIR";

/// Diagnostic process timeout in seconds; `0` waits indefinitely
pub const ENV_DIAGNOSTIC_TIMEOUT_SECS: &str = "NODEGATE_DIAGNOSTIC_TIMEOUT_SECS";

/// Platform probe configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Where bundled diagnostics live (None: next to the running executable)
    pub diagnostics_dir: Option<PathBuf>,

    /// Upper bound on a diagnostic run (None: unbounded)
    pub diagnostic_timeout: Option<Duration>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            diagnostics_dir: None,
            diagnostic_timeout: Some(DEFAULT_DIAGNOSTIC_TIMEOUT),
        }
    }
}

impl ProbeConfig {
    /// Defaults overridden by `NODEGATE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DIAGNOSTICS_DIR).filter(|d| !d.is_empty()) {
            config.diagnostics_dir = Some(PathBuf::from(dir));
        }

        if let Some(raw) = lookup(ENV_DIAGNOSTIC_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.diagnostic_timeout = None,
                Ok(secs) => config.diagnostic_timeout = Some(Duration::from_secs(secs)),
                Err(_) => warn!(
                    value = %raw,
                    var = ENV_DIAGNOSTIC_TIMEOUT_SECS,
                    "Ignoring unparsable diagnostic timeout"
                ),
            }
        }

        config
    }
}
