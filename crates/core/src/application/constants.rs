// Probe and evaluator constants (no magic values)
use std::time::Duration;

/// Bundled CUDA diagnostic, Windows only; exits with the number of devices found
pub const GPU_DIAGNOSTIC_EXE: &str = "deviceQueryWin.exe";

/// Substring identifying wireless interfaces by name
pub const WIRELESS_INTERFACE_MARKER: &str = "wlan";

/// Default upper bound on a diagnostic run (60 seconds)
pub const DEFAULT_DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(60);
