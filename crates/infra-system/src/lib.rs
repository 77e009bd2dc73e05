// nodegate Infrastructure - System Adapters
// Implements: HostInfo (sysinfo, env, child processes)

pub mod diagnostic_runner;
pub mod host_info_impl;

pub use diagnostic_runner::DiagnosticRunner;
pub use host_info_impl::SystemHostInfo;
