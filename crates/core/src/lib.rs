// nodegate Core - Condition evaluation, input adapters, platform probes
// NO OS-specific dependencies: host access goes through `port::HostInfo`

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{EvalError, Result};
