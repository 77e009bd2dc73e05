// Port Layer - Interfaces for external dependencies

pub mod fact_store;
pub mod host_info;

// Re-exports
pub use fact_store::FactStore;
pub use host_info::HostInfo;
