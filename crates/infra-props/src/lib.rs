// nodegate Infrastructure - Properties-file fact store
// Implements: FactStore

pub mod fact_store;
pub mod properties;

pub use fact_store::PropertiesFactStore;
