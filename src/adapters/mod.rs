//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod feature_export;
pub mod file_config_adapter;
pub mod mock_broker;
pub mod replay;
pub mod tick_store;
pub mod tick_stream;
