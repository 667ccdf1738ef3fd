pub mod config_store;
pub mod error;
pub mod logging;
pub mod mode_gateway;
