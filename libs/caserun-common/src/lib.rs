pub mod cells;
pub mod config;
pub mod languages;
pub mod solution;
pub mod store;
pub mod types;
