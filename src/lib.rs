pub mod app;
pub mod cards;
pub mod config;
pub mod errors;
pub mod purge;
pub mod state;
pub mod store;
pub mod telemetry;
