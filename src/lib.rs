pub mod charts;
pub mod config;
pub mod input;
pub mod logging;
pub mod seed;
pub mod session;
pub mod store;
