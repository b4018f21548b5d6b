pub mod config;
pub mod data;
pub mod session;
pub mod stats;
pub mod timer;
