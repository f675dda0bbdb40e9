pub mod config;
pub mod error;
pub mod incident;
pub mod ticket;
pub mod tool;
pub mod trace;
pub mod usage;
