pub mod api;
pub mod bootstrap;
pub mod capabilities;
pub mod cli;
pub mod runtime;
pub mod state;
