//! Side-effecting operations: filesystem, configuration, child processes.

pub mod catalog;
pub mod config;
pub mod process;
pub mod trace;
pub mod workspace;
