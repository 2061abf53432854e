mod algorithm;
pub mod common;
pub mod config;
pub mod error;
pub mod graph;
pub mod instance;
pub mod solver;
pub mod stat;
