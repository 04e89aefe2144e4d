pub mod bigquery;
pub mod clients;
pub mod cluster;
pub mod config;
pub mod error;
pub mod logs;
pub mod poll;
pub mod spec;
pub mod suite;
