//! tradeops-runner: file-backed daily run of the tradeops pipeline.
//!
//! Reads signals, positions, trades and quotes as CSV under a data
//! directory, drives the [`tradeops::Pipeline`] stages one CLI command at a
//! time, writes broker order files and keeps a JSONL audit trail.

pub mod audit;
pub mod config;
pub mod dates;
pub mod error;
pub mod files;
pub mod loaders;
pub mod workflow;
