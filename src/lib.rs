//! # rebound
//!
//! Durable job queue. Producers enqueue jobs tagged with a queue name,
//! priority, visibility delay and time-to-run lease; consumers reserve the
//! highest-priority eligible job and delete it before the lease lapses.
//!
//! Storage is pluggable behind [`db::JobStore`] (SQLite, Postgres, memory);
//! [`engine::Engine`] is the operation set consumed by the HTTP transport
//! and the CLI.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod http;
pub mod model;
pub mod telemetry;
