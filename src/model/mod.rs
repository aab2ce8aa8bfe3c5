//! Core data model.
//!
//! A job is an opaque body waiting in a named queue. It has a priority, a
//! visibility timestamp and a lease duration that is re-armed on every
//! reservation.

pub mod duration;
pub mod job;

pub use job::{Job, JobId, JobRecord, NewJob};
