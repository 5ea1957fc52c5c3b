//! Unit tests for bucket-backup
//!
//! Config parsing, prior-day selection and archive strategies, without
//! external tools or network access.

mod config;
mod scanner;
mod strategies;
