pub mod archive;
pub mod cleanup;
pub mod command;
pub mod cron;
pub mod dates;
pub mod locker;
pub mod scanner;
pub mod storage;

// Trait-based abstractions for testability
pub mod executor;

// Re-export commonly used types and traits (used by test crate)
pub use executor::{CommandExecutor, RealExecutor};
pub use storage::{ObjectStore, S3Store};
