//! Subcommand implementations.

pub mod dump;
pub mod replicate;
pub mod verify;

pub use dump::{dump, run_dump, DumpArgs};
pub use replicate::{catch_up, run_replicate, ReplicateArgs};
pub use verify::{run_verify, VerifyArgs};
