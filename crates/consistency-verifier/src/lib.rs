//! Consistency verification between a source and a target store.
//!
//! After replay has caught up, every base table of the target database is
//! read from both stores and the two result sets are compared:
//!
//! - [`CompareMode::Ordered`](replay_core::CompareMode::Ordered): same rows
//!   in the same order
//! - [`CompareMode::Unordered`](replay_core::CompareMode::Unordered): same
//!   rows as a multiset, duplicates counted
//!
//! Column names must match in both modes. When both stores reject the read
//! with the same error code the table counts as equal, since neither store
//! holds data the other lacks.
//!
//! # Example
//!
//! ```ignore
//! use consistency_verifier::verify;
//! use replay_core::CompareMode;
//!
//! let report = verify(&mut source, &mut target, CompareMode::Unordered).await?;
//! for table in report.mismatched() {
//!     eprintln!("{table}");
//! }
//! assert!(report.is_consistent());
//! ```

pub mod error;
pub mod report;
mod verifier;

pub use error::VerifyError;
pub use report::{TableResult, VerificationReport};
pub use verifier::{verify, TableReader};
