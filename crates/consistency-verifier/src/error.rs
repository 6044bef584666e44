//! Error types for the consistency verifier.

use store_client::StoreError;
use thiserror::Error;

/// Errors that stop a verification run.
///
/// A table that differs, or that cannot be read, is not an error: it is
/// recorded in the report and verification moves on.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The tables of the target store could not be listed.
    #[error("cannot list tables: {0}")]
    ListTables(#[source] StoreError),
}
